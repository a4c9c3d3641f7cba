// 学籍号，学生的自然主键
pub type RollNumber = String;
// 账号登录名
pub type Username = String;
// 评阅文档的行id
pub type DocumentId = i64;
// 准备连接的db文件
pub type SqlFile = String;
