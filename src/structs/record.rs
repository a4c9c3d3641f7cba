use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// 评阅状态，存储时为文本，写入时只接受这两种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Reviewed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Reviewed => "reviewed",
        }
    }
}

// 账号完整记录，密码字段为bcrypt哈希，不直接返回给客户端
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: String,
    pub subject: String,
    pub email: String,
}

// 返回给客户端的账号投影
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub subject: String,
    pub email: String,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        PublicAccount {
            id: account.id,
            username: account.username.clone(),
            role: account.role.clone(),
            subject: account.subject.clone(),
            email: account.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub roll_number: String,
    pub course: String,
    pub year: i64,
}

// 一次考试提交的评阅文档，文件以url形式引用
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewDocument {
    pub id: i64,
    pub subject_id: String,
    pub question_paper_url: String,
    pub answer_sheet_url: String,
    pub roll_number: String,
    // unix秒
    pub upload_date: i64,
    pub assigned_to: String,
    pub status: String,
    pub marks: i64,
}

// 单题评分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "questionNumber")]
    pub question_number: i64,
    #[serde(rename = "marksObtained")]
    pub marks_obtained: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

// 整份试卷的评分结果，和评阅文档互相独立
#[derive(Debug, Clone, Serialize)]
pub struct GradingRecord {
    pub id: i64,
    pub roll_number: String,
    pub answers: Vec<Answer>,
    #[serde(rename = "totalMarks")]
    pub total_marks: i64,
    // unix秒
    #[serde(rename = "dateOfGrading")]
    pub date_of_grading: i64,
}
