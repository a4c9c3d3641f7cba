use serde::Deserialize;

use crate::structs::record::{Answer, ReviewStatus};

// 解析各接口请求体的结构体
#[derive(Deserialize)]
pub struct SignupRequest {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

// 字段全部可选，由handler统一做存在性检查
#[derive(Deserialize)]
pub struct AddStudentRequest {
    pub(crate) name: Option<String>,
    pub(crate) roll_number: Option<String>,
    pub(crate) course: Option<String>,
    pub(crate) year: Option<i64>,
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub(crate) subject_id: String,
    pub(crate) question_paper_url: String,
    pub(crate) answer_sheet_url: String,
    pub(crate) roll_number: String,
    pub(crate) assigned_to: String,
}

// 未知status会直接反序列化失败并返回400
#[derive(Deserialize)]
pub struct UpdateRequest {
    pub(crate) status: ReviewStatus,
    pub(crate) marks: i64,
}

#[derive(Deserialize)]
pub struct GradeRequest {
    pub(crate) roll_number: Option<String>,
    pub(crate) answers: Option<Vec<Answer>>,
    #[serde(rename = "totalMarks")]
    pub(crate) total_marks: Option<i64>,
}
