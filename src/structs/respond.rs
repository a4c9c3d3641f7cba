use serde::Serialize;

use crate::structs::record::ReviewDocument;

// 按assigned_to查询时返回的文档投影，字段名沿用前端约定
#[derive(Serialize)]
pub struct AssignedDocument {
    #[serde(rename = "_id")]
    pub(crate) id: i64,
    #[serde(rename = "Ans_Url")]
    pub(crate) answer_sheet_url: String,
    #[serde(rename = "Ques_Url")]
    pub(crate) question_paper_url: String,
    pub(crate) roll_number: String,
    pub(crate) subject_id: String,
    pub(crate) assigned_to: String,
    pub(crate) status: String,
}

impl From<ReviewDocument> for AssignedDocument {
    fn from(doc: ReviewDocument) -> Self {
        AssignedDocument {
            id: doc.id,
            answer_sheet_url: doc.answer_sheet_url,
            question_paper_url: doc.question_paper_url,
            roll_number: doc.roll_number,
            subject_id: doc.subject_id,
            assigned_to: doc.assigned_to,
            status: doc.status,
        }
    }
}
