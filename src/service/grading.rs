use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::NoSuchStudentError;
use crate::sql_server::SqlServerHandle;
use crate::structs::request::GradeRequest;

// 记录一次评分提交，answers原样保存
pub(crate) async fn submit_grading(
    req_body: web::Json<GradeRequest>,
    sql_server: web::Data<SqlServerHandle>,
) -> HttpResponse {
    let GradeRequest { roll_number, answers, total_marks } = req_body.into_inner();
    let (roll_number, answers, total_marks) = match (roll_number, answers, total_marks) {
        (Some(roll_number), Some(answers), Some(total_marks))
            if !roll_number.is_empty() && !answers.is_empty() && total_marks != 0 =>
        {
            (roll_number, answers, total_marks)
        }
        _ => return HttpResponse::BadRequest().json(json!({"message": "Missing required fields"})),
    };

    match sql_server.insert_grading(roll_number, answers, total_marks).await {
        Ok(grading) => HttpResponse::Created().json(json!({
            "message": "Grading added successfully",
            "grading": grading
        })),
        Err(e) if e.is::<NoSuchStudentError>() => {
            HttpResponse::NotFound().json(json!({"message": "Student not found"}))
        }
        Err(e) => {
            log::error!("写入评分记录时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Server error"}))
        }
    }
}
