use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::NoSuchStudentError;
use crate::sql_server::SqlServerHandle;
use crate::structs::alias::DocumentId;
use crate::structs::request::{UpdateRequest, UploadRequest};
use crate::structs::respond::AssignedDocument;

// 录入一份评阅文档，学籍号必须已登记
pub(crate) async fn upload(
    req_body: web::Json<UploadRequest>,
    sql_server: web::Data<SqlServerHandle>,
) -> HttpResponse {
    let UploadRequest { subject_id, question_paper_url, answer_sheet_url, roll_number, assigned_to } =
        req_body.into_inner();
    let result = sql_server
        .insert_document(subject_id, question_paper_url, answer_sheet_url, roll_number, assigned_to)
        .await;
    match result {
        Ok(document) => HttpResponse::Created().json(json!({
            "message": "Document uploaded successfully",
            "data": document
        })),
        Err(e) if e.is::<NoSuchStudentError>() => HttpResponse::NotFound().json(json!({
            "message": "Student with the provided roll number not found"
        })),
        Err(e) => {
            log::error!("写入评阅文档时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "message": "Error uploading document",
                "error": e.to_string()
            }))
        }
    }
}

// 按assigned_to查询待评阅文档，无结果时返回404
pub(crate) async fn list_assigned(
    path: web::Path<String>,
    sql_server: web::Data<SqlServerHandle>,
) -> HttpResponse {
    let assigned_to = path.into_inner();
    match sql_server.list_assigned(assigned_to).await {
        Ok(documents) if documents.is_empty() => HttpResponse::NotFound().json(json!({
            "message": "No documents found for the provided assigned_to"
        })),
        Ok(documents) => {
            let data: Vec<AssignedDocument> = documents.into_iter().map(AssignedDocument::from).collect();
            HttpResponse::Ok().json(json!({
                "message": "Documents found",
                "data": data
            }))
        }
        Err(e) => {
            log::error!("查询评阅文档时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "message": "Error retrieving documents",
                "error": e.to_string()
            }))
        }
    }
}

// 覆写状态和分数，不检查之前的状态
pub(crate) async fn update(
    path: web::Path<DocumentId>,
    req_body: web::Json<UpdateRequest>,
    sql_server: web::Data<SqlServerHandle>,
) -> HttpResponse {
    let id = path.into_inner();
    match sql_server.update_document(id, req_body.status, req_body.marks).await {
        Ok(Some(document)) => HttpResponse::Ok().json(json!({
            "message": "Document updated successfully",
            "data": document
        })),
        Ok(None) => HttpResponse::NotFound().json(json!({"message": "Document not found"})),
        Err(e) => {
            log::error!("更新评阅文档时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "message": "Error updating document",
                "error": e.to_string()
            }))
        }
    }
}

// 全量列出评阅文档，不分页
pub(crate) async fn overview(sql_server: web::Data<SqlServerHandle>) -> HttpResponse {
    match sql_server.list_documents().await {
        Ok(documents) if documents.is_empty() => {
            HttpResponse::NotFound().json(json!({"message": "No data found"}))
        }
        Ok(documents) => HttpResponse::Ok().json(json!({
            "message": "Data retrieved successfully",
            "data": documents
        })),
        Err(e) => {
            log::error!("查询评阅文档总览时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "message": "Error fetching data",
                "error": e.to_string()
            }))
        }
    }
}
