use actix_web::{web, HttpResponse};

use crate::error::DuplicateRollNumberError;
use crate::sql_server::SqlServerHandle;
use crate::structs::request::AddStudentRequest;

// 登记学生，四个字段缺一不可，返回纯文本
pub(crate) async fn add_student(
    req_body: web::Json<AddStudentRequest>,
    sql_server: web::Data<SqlServerHandle>,
) -> HttpResponse {
    let AddStudentRequest { name, roll_number, course, year } = req_body.into_inner();
    let (name, roll_number, course, year) = match (name, roll_number, course, year) {
        (Some(name), Some(roll_number), Some(course), Some(year))
            if !name.is_empty() && !roll_number.is_empty() && !course.is_empty() && year != 0 =>
        {
            (name, roll_number, course, year)
        }
        _ => return HttpResponse::BadRequest().body("All fields are required"),
    };

    match sql_server.insert_student(name, roll_number, course, year).await {
        Ok(_) => HttpResponse::Created().body("Student added successfully"),
        Err(e) if e.is::<DuplicateRollNumberError>() => {
            HttpResponse::BadRequest().body("Student with this roll number already exists")
        }
        Err(e) => {
            log::error!("写入学生信息时出错: {:?}", e);
            HttpResponse::InternalServerError().body("Error adding student")
        }
    }
}
