use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::DuplicateUsernameError;
use crate::sql_server::SqlServerHandle;
use crate::structs::record::PublicAccount;
use crate::structs::request::{LoginRequest, SignupRequest};

// 列出全部faculty账号，没有账号时返回空数组
pub(crate) async fn list_faculty(sql_server: web::Data<SqlServerHandle>) -> HttpResponse {
    match sql_server.list_faculty().await {
        Ok(accounts) => {
            let faculty: Vec<PublicAccount> = accounts.iter().map(PublicAccount::from).collect();
            HttpResponse::Ok().json(faculty)
        }
        Err(e) => {
            log::error!("查询faculty账号时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "message": "Server error----Faculty is 0 Members",
                "error": e.to_string()
            }))
        }
    }
}

// 注册新账号，密码只存bcrypt哈希
pub(crate) async fn signup(
    req_body: web::Json<SignupRequest>,
    sql_server: web::Data<SqlServerHandle>,
) -> HttpResponse {
    let hashed_password = match bcrypt::hash(&req_body.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("计算密码哈希时出错: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({"message": "Server error"}));
        }
    };
    let result = sql_server
        .insert_account(req_body.username.clone(), hashed_password, req_body.email.clone())
        .await;
    match result {
        Ok(()) => HttpResponse::Created().json(json!({"message": "Admin registered successfully"})),
        Err(e) if e.is::<DuplicateUsernameError>() => {
            HttpResponse::BadRequest().json(json!({"message": "Admin already exists"}))
        }
        Err(e) => {
            log::error!("写入账号信息时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Server error"}))
        }
    }
}

// 校验用户名和密码，登录成功返回账号投影，不含哈希
pub(crate) async fn login(
    req_body: web::Json<LoginRequest>,
    sql_server: web::Data<SqlServerHandle>,
) -> HttpResponse {
    let account = match sql_server.find_account(req_body.username.clone()).await {
        Ok(Some(account)) => account,
        Ok(None) => return HttpResponse::NotFound().body("Admin not found"),
        Err(e) => {
            log::error!("查询账号时出错: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({"message": "Server error"}));
        }
    };
    match bcrypt::verify(&req_body.password, &account.password) {
        Ok(true) => HttpResponse::Ok().json(json!({
            "message": "User logged in",
            "data": PublicAccount::from(&account)
        })),
        Ok(false) => HttpResponse::BadRequest().body("Invalid password"),
        Err(e) => {
            log::error!("校验密码哈希时出错: {:?}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Server error"}))
        }
    }
}
