use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::config::CONFIG;
use crate::service::{account, grading, review, student};
use crate::sql_server::SqlServerHandle;

// 路由表，主程序和测试挂载同一份
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/users/faculty", web::get().to(account::list_faculty))
        .service(
            web::scope("/admin")
                .route("/signup", web::post().to(account::signup))
                .route("/login", web::post().to(account::login)),
        )
        .route("/students", web::post().to(student::add_student))
        .service(
            web::scope("/Que_Ans")
                .route("/upload", web::post().to(review::upload))
                .route("/assigned_to/{assigned_to}", web::get().to(review::list_assigned)),
        )
        .route("/update/{id}", web::put().to(review::update))
        .route("/student/grade", web::post().to(grading::submit_grading))
        .route("/students-overview", web::get().to(review::overview));
}

// 启动actix服务
pub async fn new_webserver(sql_server: SqlServerHandle) -> std::io::Result<()> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(sql_server.clone()))
            .configure(routes)
    })
    .bind(CONFIG.bind_address.as_str())?
    .run();
    log::info!("HTTP服务启动成功: {}", CONFIG.bind_address);
    server.await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{dev::ServiceResponse, test};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::sql_server::SqlServer;

    async fn test_handle() -> (TempDir, SqlServerHandle) {
        let dir = tempfile::tempdir().unwrap();
        let sql_file = dir.path().join("test.db").to_str().unwrap().to_string();
        let (sql_server, handle) = SqlServer::new(sql_file).await.unwrap();
        tokio::spawn(sql_server.run());
        (dir, handle)
    }

    // 挂载和主程序相同的路由表
    macro_rules! test_app {
        ($handle:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($handle.clone()))
                    .configure(routes),
            )
            .await
        };
    }

    async fn body_json(res: ServiceResponse) -> Value {
        test::read_body_json(res).await
    }

    #[actix_web::test]
    async fn signup_stores_hash_not_plaintext() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let req = test::TestRequest::post()
            .uri("/admin/signup")
            .set_json(json!({"username": "alice", "password": "secret", "email": "a@example.com"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 201);

        let account = handle.find_account("alice".to_string()).await.unwrap().unwrap();
        assert_ne!(account.password, "secret");
        assert!(bcrypt::verify("secret", &account.password).unwrap());
    }

    #[actix_web::test]
    async fn duplicate_signup_is_conflict() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let body = json!({"username": "alice", "password": "secret", "email": "a@example.com"});
        let req = test::TestRequest::post().uri("/admin/signup").set_json(&body).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post().uri("/admin/signup").set_json(&body).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 400);
        assert_eq!(body_json(res).await["message"], "Admin already exists");
    }

    #[actix_web::test]
    async fn login_status_codes() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let req = test::TestRequest::post()
            .uri("/admin/signup")
            .set_json(json!({"username": "alice", "password": "secret", "email": "a@example.com"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        // 正确密码
        let req = test::TestRequest::post()
            .uri("/admin/login")
            .set_json(json!({"username": "alice", "password": "secret"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 200);
        let body = body_json(res).await;
        assert_eq!(body["message"], "User logged in");
        assert_eq!(body["data"]["username"], "alice");
        // 哈希不返回给客户端
        assert!(body["data"].get("password").is_none());

        // 错误密码
        let req = test::TestRequest::post()
            .uri("/admin/login")
            .set_json(json!({"username": "alice", "password": "wrong"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        // 不存在的用户名
        let req = test::TestRequest::post()
            .uri("/admin/login")
            .set_json(json!({"username": "nobody", "password": "secret"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn faculty_listing_is_public_projection() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        // 没有账号时也返回200
        let req = test::TestRequest::get().uri("/users/faculty").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 200);
        assert_eq!(body_json(res).await, json!([]));

        handle
            .insert_account("alice".to_string(), "h".to_string(), "a@example.com".to_string())
            .await
            .unwrap();
        let req = test::TestRequest::get().uri("/users/faculty").to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["role"], "faculty");
        assert_eq!(body[0]["subject"], "Maths");
        assert!(body[0].get("password").is_none());
    }

    #[actix_web::test]
    async fn add_student_requires_all_fields() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        for body in [
            json!({"roll_number": "R1", "course": "BSc", "year": 2}),
            json!({"name": "Ravi", "roll_number": "", "course": "BSc", "year": 2}),
            json!({"name": "Ravi", "roll_number": "R1", "course": "BSc", "year": 0}),
        ] {
            let req = test::TestRequest::post().uri("/students").set_json(body).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 400);
        }

        let req = test::TestRequest::post()
            .uri("/students")
            .set_json(json!({"name": "Ravi", "roll_number": "R1", "course": "BSc", "year": 2}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }

    #[actix_web::test]
    async fn upload_with_unknown_roll_creates_nothing() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let req = test::TestRequest::post()
            .uri("/Que_Ans/upload")
            .set_json(json!({
                "subject_id": "MATH101",
                "question_paper_url": "http://files/q.pdf",
                "answer_sheet_url": "http://files/a.pdf",
                "roll_number": "R404",
                "assigned_to": "F1"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 404);

        // 集合保持为空
        let req = test::TestRequest::get().uri("/students-overview").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn assigned_listing_filters_and_projects() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        handle
            .insert_student("Ravi".to_string(), "R1".to_string(), "BSc".to_string(), 2)
            .await
            .unwrap();
        for assigned_to in ["F1", "F1", "F2"] {
            handle
                .insert_document(
                    "MATH101".to_string(),
                    "http://files/q.pdf".to_string(),
                    "http://files/a.pdf".to_string(),
                    "R1".to_string(),
                    assigned_to.to_string(),
                )
                .await
                .unwrap();
        }

        let req = test::TestRequest::get().uri("/Que_Ans/assigned_to/F1").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 200);
        let body = body_json(res).await;
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        for doc in data {
            assert_eq!(doc["assigned_to"], "F1");
            assert_eq!(doc["status"], "pending");
            // 投影字段名沿用前端约定
            assert!(doc.get("_id").is_some());
            assert_eq!(doc["Ans_Url"], "http://files/a.pdf");
            assert_eq!(doc["Ques_Url"], "http://files/q.pdf");
            assert!(doc.get("upload_date").is_none());
            assert!(doc.get("marks").is_none());
        }

        // 没有匹配的assigned_to
        let req = test::TestRequest::get().uri("/Que_Ans/assigned_to/F3").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn update_is_last_write_wins() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        handle
            .insert_student("Ravi".to_string(), "R1".to_string(), "BSc".to_string(), 2)
            .await
            .unwrap();
        let doc = handle
            .insert_document(
                "MATH101".to_string(),
                "http://files/q.pdf".to_string(),
                "http://files/a.pdf".to_string(),
                "R1".to_string(),
                "F1".to_string(),
            )
            .await
            .unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/update/{}", doc.id))
            .set_json(json!({"status": "reviewed", "marks": 35}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::put()
            .uri(&format!("/update/{}", doc.id))
            .set_json(json!({"status": "pending", "marks": 42}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 200);
        let body = body_json(res).await;
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["marks"], 42);
    }

    #[actix_web::test]
    async fn update_rejects_unknown_status() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let req = test::TestRequest::put()
            .uri("/update/1")
            .set_json(json!({"status": "shredded", "marks": 1}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn update_unknown_document_is_404() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let req = test::TestRequest::put()
            .uri("/update/99")
            .set_json(json!({"status": "reviewed", "marks": 1}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn grading_rejects_empty_answers() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        handle
            .insert_student("Ravi".to_string(), "R1".to_string(), "BSc".to_string(), 2)
            .await
            .unwrap();
        let req = test::TestRequest::post()
            .uri("/student/grade")
            .set_json(json!({"roll_number": "R1", "answers": [], "totalMarks": 10}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 400);
        assert_eq!(body_json(res).await["message"], "Missing required fields");
    }

    #[actix_web::test]
    async fn grading_unknown_roll_is_404() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let req = test::TestRequest::post()
            .uri("/student/grade")
            .set_json(json!({
                "roll_number": "R404",
                "answers": [{"questionNumber": 1, "marksObtained": 5}],
                "totalMarks": 5
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 404);
        assert_eq!(body_json(res).await["message"], "Student not found");
    }

    #[actix_web::test]
    async fn grading_submission_round_trip() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        handle
            .insert_student("Ravi".to_string(), "R1".to_string(), "BSc".to_string(), 2)
            .await
            .unwrap();
        let req = test::TestRequest::post()
            .uri("/student/grade")
            .set_json(json!({
                "roll_number": "R1",
                "answers": [
                    {"questionNumber": 1, "marksObtained": 5, "comments": "clean proof"},
                    {"questionNumber": 2, "marksObtained": 3}
                ],
                "totalMarks": 8
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 201);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Grading added successfully");
        assert_eq!(body["grading"]["totalMarks"], 8);
        assert_eq!(body["grading"]["answers"][0]["comments"], "clean proof");
    }

    // 完整流程：登记学生 -> 上传 -> 查询分配 -> 评阅 -> 总览
    #[actix_web::test]
    async fn full_review_flow() {
        let (_dir, handle) = test_handle().await;
        let app = test_app!(handle);

        let req = test::TestRequest::post()
            .uri("/students")
            .set_json(json!({"name": "Ravi", "roll_number": "R1", "course": "BSc", "year": 2}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri("/Que_Ans/upload")
            .set_json(json!({
                "subject_id": "MATH101",
                "question_paper_url": "http://files/q.pdf",
                "answer_sheet_url": "http://files/a.pdf",
                "roll_number": "R1",
                "assigned_to": "F1"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 201);

        let req = test::TestRequest::get().uri("/Que_Ans/assigned_to/F1").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 200);
        let body = body_json(res).await;
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["status"], "pending");
        let id = data[0]["_id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/update/{}", id))
            .set_json(json!({"status": "reviewed", "marks": 42}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get().uri("/students-overview").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 200);
        let body = body_json(res).await;
        assert_eq!(body["data"][0]["status"], "reviewed");
        assert_eq!(body["data"][0]["marks"], 42);
    }
}
