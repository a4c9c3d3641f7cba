use log;
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{pool::Pool, sqlite::{Sqlite, SqlitePoolOptions}};
use std::{error::Error, io};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot};

use crate::error::{DuplicateRollNumberError, DuplicateUsernameError, NoSuchStudentError};
use crate::structs::alias::{DocumentId, RollNumber, SqlFile, Username};
use crate::structs::record::{Account, Answer, GradingRecord, ReviewDocument, ReviewStatus, Student};

#[derive(Debug)]
enum Command {
    FindAccount {
        username: Username,
        res_tx: oneshot::Sender<Result<Option<Account>, Box<dyn Error + Send + Sync>>>,
    },
    InsertAccount {
        username: Username,
        password_hash: String,
        email: String,
        res_tx: oneshot::Sender<Result<(), Box<dyn Error + Send + Sync>>>,
    },
    ListFaculty {
        res_tx: oneshot::Sender<Result<Vec<Account>, Box<dyn Error + Send + Sync>>>,
    },
    InsertStudent {
        name: String,
        roll_number: RollNumber,
        course: String,
        year: i64,
        res_tx: oneshot::Sender<Result<Student, Box<dyn Error + Send + Sync>>>,
    },
    InsertDocument {
        subject_id: String,
        question_paper_url: String,
        answer_sheet_url: String,
        roll_number: RollNumber,
        assigned_to: String,
        res_tx: oneshot::Sender<Result<ReviewDocument, Box<dyn Error + Send + Sync>>>,
    },
    ListAssigned {
        assigned_to: String,
        res_tx: oneshot::Sender<Result<Vec<ReviewDocument>, Box<dyn Error + Send + Sync>>>,
    },
    UpdateDocument {
        id: DocumentId,
        status: ReviewStatus,
        marks: i64,
        res_tx: oneshot::Sender<Result<Option<ReviewDocument>, Box<dyn Error + Send + Sync>>>,
    },
    ListDocuments {
        res_tx: oneshot::Sender<Result<Vec<ReviewDocument>, Box<dyn Error + Send + Sync>>>,
    },
    InsertGrading {
        roll_number: RollNumber,
        answers: Vec<Answer>,
        total_marks: i64,
        res_tx: oneshot::Sender<Result<GradingRecord, Box<dyn Error + Send + Sync>>>,
    },
}

pub struct SqlServer {
    // sql连接池
    pool: Pool<Sqlite>,

    /// 接收命令的管道
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

const REVIEW_DOCUMENT_COLUMNS: &str =
    "id, subject_id, question_paper_url, answer_sheet_url, roll_number, upload_date, assigned_to, status, marks";

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

// 唯一约束冲突
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if matches!(db.kind(), ErrorKind::UniqueViolation))
}

// 外键约束冲突，即引用的学籍号不存在
fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if matches!(db.kind(), ErrorKind::ForeignKeyViolation))
}

/// 命令执行层
impl SqlServer {
    pub async fn new(sql_file: SqlFile) -> Result<(SqlServer, SqlServerHandle), Box<dyn Error>> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        // 数据库文件不存在则新建，外键检查要对每条连接开启
        let options = SqliteConnectOptions::new()
            .filename(sql_file.as_str())
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                log::error!("创建SQL连接池失败: {:?}", e);
                Box::new(e) as Box<dyn Error>
            })?;

        // 执行创建表的 SQL 语句
        for statement in [
            "CREATE TABLE IF NOT EXISTS users (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role     TEXT NOT NULL DEFAULT 'faculty',
                subject  TEXT NOT NULL DEFAULT 'Maths',
                email    TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS students (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                roll_number TEXT NOT NULL UNIQUE,
                course      TEXT NOT NULL,
                year        INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS review_documents (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_id         TEXT NOT NULL,
                question_paper_url TEXT NOT NULL,
                answer_sheet_url   TEXT NOT NULL,
                roll_number        TEXT NOT NULL REFERENCES students(roll_number),
                upload_date        INTEGER NOT NULL,
                assigned_to        TEXT NOT NULL,
                status             TEXT NOT NULL DEFAULT 'pending',
                marks              INTEGER NOT NULL DEFAULT 0
            )",
            "CREATE TABLE IF NOT EXISTS gradings (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                roll_number     TEXT NOT NULL REFERENCES students(roll_number),
                answers         TEXT NOT NULL,
                total_marks     INTEGER NOT NULL,
                date_of_grading INTEGER NOT NULL
            )",
        ] {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| {
                    log::error!("执行创建表命令失败: {:?}", e);
                    Box::new(e) as Box<dyn Error>
                })?;
        }

        Ok((
            SqlServer {
                pool,
                cmd_rx,
            },
            SqlServerHandle {
                cmd_tx,
            },
        ))
    }

    /// 按用户名查询账号
    async fn find_account(&mut self, username: Username) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        let query = sqlx::query_as::<_, Account>(
            "SELECT id, username, password, role, subject, email FROM users WHERE username = ?",
        )
        .bind(username);
        query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
    }

    /// 新建账号，用户名重复时由唯一索引拦下
    async fn insert_account(
        &mut self,
        username: Username,
        password_hash: String,
        email: String,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        sqlx::query("INSERT INTO users (username, password, email) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Box::new(DuplicateUsernameError) as Box<dyn Error + Send + Sync>
                } else {
                    Box::new(e)
                }
            })?;
        Ok(())
    }

    /// 查询全部faculty账号
    async fn list_faculty(&mut self) -> Result<Vec<Account>, Box<dyn Error + Send + Sync>> {
        sqlx::query_as::<_, Account>(
            "SELECT id, username, password, role, subject, email FROM users WHERE role = 'faculty'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
    }

    /// 登记学生信息
    async fn insert_student(
        &mut self,
        name: String,
        roll_number: RollNumber,
        course: String,
        year: i64,
    ) -> Result<Student, Box<dyn Error + Send + Sync>> {
        let result = sqlx::query("INSERT INTO students (name, roll_number, course, year) VALUES (?, ?, ?, ?)")
            .bind(&name)
            .bind(&roll_number)
            .bind(&course)
            .bind(year)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Box::new(DuplicateRollNumberError) as Box<dyn Error + Send + Sync>
                } else {
                    Box::new(e)
                }
            })?;
        Ok(Student {
            id: result.last_insert_rowid(),
            name,
            roll_number,
            course,
            year,
        })
    }

    /// 新建评阅文档，初始状态为pending
    async fn insert_document(
        &mut self,
        subject_id: String,
        question_paper_url: String,
        answer_sheet_url: String,
        roll_number: RollNumber,
        assigned_to: String,
    ) -> Result<ReviewDocument, Box<dyn Error + Send + Sync>> {
        let upload_date = unix_now();
        let result = sqlx::query(
            "INSERT INTO review_documents
                (subject_id, question_paper_url, answer_sheet_url, roll_number, upload_date, assigned_to)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&subject_id)
        .bind(&question_paper_url)
        .bind(&answer_sheet_url)
        .bind(&roll_number)
        .bind(upload_date)
        .bind(&assigned_to)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                Box::new(NoSuchStudentError) as Box<dyn Error + Send + Sync>
            } else {
                Box::new(e)
            }
        })?;
        Ok(ReviewDocument {
            id: result.last_insert_rowid(),
            subject_id,
            question_paper_url,
            answer_sheet_url,
            roll_number,
            upload_date,
            assigned_to,
            status: ReviewStatus::Pending.as_str().to_string(),
            marks: 0,
        })
    }

    /// 查询分配给某个faculty的全部文档
    async fn list_assigned(&mut self, assigned_to: String) -> Result<Vec<ReviewDocument>, Box<dyn Error + Send + Sync>> {
        sqlx::query_as::<_, ReviewDocument>(&format!(
            "SELECT {} FROM review_documents WHERE assigned_to = ?",
            REVIEW_DOCUMENT_COLUMNS
        ))
        .bind(assigned_to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
    }

    /// 覆写文档的状态和分数，返回更新后的记录
    async fn update_document(
        &mut self,
        id: DocumentId,
        status: ReviewStatus,
        marks: i64,
    ) -> Result<Option<ReviewDocument>, Box<dyn Error + Send + Sync>> {
        let result = sqlx::query("UPDATE review_documents SET status = ?, marks = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(marks)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        sqlx::query_as::<_, ReviewDocument>(&format!(
            "SELECT {} FROM review_documents WHERE id = ?",
            REVIEW_DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
    }

    /// 查询全部评阅文档
    async fn list_documents(&mut self) -> Result<Vec<ReviewDocument>, Box<dyn Error + Send + Sync>> {
        sqlx::query_as::<_, ReviewDocument>(&format!(
            "SELECT {} FROM review_documents",
            REVIEW_DOCUMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
    }

    /// 记录一次评分提交，answers以json文本存储
    async fn insert_grading(
        &mut self,
        roll_number: RollNumber,
        answers: Vec<Answer>,
        total_marks: i64,
    ) -> Result<GradingRecord, Box<dyn Error + Send + Sync>> {
        let answers_json = serde_json::to_string(&answers)
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
        let date_of_grading = unix_now();
        let result = sqlx::query(
            "INSERT INTO gradings (roll_number, answers, total_marks, date_of_grading) VALUES (?, ?, ?, ?)",
        )
        .bind(&roll_number)
        .bind(answers_json)
        .bind(total_marks)
        .bind(date_of_grading)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                Box::new(NoSuchStudentError) as Box<dyn Error + Send + Sync>
            } else {
                Box::new(e)
            }
        })?;
        Ok(GradingRecord {
            id: result.last_insert_rowid(),
            roll_number,
            answers,
            total_marks,
            date_of_grading,
        })
    }

    pub async fn run(mut self) -> io::Result<()> {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                Command::FindAccount { username, res_tx } => {
                    let result = self.find_account(username).await;
                    let _ = res_tx.send(result);
                }
                Command::InsertAccount { username, password_hash, email, res_tx } => {
                    let result = self.insert_account(username, password_hash, email).await;
                    let _ = res_tx.send(result);
                }
                Command::ListFaculty { res_tx } => {
                    let result = self.list_faculty().await;
                    let _ = res_tx.send(result);
                }
                Command::InsertStudent { name, roll_number, course, year, res_tx } => {
                    let result = self.insert_student(name, roll_number, course, year).await;
                    let _ = res_tx.send(result);
                }
                Command::InsertDocument {
                    subject_id,
                    question_paper_url,
                    answer_sheet_url,
                    roll_number,
                    assigned_to,
                    res_tx,
                } => {
                    let result = self
                        .insert_document(subject_id, question_paper_url, answer_sheet_url, roll_number, assigned_to)
                        .await;
                    let _ = res_tx.send(result);
                }
                Command::ListAssigned { assigned_to, res_tx } => {
                    let result = self.list_assigned(assigned_to).await;
                    let _ = res_tx.send(result);
                }
                Command::UpdateDocument { id, status, marks, res_tx } => {
                    let result = self.update_document(id, status, marks).await;
                    let _ = res_tx.send(result);
                }
                Command::ListDocuments { res_tx } => {
                    let result = self.list_documents().await;
                    let _ = res_tx.send(result);
                }
                Command::InsertGrading { roll_number, answers, total_marks, res_tx } => {
                    let result = self.insert_grading(roll_number, answers, total_marks).await;
                    let _ = res_tx.send(result);
                }
            }
        }
        Ok(())
    }
}

/// handler层
#[derive(Debug, Clone)]
pub struct SqlServerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
}
impl SqlServerHandle {
    pub async fn find_account(&self, username: Username) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::FindAccount { username, res_tx })
            .unwrap();
        // unwrap: sql server does not drop the response channel
        res_rx.await.unwrap()
    }
    pub async fn insert_account(
        &self,
        username: Username,
        password_hash: String,
        email: String,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::InsertAccount { username, password_hash, email, res_tx })
            .unwrap();
        res_rx.await.unwrap()
    }
    pub async fn list_faculty(&self) -> Result<Vec<Account>, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx.send(Command::ListFaculty { res_tx }).unwrap();
        res_rx.await.unwrap()
    }
    pub async fn insert_student(
        &self,
        name: String,
        roll_number: RollNumber,
        course: String,
        year: i64,
    ) -> Result<Student, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::InsertStudent { name, roll_number, course, year, res_tx })
            .unwrap();
        res_rx.await.unwrap()
    }
    pub async fn insert_document(
        &self,
        subject_id: String,
        question_paper_url: String,
        answer_sheet_url: String,
        roll_number: RollNumber,
        assigned_to: String,
    ) -> Result<ReviewDocument, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::InsertDocument {
                subject_id,
                question_paper_url,
                answer_sheet_url,
                roll_number,
                assigned_to,
                res_tx,
            })
            .unwrap();
        res_rx.await.unwrap()
    }
    pub async fn list_assigned(&self, assigned_to: String) -> Result<Vec<ReviewDocument>, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListAssigned { assigned_to, res_tx })
            .unwrap();
        res_rx.await.unwrap()
    }
    pub async fn update_document(
        &self,
        id: DocumentId,
        status: ReviewStatus,
        marks: i64,
    ) -> Result<Option<ReviewDocument>, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::UpdateDocument { id, status, marks, res_tx })
            .unwrap();
        res_rx.await.unwrap()
    }
    pub async fn list_documents(&self) -> Result<Vec<ReviewDocument>, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx.send(Command::ListDocuments { res_tx }).unwrap();
        res_rx.await.unwrap()
    }
    pub async fn insert_grading(
        &self,
        roll_number: RollNumber,
        answers: Vec<Answer>,
        total_marks: i64,
    ) -> Result<GradingRecord, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::InsertGrading { roll_number, answers, total_marks, res_tx })
            .unwrap();
        res_rx.await.unwrap()
    }
}
