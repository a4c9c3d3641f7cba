use crate::config::CONFIG;
use crate::sql_server::SqlServer;

mod config;
mod error;
mod service;
mod sql_server;
mod structs;
mod webserver;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    if let Ok((sql_server, sql_server_handle)) = SqlServer::new(CONFIG.database_file.clone()).await {
        tokio::spawn(sql_server.run());
        webserver::new_webserver(sql_server_handle).await
    } else {
        panic!("读取数据库失败!")
    }
}
