use lazy_static::lazy_static;
use serde::Deserialize;

// 服务配置，config.toml不存在时使用默认值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: String,
    pub database_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: "127.0.0.1:5000".to_string(),
            database_file: "exam.db".to_string(),
        }
    }
}

impl Config {
    fn load() -> Config {
        match std::fs::read_to_string("config.toml") {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("config.toml格式错误，使用默认配置: {}", e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }
}

lazy_static! {
    pub static ref CONFIG: Config = Config::load();
}
