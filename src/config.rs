use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub raffle: RaffleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 存储后端: memory (进程内, 重启即清空) 或 postgres (sea-orm)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub session_expires_in: i64, // seconds
    pub admin_expires_in: i64,   // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// 管理员共享密码的 bcrypt 哈希
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleConfig {
    /// 奖池首次访问时的初始数量
    #[serde(default = "default_initial_prizes")]
    pub initial_prizes: i64,
    /// 每次有效抽奖的中奖概率 (0.0 ~ 1.0)
    #[serde(default = "default_win_probability")]
    pub win_probability: f64,
    /// 清空数据时需要输入的确认文本
    #[serde(default = "default_purge_confirmation")]
    pub purge_confirmation: String,
}

fn default_initial_prizes() -> i64 {
    30
}

fn default_win_probability() -> f64 {
    0.25
}

fn default_purge_confirmation() -> String {
    "LIMPAR".to_string()
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            initial_prizes: default_initial_prizes(),
            win_probability: default_win_probability(),
            purge_confirmation: default_purge_confirmation(),
        }
    }
}

impl RaffleConfig {
    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.win_probability) {
            return Err(AppError::ConfigError(format!(
                "raffle.win_probability must be within [0, 1], got {}",
                self.win_probability
            )));
        }
        if self.initial_prizes < 0 {
            return Err(AppError::ConfigError(
                "raffle.initial_prizes must not be negative".to_string(),
            ));
        }
        if self.purge_confirmation.trim().is_empty() {
            return Err(AppError::ConfigError(
                "raffle.purge_confirmation must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 管理员密码哈希在无配置文件时必须提供
                let password_hash = get_env("ADMIN_PASSWORD_HASH")
                    .ok_or("Missing ADMIN_PASSWORD_HASH and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    store: StoreConfig::default(),
                    database: DatabaseConfig {
                        url: get_env("DATABASE_URL").unwrap_or_default(),
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        session_expires_in: get_env_parse("JWT_SESSION_EXPIRES_IN", 2_592_000i64),
                        admin_expires_in: get_env_parse("JWT_ADMIN_EXPIRES_IN", 28_800i64),
                    },
                    admin: AdminConfig { password_hash },
                    raffle: RaffleConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("STORE_BACKEND") {
            config.store.backend = match v.to_ascii_lowercase().as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                other => return Err(format!("Unknown STORE_BACKEND: {other}").into()),
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_SESSION_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.session_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_ADMIN_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.admin_expires_in = n;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD_HASH") {
            config.admin.password_hash = v;
        }
        if let Ok(v) = env::var("RAFFLE_INITIAL_PRIZES")
            && let Ok(n) = v.parse()
        {
            config.raffle.initial_prizes = n;
        }
        if let Ok(v) = env::var("RAFFLE_WIN_PROBABILITY")
            && let Ok(p) = v.parse()
        {
            config.raffle.win_probability = p;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config =
            toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}"))?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.raffle.validate()?;
        if self.store.backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::ConfigError(
                "database.url is required when store.backend = \"postgres\"".to_string(),
            ));
        }
        if self.admin.password_hash.is_empty() {
            return Err(AppError::ConfigError(
                "admin.password_hash must be set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 9000

        [jwt]
        secret = "s3cret"
        session_expires_in = 3600
        admin_expires_in = 600

        [admin]
        password_hash = "$2b$04$abcdefghijklmnopqrstuv"
    "#;

    #[test]
    fn test_parse_minimal_config_uses_raffle_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.raffle.initial_prizes, 30);
        assert_eq!(config.raffle.win_probability, 0.25);
        assert_eq!(config.raffle.purge_confirmation, "LIMPAR");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_postgres_backend() {
        let toml = format!(
            "{MINIMAL}\n[store]\nbackend = \"postgres\"\n\n[database]\nurl = \"postgres://localhost/raffle\"\nmax_connections = 4\n"
        );
        let config = Config::parse(&toml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.database.max_connections, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let toml = format!("{MINIMAL}\n[store]\nbackend = \"postgres\"\n");
        let config = Config::parse(&toml).unwrap();
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_win_probability_out_of_range() {
        let raffle = RaffleConfig {
            win_probability: 1.5,
            ..RaffleConfig::default()
        };
        assert!(raffle.validate().is_err());

        let raffle = RaffleConfig {
            win_probability: 1.0,
            ..RaffleConfig::default()
        };
        assert!(raffle.validate().is_ok());
    }
}
