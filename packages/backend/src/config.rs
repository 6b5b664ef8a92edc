use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/learnbible.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub seed_path: Option<PathBuf>,
    pub default_translation: String,
    pub default_session_size: usize,
    pub max_session_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_parse("PORT").unwrap_or(3000);

        let host = env_parse("HOST").unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let database_url = env_non_empty("DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let seed_path = env_non_empty("SEED_PATH").map(PathBuf::from);

        let default_translation =
            env_non_empty("DEFAULT_TRANSLATION").unwrap_or_else(|| "NIV".to_string());

        let max_session_size = env_parse::<usize>("MAX_SESSION_SIZE")
            .filter(|v| *v > 0)
            .unwrap_or(50);
        let default_session_size = env_parse::<usize>("DEFAULT_SESSION_SIZE")
            .filter(|v| *v > 0)
            .unwrap_or(10)
            .min(max_session_size);

        Self {
            host,
            port,
            log_level,
            database_url,
            seed_path,
            default_translation,
            default_session_size,
            max_session_size,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 3000,
            log_level: "info".to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            seed_path: None,
            default_translation: "NIV".to_string(),
            default_session_size: 10,
            max_session_size: 50,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_non_empty(key).and_then(|v| v.parse::<T>().ok())
}
