//! Server configuration loaded from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default session lifetime: two weeks ("remember me").
const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// Accounts created with this email get the administrator role
    pub admin_email: Option<String>,
    /// Bootstraps the admin account at startup when set with `admin_email`
    pub admin_password: Option<String>,
    pub session_ttl: Duration,
    pub meili_url: Option<String>,
    pub meili_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: std::env::temp_dir().join("qna").join("qna.db"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            admin_email: None,
            admin_password: None,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            meili_url: None,
            meili_api_key: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// | Env Var                | Default             |
    /// |------------------------|---------------------|
    /// | `QNA_DATABASE_PATH`    | `<tmp>/qna/qna.db`  |
    /// | `QNA_BIND_ADDR`        | `127.0.0.1:8080`    |
    /// | `QNA_ADMIN_EMAIL`      | unset               |
    /// | `QNA_ADMIN_PASSWORD`   | unset               |
    /// | `QNA_SESSION_TTL_SECS` | `1209600`           |
    /// | `MEILI_URL`            | unset (SQL search)  |
    /// | `MEILI_API_KEY`        | unset               |
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!("Loaded environment from {}", path.display());
        }

        let defaults = Self::default();

        let bind_addr = match non_empty("QNA_BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Invalid QNA_BIND_ADDR {:?}: {}, using {}", raw, e, defaults.bind_addr);
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let session_ttl = match non_empty("QNA_SESSION_TTL_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!("Invalid QNA_SESSION_TTL_SECS {:?}, using default", raw);
                    defaults.session_ttl
                }
            },
            None => defaults.session_ttl,
        };

        Self {
            database_path: non_empty("QNA_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            bind_addr,
            admin_email: non_empty("QNA_ADMIN_EMAIL"),
            admin_password: non_empty("QNA_ADMIN_PASSWORD"),
            session_ttl,
            meili_url: non_empty("MEILI_URL"),
            meili_api_key: non_empty("MEILI_API_KEY"),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
