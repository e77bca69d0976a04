use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Redirect plain-HTTP requests to their `https://` equivalent.
    pub force_https: bool,
    /// Value sent back in `Access-Control-Allow-Origin`.
    pub allowed_origin: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            force_https: true,
            allowed_origin: "*".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub security: SecurityConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let security = SecurityConfig {
            force_https: match std::env::var("FORCE_HTTPS") {
                Ok(v) => parse_flag(&v)
                    .with_context(|| format!("FORCE_HTTPS has an invalid value: {v}"))?,
                Err(_) => true,
            },
            allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".into()),
        };
        Ok(Self {
            database_url,
            max_connections,
            security,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
