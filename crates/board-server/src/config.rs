use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEV_SECRET: &str = "dev-secret-change-me";

/// Upper bound for `BOARD_TOKEN_TTL_HOURS`: one year.
const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    /// Empty means any origin, without credentials.
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("BOARD_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_secret = match lookup("BOARD_JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if environment == Environment::Development => DEV_SECRET.to_string(),
            None => bail!("BOARD_JWT_SECRET must be set in production"),
        };
        if environment == Environment::Production && PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str())
        {
            bail!("BOARD_JWT_SECRET is still a placeholder");
        }

        let port = match lookup("BOARD_PORT") {
            Some(v) => v.parse().with_context(|| format!("invalid BOARD_PORT {:?}", v))?,
            None => 3000,
        };
        let token_ttl_hours = match lookup("BOARD_TOKEN_TTL_HOURS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid BOARD_TOKEN_TTL_HOURS {:?}", v))?,
            None => 24,
        };
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!(
                "BOARD_TOKEN_TTL_HOURS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS,
                token_ttl_hours
            );
        }

        let allowed_origins = lookup("BOARD_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment,
            host: lookup("BOARD_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: lookup("BOARD_DB_PATH").unwrap_or_else(|| "board.db".into()).into(),
            jwt_secret,
            token_ttl_hours,
            allowed_origins,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn uses_dev_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}
