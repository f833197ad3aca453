//! Server settings read from the environment.

use std::net::{IpAddr, SocketAddr};

/// Fallback secret for local development only.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me-in-production";

const KNOWN_DEFAULT_SECRETS: &[&str] = &[DEV_JWT_SECRET, "change-me-to-a-secure-random-string"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid SCHOOLHUB_BIND address: {0}")]
    InvalidBind(String),

    #[error("refusing to start: JWT_SECRET must be set to a secure value in production")]
    InsecureSecret,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub jwt_secret: String,
    pub production: bool,
    pub audit_page_size: u64,
    /// Empty means same-origin only.
    pub cors_origins: Vec<String>,
    /// Peers allowed to report the client address via `X-Forwarded-For`.
    /// Empty means the header is ignored.
    pub trusted_proxies: Vec<IpAddr>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("SCHOOLHUB_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_raw.clone()))?;

        let production = lookup("SCHOOLHUB_ENV").unwrap_or_default() == "production";

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        if KNOWN_DEFAULT_SECRETS.contains(&jwt_secret.as_str()) {
            // SECURITY: a known secret lets anyone mint admin tokens
            tracing::error!(
                "JWT_SECRET is set to a known default value! \
                 Set JWT_SECRET to a strong random string (>=32 chars) in production."
            );
            if production {
                return Err(ConfigError::InsecureSecret);
            }
        }

        let audit_page_size = lookup("AUDIT_PAGE_SIZE")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n: &u64| *n > 0)
            .unwrap_or(50);

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let trusted_proxies = lookup("TRUSTED_PROXIES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match s.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(entry = s, "ignoring invalid TRUSTED_PROXIES entry");
                    None
                }
            })
            .collect();

        Ok(Self {
            bind,
            jwt_secret,
            production,
            audit_page_size,
            cors_origins,
            trusted_proxies,
        })
    }
}
