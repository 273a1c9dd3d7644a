use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const ENV_FALLBACK_PRODUCTS_PATH: &str = "FALLBACK_PRODUCTS_PATH";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("invalid environment variable {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cors_allowed_origins: Vec<HeaderValue>,
    /// JSON array of storefront products served when a search finds nothing.
    pub fallback_products_path: Option<PathBuf>,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_allowed_origins: vec![HeaderValue::from_static(DEFAULT_CORS_ORIGIN)],
            fallback_products_path: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = non_blank(ENV_BIND_ADDR) {
            config.bind_addr =
                value
                    .trim()
                    .parse()
                    .map_err(|err| ServerConfigError::InvalidVar {
                        name: ENV_BIND_ADDR,
                        reason: format!("'{value}' is not a socket address: {err}"),
                    })?;
        }

        if let Some(value) = non_blank(ENV_CORS_ALLOWED_ORIGINS) {
            config.cors_allowed_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(|origin| {
                    HeaderValue::from_str(origin).map_err(|_| ServerConfigError::InvalidVar {
                        name: ENV_CORS_ALLOWED_ORIGINS,
                        reason: format!("'{origin}' is not a valid origin"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
        }

        config.fallback_products_path = non_blank(ENV_FALLBACK_PRODUCTS_PATH)
            .map(|path| PathBuf::from(path.trim()));

        Ok(config)
    }
}
