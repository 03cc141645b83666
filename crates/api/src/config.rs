//! Process configuration, read from the environment once at startup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use aidflow_events::DEFAULT_RESYNC_BACKOFF;

pub const BIND_ADDR_ENV: &str = "AIDFLOW_BIND_ADDR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const RESYNC_BACKOFF_ENV: &str = "AIDFLOW_RESYNC_BACKOFF_SECS";
pub const SSE_KEEPALIVE_ENV: &str = "AIDFLOW_SSE_KEEPALIVE_SECS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_SSE_KEEPALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: '{value}' is not a valid socket address")]
    BindAddr { var: &'static str, value: String },

    #[error("{var}: '{value}' is not a whole number of seconds")]
    Seconds { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Wait before the bus-to-SSE bridge reconnects after a drop.
    pub resync_backoff: Duration,
    pub sse_keepalive: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset or empty variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = get(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.trim().parse().map_err(|_| ConfigError::BindAddr {
            var: BIND_ADDR_ENV,
            value: bind_addr.clone(),
        })?;

        let jwt_secret = get(JWT_SECRET_ENV).unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let seconds = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match get(var) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::Seconds { var, value }),
            }
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            resync_backoff: seconds(RESYNC_BACKOFF_ENV, DEFAULT_RESYNC_BACKOFF)?,
            sse_keepalive: seconds(SSE_KEEPALIVE_ENV, DEFAULT_SSE_KEEPALIVE)?,
        })
    }

    /// Defaults with an explicit secret; used by tests and embedders.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            resync_backoff: DEFAULT_RESYNC_BACKOFF,
            sse_keepalive: DEFAULT_SSE_KEEPALIVE,
        }
    }
}
