//! Process configuration from environment variables.
//!
//! `.env` is loaded by `main` through `dotenvy` before this runs.
//!
//! - BIND_ADDR: listen address (default: 127.0.0.1:7001)
//! - REDIS_URL: persistent store; when unset entries live in memory only
//! - REDIS_PREFIX: key namespace (default: wechat:config)
//! - WECHAT_AUTH_TOKEN: token for the server URL handshake (required)
//! - WECHAT_API_BASE: platform base URL (default: https://api.weixin.qq.com)
//! - WECHAT_HTTP_TIMEOUT_SECS: outbound timeout (default: 10)
//! - WECHAT_APP_ID / WECHAT_APP_SECRET: optional credentials stored at startup

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::store::DEFAULT_NAMESPACE;
use crate::token::DEFAULT_API_BASE;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7001";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub redis_url: Option<String>,
    pub redis_prefix: String,
    pub auth_token: String,
    pub api_base: String,
    pub http_timeout: Duration,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            }
        })?;

        let http_timeout = match get("WECHAT_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::Invalid {
                        name: "WECHAT_HTTP_TIMEOUT_SECS",
                        reason: e.to_string(),
                    }
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: "WECHAT_HTTP_TIMEOUT_SECS",
                        reason: "must be greater than zero".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let api_base = get("WECHAT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "WECHAT_API_BASE",
                reason: format!("expected an http(s) url, got {api_base}"),
            });
        }

        Ok(Self {
            bind_addr,
            redis_url: get("REDIS_URL"),
            redis_prefix: get("REDIS_PREFIX").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            auth_token: get("WECHAT_AUTH_TOKEN").ok_or(ConfigError::Missing("WECHAT_AUTH_TOKEN"))?,
            api_base,
            http_timeout,
            app_id: get("WECHAT_APP_ID"),
            app_secret: get("WECHAT_APP_SECRET"),
        })
    }
}
