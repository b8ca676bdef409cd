//! Credential refresh core.
//!
//! `WechatService` chains the two short-lived credentials the JS-SDK needs:
//!
//! ```text
//! appId + appSecret --(token endpoint)--> access_token (29 min)
//! access_token      --(ticket endpoint)--> js_ticket   (60 min)
//! js_ticket + nonce + timestamp + url  --> page signature
//! ```
//!
//! Each step first asks the `ConfigAccessor` for a still-valid value and only
//! calls the platform when that fails. Successful fetches are written to the
//! store and the cache together. There are no locks: concurrent callers that
//! both see an expired token both refresh, and the last write wins.
//!
//! Failures keep the numeric result codes callers already know about
//! (see `ServiceError::code`): -1 appId missing, -2 appSecret missing,
//! -3 access_token unavailable, -4 js_ticket unavailable, or the platform
//! errcode itself.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::accessor::ConfigAccessor;
use crate::errors;
use crate::model::{ACCESS_TOKEN, APP_ID, APP_SECRET, JS_TICKET, now_millis};
use crate::signature::{generate_nonce, jsapi_signature};
use crate::store::StoreError;
use crate::token::{self, WxClient};

/// access_token lifetime we record locally (the platform grants 7200s)
pub const ACCESS_TOKEN_TTL_MS: i64 = 29 * 60 * 1000;
/// js_ticket lifetime we record locally
pub const JS_TICKET_TTL_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("appId not configured")]
    AppIdMissing,

    #[error("appSecret not configured")]
    AppSecretMissing,

    #[error("access_token unavailable: {0}")]
    AccessTokenUnavailable(#[source] Box<ServiceError>),

    #[error("js_ticket unavailable: {0}")]
    JsTicketUnavailable(#[source] Box<ServiceError>),

    #[error("weixin error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(#[source] token::Error),
}

impl From<token::Error> for ServiceError {
    fn from(e: token::Error) -> Self {
        match e {
            token::Error::Wx { code, message } => ServiceError::Remote { code, message },
            other => ServiceError::Transport(other),
        }
    }
}

impl ServiceError {
    /// Legacy integer result code. `None` for storage and transport faults.
    pub fn code(&self) -> Option<i64> {
        match self {
            ServiceError::AppIdMissing => Some(-1),
            ServiceError::AppSecretMissing => Some(-2),
            ServiceError::AccessTokenUnavailable(_) => Some(-3),
            ServiceError::JsTicketUnavailable(_) => Some(-4),
            ServiceError::Remote { code, .. } => Some(*code),
            ServiceError::Store(_) | ServiceError::Transport(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Payload handed to `wx.config` on the page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSignature {
    /// Unix seconds
    pub timestamp: i64,
    pub nonce_str: String,
    pub app_id: String,
    pub signature: String,
}

#[derive(Clone)]
pub struct WechatService {
    config: ConfigAccessor,
    client: WxClient,
}

impl WechatService {
    pub fn new(config: ConfigAccessor, client: WxClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ConfigAccessor {
        &self.config
    }

    /// Drop every cached entry. Storage is untouched.
    pub fn clear_cache(&self) {
        self.config.clear_cache();
        info!("cache cleared, size: {}", self.config.cache().len());
    }

    /// Store appId/appSecret if not already present. Existing values are never overwritten.
    #[instrument(level = "debug", skip_all)]
    pub async fn set_credentials(&self, app_id: &str, app_secret: &str) -> Result<()> {
        let app_id = app_id.trim();
        if !app_id.is_empty() {
            self.config.create_when_not_exist(APP_ID, app_id, 0).await?;
        }
        let app_secret = app_secret.trim();
        if !app_secret.is_empty() {
            self.config
                .create_when_not_exist(APP_SECRET, app_secret, 0)
                .await?;
        }
        Ok(())
    }

    /// Current access_token, fetched from the platform when missing or expired.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_access_token(&self) -> Result<String> {
        if let Some(value) = self
            .config
            .get_config_with_expiry(ACCESS_TOKEN)
            .await?
            .and_then(|e| e.value)
        {
            debug!("access_token hit");
            return Ok(value);
        }

        let app_id = self
            .config
            .get_config(APP_ID)
            .await?
            .and_then(|e| e.non_empty_value().map(str::to_string))
            .ok_or(ServiceError::AppIdMissing)?;
        let app_secret = self
            .config
            .get_config(APP_SECRET)
            .await?
            .and_then(|e| e.non_empty_value().map(str::to_string))
            .ok_or(ServiceError::AppSecretMissing)?;

        debug!("access_token missing or expired; requesting a new one");
        let token = self
            .client
            .get_access_token(&app_id, &app_secret)
            .await
            .map_err(log_remote)?;

        let refresh_time = now_millis() + ACCESS_TOKEN_TTL_MS;
        self.config
            .upsert(ACCESS_TOKEN, &token.access_token, refresh_time)
            .await?;
        Ok(token.access_token)
    }

    /// Current jsapi ticket, fetched from the platform when missing or expired.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_js_ticket(&self) -> Result<String> {
        if let Some(value) = self
            .config
            .get_config_with_expiry(JS_TICKET)
            .await?
            .and_then(|e| e.value)
        {
            debug!("js_ticket hit");
            return Ok(value);
        }

        let access_token = match self.get_access_token().await {
            Ok(t) => t,
            Err(e) if e.code().is_some() => {
                return Err(ServiceError::AccessTokenUnavailable(Box::new(e)));
            }
            Err(e) => return Err(e),
        };

        debug!("js_ticket missing or expired; requesting a new one");
        let ticket = self
            .client
            .get_jsapi_ticket(&access_token)
            .await
            .map_err(log_remote)?;

        let refresh_time = now_millis() + JS_TICKET_TTL_MS;
        self.config
            .upsert(JS_TICKET, &ticket.ticket, refresh_time)
            .await?;
        Ok(ticket.ticket)
    }

    /// Signed `wx.config` payload for the page at `url`.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_web_signature(&self, url: &str) -> Result<WebSignature> {
        let app_id = self
            .config
            .get_config(APP_ID)
            .await?
            .and_then(|e| e.non_empty_value().map(str::to_string))
            .ok_or(ServiceError::AppIdMissing)?;

        let ticket = match self.get_js_ticket().await {
            Ok(t) => t,
            Err(e) if e.code().is_some() => {
                return Err(ServiceError::JsTicketUnavailable(Box::new(e)));
            }
            Err(e) => return Err(e),
        };

        let nonce_str = generate_nonce();
        let timestamp = now_millis() / 1000;
        let signature = jsapi_signature(&ticket, &nonce_str, timestamp, url);

        Ok(WebSignature {
            timestamp,
            nonce_str,
            app_id,
            signature,
        })
    }
}

fn log_remote(e: token::Error) -> ServiceError {
    if let token::Error::Wx { code, message } = &e {
        warn!("{}", errors::explain(*code, message));
    }
    e.into()
}
