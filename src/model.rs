//! Stored configuration entries.
//!
//! Every credential the service knows about is a `ConfigEntry`: a key, an
//! optional value and a refresh instant in epoch milliseconds. A
//! `refresh_time` of `0` marks an entry that never expires (the app
//! credentials); anything else is the instant at which the value stops being
//! usable.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Key of the Official Account appid.
pub const APP_ID: &str = "appId";
/// Key of the Official Account appsecret.
pub const APP_SECRET: &str = "appSecret";
/// Key of the cached access_token.
pub const ACCESS_TOKEN: &str = "access_token";
/// Key of the cached jsapi_ticket.
pub const JS_TICKET: &str = "js_ticket";

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// One named configuration value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: Option<String>,
    /// Epoch milliseconds; `0` means "does not expire"
    #[serde(default)]
    pub refresh_time: i64,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: Option<String>, refresh_time: i64) -> Self {
        Self {
            key: key.into(),
            value,
            refresh_time,
        }
    }

    /// The value, if present and non-empty.
    pub fn non_empty_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    /// Whether the entry holds a value and `now_ms` is strictly before its refresh time.
    ///
    /// Entries with `refresh_time == 0` are never valid here.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.value.is_some() && now_ms < self.refresh_time
    }
}
