//! Official Account errcode helpers
//!
//! Maps the platform `errcode` values this service can run into (token and
//! ticket endpoints) to a category, a short summary and an actionable hint.
//! Used when logging `Remote` failures; program logic keys off `errcode`,
//! never `errmsg`.

/// High-level classification for an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Success,
    /// System busy or transient condition
    TemporarySystem,
    /// appid/appsecret/token problems
    Auth,
    /// Caller IP is not on the whitelist
    Network,
    /// Missing or malformed parameter
    InvalidParam,
    /// Daily quota exhausted
    Limit,
    Unknown,
}

/// A compact, friendly explanation for an errcode.
#[derive(Debug, Clone)]
pub struct ErrorHelp {
    pub code: i64,
    pub category: ErrorCategory,
    pub summary: &'static str,
    pub hint: &'static str,
    /// Whether a fresh access_token is likely to fix the call
    pub refresh_token: bool,
}

pub fn category_for(code: i64) -> ErrorCategory {
    match code {
        0 => ErrorCategory::Success,
        -1 => ErrorCategory::TemporarySystem,
        40001 | 40002 | 40013 | 40125 | 41004 | 42001 | 40014 | 50001 => ErrorCategory::Auth,
        40164 | 61004 => ErrorCategory::Network,
        41001 | 41002 | 40097 => ErrorCategory::InvalidParam,
        45009 | 45011 => ErrorCategory::Limit,
        _ => ErrorCategory::Unknown,
    }
}

fn summary_for(code: i64) -> &'static str {
    match code {
        -1 => "System busy",
        0 => "Success",
        40001 => "Invalid credential or access_token",
        40002 => "Invalid grant_type",
        40013 => "Invalid appid",
        40014 => "Invalid access_token",
        40097 => "Invalid arguments",
        40125 => "Invalid appsecret",
        40164 => "Caller IP not in whitelist",
        41001 => "Missing access_token",
        41002 => "Missing appid",
        41004 => "Missing appsecret",
        42001 => "access_token expired",
        45009 => "Daily API quota reached",
        45011 => "API rate limited",
        50001 => "API not authorized for this account",
        61004 => "Caller IP not allowed",
        _ => "Unknown error",
    }
}

pub fn hint_for(code: i64) -> &'static str {
    match code {
        -1 => "Platform busy; call again later.",
        0 => "Success.",
        40001 | 40014 | 42001 => {
            "Token rejected; clear the cache so the next call fetches a fresh access_token."
        }
        40013 => "Check the appId stored under `appId`; it must be an Official Account appid (wx...).",
        40125 => "Check the appSecret stored under `appSecret`; reset it in the MP admin console if unsure.",
        40164 | 61004 => "Add this server's egress IP to the Official Account IP whitelist.",
        41002 | 41004 => "Set credentials with /wechat/setIdAndSecret before requesting tokens.",
        45009 => "Daily quota exhausted; reset it in the MP console or wait until tomorrow.",
        45011 => "Too many calls; slow down.",
        50001 => "The account is not authorized for this API (JS-SDK needs a verified account).",
        _ => "Unknown code; refer to the official docs and logs for details.",
    }
}

pub fn should_refresh_token(code: i64) -> bool {
    matches!(code, 40001 | 40014 | 42001)
}

pub fn lookup(code: i64) -> ErrorHelp {
    ErrorHelp {
        code,
        category: category_for(code),
        summary: summary_for(code),
        hint: hint_for(code),
        refresh_token: should_refresh_token(code),
    }
}

/// Produce a concise, human-readable explanation string.
pub fn explain(errcode: i64, errmsg: &str) -> String {
    let help = lookup(errcode);
    let mut parts = vec![
        format!("errcode={} ({:?})", help.code, help.category),
        help.summary.to_string(),
        format!("hint: {}", help.hint),
    ];
    if help.refresh_token {
        parts.push("refresh_token: yes".to_string());
    }
    if !errmsg.is_empty() {
        parts.push(format!("errmsg: {}", errmsg));
    }
    parts.join(" | ")
}
