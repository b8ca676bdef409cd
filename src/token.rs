//! WeChat Official Account HTTP client.
//!
//! Wraps the two platform endpoints the service needs:
//! - access_token: GET {base}/cgi-bin/token?grant_type=client_credential&appid=APPID&secret=APPSECRET
//! - jsapi_ticket: GET {base}/cgi-bin/ticket/getticket?access_token=ACCESS_TOKEN&type=jsapi
//!
//! `WxClient` does no caching; persistence and refresh live in `WechatService`.
//! Platform errors surface as `Error::Wx` carrying the raw `errcode`.
//!
//! Example:
//! ```ignore
//! use wechat_jssdk::WxClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = WxClient::default();
//!     let token = client.get_access_token("your_appid", "your_appsecret").await?;
//!     let ticket = client.get_jsapi_ticket(&token.access_token).await?;
//!     println!("ticket expires in {}s", ticket.expires_in);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";

/// Successful access_token response
#[derive(Clone, Debug, Deserialize)]
pub struct AccessToken {
    /// Access token string
    pub access_token: String,
    /// Expiration in seconds
    #[serde(default)]
    pub expires_in: u32,
}

/// Successful jsapi_ticket response
#[derive(Clone, Debug)]
pub struct JsapiTicket {
    pub ticket: String,
    /// Expiration in seconds
    pub expires_in: u32,
}

/// WeChat API error response
#[derive(Clone, Debug, Deserialize)]
pub struct WxError {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
}

/// Raw token response. Any body carrying `errcode` is an error.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum TokenRawResp {
    Err(WxError),
    Ok(AccessToken),
}

/// Raw ticket response. Success also reports `errcode: 0`.
#[derive(Clone, Debug, Deserialize)]
struct TicketRawResp {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    ticket: Option<String>,
    #[serde(default)]
    expires_in: u32,
}

/// Unified error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("weixin error {code}: {message}")]
    Wx { code: i64, message: String },

    #[error("unexpected response (status {status}): {error}; body: {body}")]
    UnexpectedResponse {
        status: u16,
        error: String,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// HTTP client for the Official Account platform
///
/// - Wraps `reqwest::Client`
/// - The API base is configurable so tests can point it at a mock server
#[derive(Clone, Debug)]
pub struct WxClient {
    http: reqwest::Client,
    base: Url,
}

impl Default for WxClient {
    fn default() -> Self {
        let http = reqwest::Client::builder()
            .gzip(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base: parse_base(DEFAULT_API_BASE).expect("default api base is a valid url"),
        }
    }
}

impl WxClient {
    /// Client with a request timeout and API base.
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Self::with_http(http, base)
    }

    /// Use a custom `reqwest::Client`
    pub fn with_http(http: reqwest::Client, base: &str) -> Result<Self> {
        let base = parse_base(base)?;
        Ok(Self { http, base })
    }

    /// `path` is relative to the API base, e.g. `cgi-bin/token`.
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Fetch access_token with appid + appsecret (secrets are never logged)
    #[instrument(level = "debug", skip(self, appid, secret))]
    pub async fn get_access_token(&self, appid: &str, secret: &str) -> Result<AccessToken> {
        let mut url = self.endpoint("cgi-bin/token")?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("grant_type", "client_credential");
            qp.append_pair("appid", appid);
            qp.append_pair("secret", secret);
        }
        if appid.starts_with("ww") {
            warn!(
                "Detected appid starting with 'ww' (likely a WeCom corpid). The JS-SDK needs an Official Account appid (starts with 'wx')."
            );
        }
        debug!(
            "Requesting Official Account access_token, appid hint: {}",
            redact_id(appid)
        );

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        match serde_json::from_slice::<TokenRawResp>(&bytes) {
            Ok(TokenRawResp::Ok(ok)) => Ok(ok),
            Ok(TokenRawResp::Err(err)) => Err(Error::Wx {
                code: err.errcode,
                message: err.errmsg,
            }),
            Err(de_err) => Err(unexpected(status.as_u16(), de_err, &bytes)),
        }
    }

    /// Fetch a jsapi ticket for the JS-SDK
    #[instrument(level = "debug", skip(self, access_token))]
    pub async fn get_jsapi_ticket(&self, access_token: &str) -> Result<JsapiTicket> {
        let mut url = self.endpoint("cgi-bin/ticket/getticket")?;
        url.query_pairs_mut()
            .append_pair("access_token", access_token)
            .append_pair("type", "jsapi");
        debug!("Requesting jsapi_ticket");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        let raw = serde_json::from_slice::<TicketRawResp>(&bytes)
            .map_err(|de_err| unexpected(status.as_u16(), de_err, &bytes))?;
        if raw.errcode != 0 {
            return Err(Error::Wx {
                code: raw.errcode,
                message: raw.errmsg,
            });
        }
        match raw.ticket {
            Some(ticket) => Ok(JsapiTicket {
                ticket,
                expires_in: raw.expires_in,
            }),
            None => Err(Error::UnexpectedResponse {
                status: status.as_u16(),
                error: "missing field `ticket`".into(),
                body: redacted_body(&bytes),
            }),
        }
    }
}

/// Parse the API base so relative joins keep any path prefix (a trailing `/` is ensured).
fn parse_base(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn unexpected(status: u16, de_err: serde_json::Error, bytes: &[u8]) -> Error {
    Error::UnexpectedResponse {
        status,
        error: de_err.to_string(),
        body: redacted_body(bytes),
    }
}

/// Redact credentials and truncate a response body for error messages
fn redacted_body(bytes: &[u8]) -> String {
    let mut body = String::from_utf8_lossy(bytes).to_string();
    if let Ok(mut v) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(obj) = v.as_object_mut() {
            for field in ["access_token", "ticket"] {
                if obj.contains_key(field) {
                    obj.insert(
                        field.to_string(),
                        serde_json::Value::String("[redacted]".into()),
                    );
                }
            }
        }
        if let Ok(s) = serde_json::to_string(&v) {
            body = s;
        }
    }
    if body.len() > 2048 {
        let mut cut = 2048;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

/// Redact an ID for logs: keep first 2 and last 2 chars where possible
pub(crate) fn redact_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 4 {
        format!("{}***", id)
    } else {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{}***{}", head, tail)
    }
}
