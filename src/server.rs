//! HTTP transport.
//!
//! Every `/wechat/*` route answers HTTP 200 with a JSON envelope:
//!
//! ```text
//! {"code": 200, "content": <result>}          success
//! {"code": 500, "content": <message|object>}  failure
//! ```
//!
//! Routes:
//! - GET /wechat/clearCache
//! - GET /wechat/setIdAndSecret?appId=..&appSecret=..
//! - GET /wechat/getAccessToken
//! - GET /wechat/getJSTicket
//! - GET /wechat/getWebSign?url=..
//! - GET /wechat/verify?signature=..&timestamp=..&nonce=..&echostr=..  (server URL handshake)
//! - GET /health

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::service::{ServiceError, WechatService};
use crate::signature::verify_url_signature;

/// Response envelope `{code, content}`
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: u16,
    pub content: Value,
}

impl Envelope {
    pub fn success(content: impl Into<Value>) -> Self {
        Self {
            code: 200,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<Value>) -> Self {
        Self {
            code: 500,
            content: content.into(),
        }
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub service: WechatService,
    /// Token configured for the server URL handshake
    pub auth_token: Arc<str>,
}

#[derive(Debug, Deserialize)]
struct CredentialsQuery {
    #[serde(rename = "appId", default)]
    app_id: String,
    #[serde(rename = "appSecret", default)]
    app_secret: String,
}

#[derive(Debug, Deserialize)]
struct WebSignQuery {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct VerifyQuery {
    #[serde(default)]
    signature: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    nonce: String,
    #[serde(default)]
    echostr: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/wechat/clearCache", get(clear_cache))
        .route("/wechat/setIdAndSecret", get(set_id_and_secret))
        .route("/wechat/getAccessToken", get(get_access_token))
        .route("/wechat/getJSTicket", get(get_js_ticket))
        .route("/wechat/getWebSign", get(get_web_sign))
        .route("/wechat/verify", get(verify))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn clear_cache(State(state): State<AppState>) -> Json<Envelope> {
    state.service.clear_cache();
    Json(Envelope::success("success"))
}

async fn set_id_and_secret(
    State(state): State<AppState>,
    Query(q): Query<CredentialsQuery>,
) -> Json<Envelope> {
    match state.service.set_credentials(&q.app_id, &q.app_secret).await {
        Ok(()) => Json(Envelope::success("success")),
        Err(e) => {
            error!("setIdAndSecret failed: {e}");
            Json(Envelope::error("server error"))
        }
    }
}

fn wechat_error(code: i64) -> Value {
    json!({"msg": "wechat error", "result": code})
}

async fn get_access_token(State(state): State<AppState>) -> Json<Envelope> {
    let envelope = match state.service.get_access_token().await {
        Ok(token) => Envelope::success(token),
        Err(ServiceError::AppIdMissing) => Envelope::error("not set appId"),
        Err(ServiceError::AppSecretMissing) => Envelope::error("not set appSecret"),
        Err(ServiceError::Remote { code, .. }) => Envelope::error(wechat_error(code)),
        Err(e) => {
            error!("getAccessToken failed: {e}");
            Envelope::error("server error")
        }
    };
    Json(envelope)
}

async fn get_js_ticket(State(state): State<AppState>) -> Json<Envelope> {
    let envelope = match state.service.get_js_ticket().await {
        Ok(ticket) => Envelope::success(ticket),
        Err(ServiceError::AccessTokenUnavailable(cause)) => {
            warn!("getJSTicket: {cause}");
            Envelope::error("access_token get error!")
        }
        Err(ServiceError::Remote { code, .. }) => Envelope::error(wechat_error(code)),
        Err(e) => {
            error!("getJSTicket failed: {e}");
            Envelope::error("server error")
        }
    };
    Json(envelope)
}

async fn get_web_sign(
    State(state): State<AppState>,
    Query(q): Query<WebSignQuery>,
) -> Json<Envelope> {
    let envelope = match state.service.get_web_signature(&q.url).await {
        Ok(sig) => match serde_json::to_value(&sig) {
            Ok(v) => Envelope::success(v),
            Err(e) => {
                error!("getWebSign serialize failed: {e}");
                Envelope::error("server error")
            }
        },
        Err(ServiceError::AppIdMissing) => Envelope::error("not set appId"),
        Err(ServiceError::JsTicketUnavailable(cause)) => {
            warn!("getWebSign: {cause}");
            Envelope::error("get js_ticket error")
        }
        Err(e) => {
            error!("getWebSign failed: {e}");
            Envelope::error("server error")
        }
    };
    Json(envelope)
}

/// Server URL handshake: echo `echostr` back when the signature matches.
async fn verify(
    State(state): State<AppState>,
    Query(q): Query<VerifyQuery>,
) -> axum::response::Response {
    if verify_url_signature(&state.auth_token, &q.timestamp, &q.nonce, &q.signature) {
        info!("URL verification ok");
        q.echostr.into_response()
    } else {
        warn!("URL verification failed");
        (StatusCode::BAD_REQUEST, "invalid signature").into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::accessor::ConfigAccessor;
    use crate::cache::ConfigCache;
    use crate::signature::sha1_signature;
    use crate::store::MemoryStore;
    use crate::token::WxClient;

    fn app(server: &MockServer) -> Router {
        let accessor = ConfigAccessor::new(ConfigCache::new(), Arc::new(MemoryStore::new()));
        let client = WxClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        router(AppState {
            service: WechatService::new(accessor, client),
            auth_token: Arc::from("123abc"),
        })
    }

    async fn call(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn call_json(app: &Router, uri: &str) -> Value {
        let (status, body) = call(app, uri).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn token_route_reports_missing_credentials() {
        let server = MockServer::start().await;
        let app = app(&server);

        let v = call_json(&app, "/wechat/getAccessToken").await;
        assert_eq!(v, json!({"code": 500, "content": "not set appId"}));

        call_json(&app, "/wechat/setIdAndSecret?appId=wx-app").await;
        let v = call_json(&app, "/wechat/getAccessToken").await;
        assert_eq!(v, json!({"code": 500, "content": "not set appSecret"}));

        let v = call_json(&app, "/wechat/getJSTicket").await;
        assert_eq!(v, json!({"code": 500, "content": "access_token get error!"}));

        let v = call_json(&app, "/wechat/getWebSign?url=https%3A%2F%2Fexample.com%2F").await;
        assert_eq!(v, json!({"code": 500, "content": "get js_ticket error"}));
    }

    #[tokio::test]
    async fn web_sign_without_app_id() {
        let server = MockServer::start().await;
        let app = app(&server);
        let v = call_json(&app, "/wechat/getWebSign?url=x").await;
        assert_eq!(v, json!({"code": 500, "content": "not set appId"}));
    }

    #[tokio::test]
    async fn full_flow_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "T", "expires_in": 7200})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/ticket/getticket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"errcode": 0, "errmsg": "ok", "ticket": "TICKET", "expires_in": 7200}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        let app = app(&server);

        let v = call_json(&app, "/wechat/setIdAndSecret?appId=wx-app&appSecret=s").await;
        assert_eq!(v, json!({"code": 200, "content": "success"}));

        let v = call_json(&app, "/wechat/getAccessToken").await;
        assert_eq!(v, json!({"code": 200, "content": "T"}));

        let v = call_json(&app, "/wechat/getJSTicket").await;
        assert_eq!(v, json!({"code": 200, "content": "TICKET"}));

        let v = call_json(&app, "/wechat/getWebSign?url=https%3A%2F%2Fexample.com%2Fa").await;
        assert_eq!(v["code"], 200);
        assert_eq!(v["content"]["appId"], "wx-app");
        let nonce = v["content"]["nonceStr"].as_str().unwrap();
        let ts = v["content"]["timestamp"].as_i64().unwrap();
        assert_eq!(
            v["content"]["signature"],
            crate::signature::jsapi_signature("TICKET", nonce, ts, "https://example.com/a")
        );

        let v = call_json(&app, "/wechat/clearCache").await;
        assert_eq!(v, json!({"code": 200, "content": "success"}));
        // served from the store after the clear; no new remote calls
        let v = call_json(&app, "/wechat/getJSTicket").await;
        assert_eq!(v, json!({"code": 200, "content": "TICKET"}));
    }

    #[tokio::test]
    async fn platform_errcode_in_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errcode": 40164, "errmsg": "invalid ip"})),
            )
            .mount(&server)
            .await;
        let app = app(&server);
        call_json(&app, "/wechat/setIdAndSecret?appId=wx-app&appSecret=s").await;

        let v = call_json(&app, "/wechat/getAccessToken").await;
        assert_eq!(
            v,
            json!({"code": 500, "content": {"msg": "wechat error", "result": 40164}})
        );
    }

    #[tokio::test]
    async fn web_sign_reports_platform_ticket_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "T", "expires_in": 7200})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/ticket/getticket"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errcode": 40001, "errmsg": "invalid credential"})),
            )
            .mount(&server)
            .await;
        let app = app(&server);
        call_json(&app, "/wechat/setIdAndSecret?appId=wx-app&appSecret=s").await;

        let v = call_json(&app, "/wechat/getWebSign?url=https%3A%2F%2Fexample.com%2F").await;
        assert_eq!(v, json!({"code": 500, "content": "get js_ticket error"}));

        let v = call_json(&app, "/wechat/getJSTicket").await;
        assert_eq!(
            v,
            json!({"code": 500, "content": {"msg": "wechat error", "result": 40001}})
        );
    }

    #[tokio::test]
    async fn handshake_echoes_on_valid_signature() {
        let server = MockServer::start().await;
        let app = app(&server);
        let sig = sha1_signature(&["123abc", "1700000000", "n0nce"]);

        let uri = format!(
            "/wechat/verify?signature={sig}&timestamp=1700000000&nonce=n0nce&echostr=hello"
        );
        let (status, body) = call(&app, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hello");

        let (status, _) = call(
            &app,
            "/wechat/verify?signature=deadbeef&timestamp=1700000000&nonce=n0nce&echostr=hello",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let server = MockServer::start().await;
        let app = app(&server);
        let (status, body) = call(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "ok");
    }
}
