#![doc = r#"
wechat-jssdk

Backend facade for the WeChat Official Account JS-SDK: stores the app
credentials, keeps a fresh `access_token` and `jsapi_ticket`, and signs page
URLs for `wx.config`.

Layers, leaf first:
- store: durable `ConfigEntry` storage (`MemoryStore`, `RedisStore`)
- cache / accessor: in-process read-through cache over the store
- token: HTTP client for the token and ticket endpoints
- service: the refresh core (`WechatService`)
- server: axum routes with the `{code, content}` envelope

Quick usage:

```ignore
use std::sync::Arc;
use wechat_jssdk::{ConfigAccessor, ConfigCache, MemoryStore, WechatService, WxClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let accessor = ConfigAccessor::new(ConfigCache::new(), Arc::new(MemoryStore::new()));
    let service = WechatService::new(accessor, WxClient::default());

    service.set_credentials("your_appid", "your_appsecret").await?;
    let sig = service.get_web_signature("https://example.com/page").await?;
    println!("signature: {}", sig.signature);
    Ok(())
}
```
"#]

pub mod accessor;
pub mod cache;
pub mod config;
pub mod errors;
pub mod model;
pub mod server;
pub mod service;
pub mod signature;
pub mod store;
pub mod token;

pub use accessor::ConfigAccessor;
pub use cache::ConfigCache;
pub use config::{AppConfig, ConfigError};
pub use model::ConfigEntry;
pub use service::{ServiceError, WebSignature, WechatService};
pub use store::{ConfigStore, MemoryStore, RedisStore, StoreError};
pub use token::WxClient;
