use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wechat_jssdk::server::{AppState, router};
use wechat_jssdk::{
    AppConfig, ConfigAccessor, ConfigCache, ConfigStore, MemoryStore, RedisStore, WechatService,
    WxClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env for local dev
    let _ = dotenv();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = AppConfig::from_env()?;

    let store: Arc<dyn ConfigStore> = match &config.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .context("connecting to redis")?
                .with_namespace(config.redis_prefix.clone());
            info!("using redis store, namespace={}", config.redis_prefix);
            Arc::new(store)
        }
        None => {
            warn!("REDIS_URL not set; credentials and tokens are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let client = WxClient::new(&config.api_base, config.http_timeout)?;
    let service = WechatService::new(ConfigAccessor::new(ConfigCache::new(), store), client);

    if let (Some(app_id), Some(app_secret)) = (&config.app_id, &config.app_secret) {
        service
            .set_credentials(app_id, app_secret)
            .await
            .context("storing startup credentials")?;
        info!("startup credentials applied (existing values are kept)");
    }

    let app = router(AppState {
        service,
        auth_token: Arc::from(config.auth_token.as_str()),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
