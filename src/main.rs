//! Insolvency Extractor - vision-model extraction server for insolvency documents.

use std::sync::Arc;

use insolvency_extractor::api::{self, AppState};
use insolvency_extractor::config::Settings;
use insolvency_extractor::extractor::Extractor;
use insolvency_extractor::vision::{ChatVisionClient, VisionModel};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "insolvency_extractor=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    let system_prompt = settings.system_prompt()?;

    let client = ChatVisionClient::from_settings(&settings)?;
    info!("Vision client initialized: model={}", client.name());

    let state = AppState {
        extractor: Extractor::new(Arc::new(client), system_prompt),
    };
    let app = api::router(state, settings.body_limit_mb);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr.as_str()).await?;
    info!("Server listening on http://{}", settings.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
