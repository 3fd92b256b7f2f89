use std::sync::Arc;

use anyhow::Context;

use elearn_api::app::{build_app, AppServices};
use elearn_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    elearn_observability::init();

    // Missing signing secrets are fatal.
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");

    let bind_addr = config.bind_addr.clone();
    let services = AppServices::from_config(config)
        .await
        .context("failed to initialize session store")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
