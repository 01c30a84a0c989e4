use std::sync::Arc;

use anyhow::{Context, Result};
use cuaca_core::Config;
use cuaca_keyserver::{routes, KeyState, KEY_ROUTE};

#[tokio::main]
async fn main() -> Result<()> {
    cuaca_core::init()?;

    let (config, _) = Config::load_validated()?;
    let state = KeyState::new(config.weather.resolved_api_key());
    if !state.has_key() {
        tracing::warn!(
            "No API key configured; {} will answer 500 until {} is set",
            KEY_ROUTE,
            cuaca_core::API_KEY_ENV
        );
    }

    let app = routes(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&config.keyserver.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.keyserver.bind_address))?;
    tracing::info!("Key server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down key server");
        })
        .await?;

    Ok(())
}
