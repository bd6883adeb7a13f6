use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use insights_core::{ReportPipeline, Settings};
use insights_gateway::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging Setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Insights Gateway Initializing...");

    // 2. Settings. A missing OPENAI_API_KEY stops us here, before binding.
    let settings = Settings::from_env().context("Failed to load settings")?;

    // 3. Build both chains once
    let pipeline =
        ReportPipeline::from_settings(&settings).context("Failed to build report pipeline")?;
    let state = AppState::new(pipeline);

    // 4. Routes
    let app = router(state);

    // 5. Start Server
    let address = Settings::bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Gateway listening on {}...", address);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
