use std::env;

use anyhow::Result;
use relay_agents::AssistantConfig;
use relay_api::build_app;
use relay_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("relay_api");

    let config = AssistantConfig::from_env();
    let bind = env::var("RELAY_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "relay assistant api started");

    axum::serve(listener, app).await?;
    Ok(())
}
