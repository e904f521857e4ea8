use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use llama_agent_server::agent::build_agent;
use llama_agent_server::config::Settings;
use llama_agent_server::handlers::build_router;
use llama_agent_server::logging;
use llama_agent_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    logging::init(&settings.logging);
    info!("🚀 Starting Llama Agent Server...");
    info!("✅ Configuration loaded");

    let agent = build_agent(&settings)?;
    info!("✅ Agent ready with routes {:?}", agent.router().routes());

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let app = build_router(AppState::new(agent, settings));

    info!("🎯 Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
