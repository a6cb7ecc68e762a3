use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use colloquy::agent::llm::OpenAiClient;
use colloquy::agent::tools::{install_builtins, ToolRegistry};
use colloquy::agent::{AgentConfig, AgentRegistry, AgentService, SessionStore};
use colloquy::cli::Cli;
use colloquy::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut settings = Settings::from_file(&cli.config)?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    info!(
        "Starting colloquy on {}:{}",
        settings.server.host, settings.server.port
    );

    let model = Arc::new(OpenAiClient::new(&settings.model));

    let tools = Arc::new(install_builtins(ToolRegistry::builder()).build());
    info!("Registered {} tools", tools.len());

    let agents = Arc::new(AgentRegistry::new());
    for config in &settings.agents {
        agents.register(config.clone()).await?;
    }
    if agents.len().await == 0 {
        agents.register(AgentConfig::default_assistant()).await?;
    }
    info!("Registered {} agents", agents.len().await);

    let sessions = Arc::new(SessionStore::new());
    let service = Arc::new(AgentService::new(agents, sessions, tools, model));

    let app = colloquy::create_app(service);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
