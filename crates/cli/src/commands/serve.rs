//! `deckhand serve`: Start the HTTP API server.

use std::path::PathBuf;

pub async fn run(
    config_path: Option<PathBuf>,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(&super::config_path(config_path))?;

    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(host) = host_override {
        config.server.host = host;
    }

    println!("Deckhand Gateway");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   Model:     {}", config.agent.model);
    for missing in config.missing_credentials() {
        println!("   Warning:   {missing}");
    }

    deckhand_gateway::start(config).await?;

    Ok(())
}
