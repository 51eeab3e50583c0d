//! `deckhand generate`: Run one generation and print the result.

use deckhand_core::event::EventBus;
use deckhand_core::gateway::{PresentationGateway, SharingGateway};
use deckhand_google::{GoogleDriveGateway, GoogleSlidesGateway};
use deckhand_tools::{InMemoryPresentations, InMemorySharing};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn run(
    config_path: Option<PathBuf>,
    prompt: &str,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err("--prompt must not be empty".into());
    }

    let config = super::load_config(&super::config_path(config_path))?;

    let slides: Arc<dyn PresentationGateway>;
    let sharing: Arc<dyn SharingGateway>;
    if dry_run {
        info!("Dry run: the deck stays in memory");
        slides = Arc::new(InMemoryPresentations::new());
        sharing = Arc::new(InMemorySharing::new());
    } else {
        slides = Arc::new(GoogleSlidesGateway::from_config(&config)?);
        sharing = Arc::new(GoogleDriveGateway::from_config(&config)?);
    }

    let agent =
        deckhand_gateway::build_agent(&config, slides, sharing, Arc::new(EventBus::default()))?;
    let output = agent.run(prompt).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
