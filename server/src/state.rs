//! Shared application state and recipe source construction.

use std::sync::Arc;

use anyhow::{Context, Result};
use chefkoch_core::{CachingClient, ChefkochSource, EntryRegistry, IntegrationConfig, RecipeSource};
use tokio::sync::RwLock;

/// Application state shared across all handlers
pub type AppState = Arc<AppContext>;

pub struct AppContext {
    pub registry: RwLock<EntryRegistry>,
}

impl AppContext {
    pub fn new(registry: EntryRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
        }
    }
}

/// Build the chefkoch.de source for a configuration.
pub fn build_source(config: &IntegrationConfig) -> Result<Arc<dyn RecipeSource>> {
    let client = CachingClient::new().context("Failed to build HTTP client")?;
    let source = match &config.base_url {
        Some(base_url) => ChefkochSource::with_base_url(client, base_url)
            .with_context(|| format!("Invalid base url: {}", base_url))?,
        None => ChefkochSource::new(client),
    };
    Ok(Arc::new(source))
}

/// Load the configuration and set up every entry it names.
pub async fn load_registry() -> Result<EntryRegistry> {
    let config = IntegrationConfig::from_env().context("Failed to load configuration")?;
    let source = build_source(&config)?;

    let mut registry = EntryRegistry::new();
    registry.setup_all(&config, source).await;
    Ok(registry)
}
