use anyhow::{Context, Result};
use chefkoch_core::{
    Aggregator, CachingClient, ChefkochSource, Coordinator, IntegrationConfig, RecipeSource,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Load the config file. A `--base-url` given on the command line wins over
/// the file's `base_url`.
pub fn load_config(
    config_path: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<IntegrationConfig> {
    let path = config_path.unwrap_or_else(IntegrationConfig::default_path);
    let mut config = IntegrationConfig::load(&path)?;
    if base_url.is_some() {
        config.base_url = base_url;
    }
    Ok(config)
}

pub fn build_source(config: &IntegrationConfig) -> Result<Arc<dyn RecipeSource>> {
    let client = CachingClient::new().context("Failed to build HTTP client")?;
    let source: Arc<dyn RecipeSource> = match &config.base_url {
        Some(base_url) => Arc::new(
            ChefkochSource::with_base_url(client, base_url)
                .with_context(|| format!("Invalid base url: {}", base_url))?,
        ),
        None => Arc::new(ChefkochSource::new(client)),
    };
    Ok(source)
}

/// Run one refresh cycle per configured entry. Prints `{entry id: state}`.
pub async fn refresh(config_path: Option<PathBuf>, base_url: Option<String>) -> Result<()> {
    let config = load_config(config_path, base_url)?;
    let source = build_source(&config)?;

    let mut states = BTreeMap::new();
    for entry in &config.entries {
        let coordinator = Coordinator::new(
            &entry.id,
            entry.sensors.clone(),
            Aggregator::new(source.clone()),
            entry.update_interval(),
        );
        if let Err(e) = coordinator.refresh().await {
            tracing::error!(entry = %entry.id, error = %e, "refresh failed");
        }
        states.insert(entry.id.clone(), coordinator.state().as_ref().clone());
    }

    println!("{}", serde_json::to_string_pretty(&states)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn base_url_flag_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"base_url": "http://localhost:8080", "entries": [{"id": "kitchen"}]}"#,
        )
        .unwrap();

        let from_file = load_config(Some(path.clone()), None).unwrap();
        assert_eq!(from_file.base_url.as_deref(), Some("http://localhost:8080"));

        let overridden =
            load_config(Some(path), Some("http://mirror.local/".to_string())).unwrap();
        assert_eq!(overridden.base_url.as_deref(), Some("http://mirror.local/"));
        assert_eq!(overridden.entries[0].id, "kitchen");
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let config = IntegrationConfig {
            base_url: Some("not a url".to_string()),
            entries: Vec::new(),
        };
        let err = build_source(&config).err().unwrap();
        assert!(err.to_string().contains("Invalid base url: not a url"));
    }
}
