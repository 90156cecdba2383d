use anyhow::{Context, Result};
use chefkoch_core::{extract_attributes, RecipeSource};
use std::path::PathBuf;

use crate::refresh::{build_source, load_config};

/// Fetch one recipe page and print its attributes as JSON.
pub async fn recipe(
    url: &str,
    config_path: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<()> {
    let config = load_config(config_path, base_url)?;
    let source = build_source(&config)?;

    let detail = source
        .fetch_recipe_detail(url)
        .await
        .with_context(|| format!("Failed to load recipe {}", url))?;

    let attributes = extract_attributes(&detail);
    println!("{}", serde_json::to_string_pretty(&attributes)?);
    Ok(())
}
