use anyhow::{Context, Result};
use chefkoch_core::{extract_attributes, RecipeAttributes, RecipeDetail};
use std::fs;
use std::path::Path;

/// Parse a recipe from an HTML file.
/// Outputs JSON to stdout (either the attributes on success or an error message on failure).
pub fn parse_html(file: &Path, source_url: &str) -> Result<()> {
    let html = fs::read_to_string(file)
        .with_context(|| format!("Failed to read HTML file: {}", file.display()))?;

    match attributes_from_html(&html, source_url) {
        Ok(attributes) => {
            println!("{}", serde_json::to_string_pretty(&attributes)?);
            Ok(())
        }
        Err(e) => {
            let error_json = serde_json::json!({
                "error": e.to_string()
            });
            println!("{}", serde_json::to_string_pretty(&error_json)?);
            // Return error so exit code is non-zero
            Err(anyhow::anyhow!("Failed to extract recipe: {}", e))
        }
    }
}

fn attributes_from_html(html: &str, source_url: &str) -> Result<RecipeAttributes> {
    let detail = RecipeDetail::parse(html, source_url)?;
    Ok(extract_attributes(&detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extracts_saved_page() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type": "Recipe", "name": "Käsespätzle", "recipeYield": "4", "recipeIngredient": ["400 g Mehl"]}
        </script></head></html>"#;

        let attributes =
            attributes_from_html(html, "https://www.chefkoch.de/rezepte/1/K.html").unwrap();

        assert_eq!(attributes.title, "Käsespätzle");
        assert_eq!(attributes.servings, 4);
        assert_eq!(attributes.ingredients, vec!["400 g Mehl".to_string()]);
    }

    #[test]
    fn page_without_recipe_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("empty.html");
        fs::write(&file, "<html><body>nothing</body></html>").unwrap();

        assert!(parse_html(&file, "https://www.chefkoch.de/").is_err());
    }
}
