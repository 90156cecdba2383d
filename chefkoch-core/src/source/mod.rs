//! Recipe sources.
//!
//! A [`RecipeSource`] resolves sensor requests into recipe urls and loads
//! recipe detail pages. [`ChefkochSource`] talks to chefkoch.de through an
//! injected [`HttpClient`](crate::http::HttpClient); [`FakeSource`] is an
//! in-memory stand-in for tests.

mod chefkoch;
mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::extract::RecipeDetail;
use crate::types::{RecipeLink, SearchParams};

pub use chefkoch::{ChefkochSource, DEFAULT_BASE_URL};
pub use fake::{FakeSource, SourceCall};

/// Category of the "what do I cook today" list.
pub const CATEGORY_COOKING: &str = "kochen";
/// Category of the "what do I bake today" list.
pub const CATEGORY_BAKING: &str = "backen";

#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// One arbitrary recipe, if the site returned one.
    async fn random_recipe(&self) -> Result<Option<RecipeLink>, SourceError>;

    /// The day's recommended recipes for a category.
    async fn recipes_by_category(&self, category: &str) -> Result<Vec<RecipeLink>, SourceError>;

    /// Recipes matching a query. `filters` never contains blank entries.
    async fn search_recipes(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RecipeLink>, SourceError>;

    /// Load and parse a recipe detail page.
    async fn fetch_recipe_detail(&self, url: &str) -> Result<RecipeDetail, SourceError>;
}

/// Search filters with every blank entry removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub properties: Vec<String>,
    pub health: Vec<String>,
    pub categories: Vec<String>,
    pub countries: Vec<String>,
    pub meal_type: Vec<String>,
    pub prep_time: Option<String>,
    pub rating: Option<String>,
    pub sort: Option<String>,
}

impl SearchFilters {
    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            properties: non_blank(&params.properties),
            health: non_blank(&params.health),
            categories: non_blank(&params.categories),
            countries: non_blank(&params.countries),
            meal_type: non_blank(&params.meal_type),
            prep_time: non_blank_opt(&params.prep_time),
            rating: non_blank_opt(&params.rating),
            sort: non_blank_opt(&params.sort),
        }
    }

    pub fn health(mut self, values: &[&str]) -> Self {
        self.health = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    /// Filters as (name, value) pairs, one per value, in a fixed order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let lists: [(&'static str, &Vec<String>); 5] = [
            ("properties", &self.properties),
            ("health", &self.health),
            ("categories", &self.categories),
            ("countries", &self.countries),
            ("meal_type", &self.meal_type),
        ];
        let scalars: [(&'static str, &Option<String>); 3] = [
            ("prep_time", &self.prep_time),
            ("rating", &self.rating),
            ("sort", &self.sort),
        ];

        let mut pairs = Vec::new();
        for (name, values) in lists {
            pairs.extend(values.iter().map(|v| (name, v.as_str())));
        }
        for (name, value) in scalars {
            if let Some(value) = value {
                pairs.push((name, value.as_str()));
            }
        }
        pairs
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

fn non_blank_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
