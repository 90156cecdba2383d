//! Fake recipe source for testing.
//!
//! Serves canned urls and Recipe JSON-LD nodes from memory and records every
//! call, so tests can assert on what the aggregator asked for.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{RecipeSource, SearchFilters};
use crate::error::SourceError;
use crate::extract::RecipeDetail;
use crate::types::RecipeLink;

/// One call made against a [`FakeSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Random,
    Category(String),
    Search { query: String, filters: SearchFilters },
    Detail(String),
}

#[derive(Debug, Clone)]
enum FakeDetail {
    Recipe(Value),
    Error(String),
    Panic,
}

/// In-memory [`RecipeSource`].
///
/// Unregistered lookups return nothing: no random recipe, empty lists, and
/// an error for detail pages.
#[derive(Debug, Default)]
pub struct FakeSource {
    random: Option<Result<String, String>>,
    categories: HashMap<String, Result<Vec<String>, String>>,
    searches: HashMap<String, Result<Vec<String>, String>>,
    details: HashMap<String, FakeDetail>,
    delay: Option<Duration>,
    calls: Mutex<Vec<SourceCall>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_random(mut self, url: &str) -> Self {
        self.random = Some(Ok(url.to_string()));
        self
    }

    pub fn with_random_error(mut self, message: &str) -> Self {
        self.random = Some(Err(message.to_string()));
        self
    }

    pub fn with_category(mut self, category: &str, urls: &[&str]) -> Self {
        self.categories
            .insert(category.to_string(), Ok(to_strings(urls)));
        self
    }

    pub fn with_category_error(mut self, category: &str, message: &str) -> Self {
        self.categories
            .insert(category.to_string(), Err(message.to_string()));
        self
    }

    /// Results for a search query, whatever the filters.
    pub fn with_search(mut self, query: &str, urls: &[&str]) -> Self {
        self.searches.insert(query.to_string(), Ok(to_strings(urls)));
        self
    }

    pub fn with_search_error(mut self, query: &str, message: &str) -> Self {
        self.searches
            .insert(query.to_string(), Err(message.to_string()));
        self
    }

    /// Register the Recipe JSON-LD node served for a detail url.
    pub fn with_recipe(mut self, url: &str, recipe: Value) -> Self {
        self.details
            .insert(url.to_string(), FakeDetail::Recipe(recipe));
        self
    }

    pub fn with_detail_error(mut self, url: &str, message: &str) -> Self {
        self.details
            .insert(url.to_string(), FakeDetail::Error(message.to_string()));
        self
    }

    /// Panic while loading this detail url.
    pub fn with_detail_panic(mut self, url: &str) -> Self {
        self.details.insert(url.to_string(), FakeDetail::Panic);
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls made so far, in arrival order.
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: SourceCall) {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn to_strings(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

fn to_links(result: Option<&Result<Vec<String>, String>>) -> Result<Vec<RecipeLink>, SourceError> {
    match result {
        None => Ok(Vec::new()),
        Some(Ok(urls)) => Ok(urls.iter().map(|u| RecipeLink::new(u)).collect()),
        Some(Err(message)) => Err(SourceError::Other(message.clone())),
    }
}

#[async_trait]
impl RecipeSource for FakeSource {
    async fn random_recipe(&self) -> Result<Option<RecipeLink>, SourceError> {
        self.record(SourceCall::Random).await;
        match &self.random {
            None => Ok(None),
            Some(Ok(url)) => Ok(Some(RecipeLink::new(url))),
            Some(Err(message)) => Err(SourceError::Other(message.clone())),
        }
    }

    async fn recipes_by_category(&self, category: &str) -> Result<Vec<RecipeLink>, SourceError> {
        self.record(SourceCall::Category(category.to_string()))
            .await;
        to_links(self.categories.get(category))
    }

    async fn search_recipes(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RecipeLink>, SourceError> {
        self.record(SourceCall::Search {
            query: query.to_string(),
            filters: filters.clone(),
        })
        .await;
        to_links(self.searches.get(query))
    }

    async fn fetch_recipe_detail(&self, url: &str) -> Result<RecipeDetail, SourceError> {
        self.record(SourceCall::Detail(url.to_string())).await;
        match self.details.get(url) {
            Some(FakeDetail::Recipe(recipe)) => Ok(RecipeDetail::from_json_ld(url, recipe.clone())),
            Some(FakeDetail::Error(message)) => Err(SourceError::Other(message.clone())),
            Some(FakeDetail::Panic) => panic!("fake source panicked loading {}", url),
            None => Err(SourceError::Other(format!("no fake detail for {}", url))),
        }
    }
}
