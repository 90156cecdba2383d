//! chefkoch.de recipe source.

use async_trait::async_trait;
use url::Url;

use super::{RecipeSource, SearchFilters, CATEGORY_BAKING, CATEGORY_COOKING};
use crate::error::{FetchError, SourceError};
use crate::extract::{extract_canonical_url, extract_recipe_links, is_recipe_url, RecipeDetail};
use crate::http::HttpClient;
use crate::types::RecipeLink;

pub const DEFAULT_BASE_URL: &str = "https://www.chefkoch.de";

const RANDOM_PATH: &str = "rezepte/zufallsrezept/";
const COOKING_PATH: &str = "rezepte/was-koche-ich-heute/";
const BAKING_PATH: &str = "rezepte/was-backe-ich-heute/";

/// Scrapes chefkoch.de.
///
/// Page parsing runs on tokio's blocking pool so a refresh cycle never
/// stalls the scheduler while the DOM is built.
pub struct ChefkochSource<C: HttpClient> {
    client: C,
    base_url: Url,
}

impl<C: HttpClient> ChefkochSource<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("Invalid default base url"),
        }
    }

    /// Use a different site root (mirrors, tests).
    pub fn with_base_url(client: C, base_url: &str) -> Result<Self, SourceError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn page_url(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()).into())
    }

    fn category_url(&self, category: &str) -> Result<Url, SourceError> {
        match category {
            CATEGORY_COOKING => self.page_url(COOKING_PATH),
            CATEGORY_BAKING => self.page_url(BAKING_PATH),
            other => Err(SourceError::UnknownCategory(other.to_string())),
        }
    }

    /// `{base}/rs/s0/{query}/Rezepte.html?health=Vegan&...`
    pub fn search_url(&self, query: &str, filters: &SearchFilters) -> Result<Url, SourceError> {
        let mut url = self.page_url("rs/s0/")?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(query.trim())
            .push("Rezepte.html");

        if !filters.is_empty() {
            url.query_pairs_mut().extend_pairs(filters.pairs());
        }
        Ok(url)
    }

    async fn fetch_links(&self, url: Url) -> Result<Vec<RecipeLink>, SourceError> {
        let html = self.client.fetch_html(url.as_str()).await?;
        let links =
            tokio::task::spawn_blocking(move || extract_recipe_links(&html, &url)).await;
        links.map_err(|e| SourceError::Worker(e.to_string()))
    }
}

#[async_trait]
impl<C: HttpClient + 'static> RecipeSource for ChefkochSource<C> {
    async fn random_recipe(&self) -> Result<Option<RecipeLink>, SourceError> {
        let url = self.page_url(RANDOM_PATH)?;
        let html = self.client.fetch_html(url.as_str()).await?;

        let canonical = tokio::task::spawn_blocking(move || extract_canonical_url(&html))
            .await
            .map_err(|e| SourceError::Worker(e.to_string()))?;

        let link = canonical
            .and_then(|c| self.base_url.join(&c).ok())
            .map(|u| u.to_string())
            .filter(|u| is_recipe_url(u))
            .map(|u| RecipeLink::new(&u));

        if link.is_none() {
            tracing::debug!(url = %url, "random page did not point at a recipe");
        }
        Ok(link)
    }

    async fn recipes_by_category(&self, category: &str) -> Result<Vec<RecipeLink>, SourceError> {
        let url = self.category_url(category)?;
        let links = self.fetch_links(url).await?;
        tracing::debug!(category, count = links.len(), "category recipes retrieved");
        Ok(links)
    }

    async fn search_recipes(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RecipeLink>, SourceError> {
        let url = self.search_url(query, filters)?;
        let links = self.fetch_links(url).await?;
        tracing::debug!(query, count = links.len(), "search recipes retrieved");
        Ok(links)
    }

    async fn fetch_recipe_detail(&self, url: &str) -> Result<RecipeDetail, SourceError> {
        let html = self.client.fetch_html(url).await?;
        let owned_url = url.to_string();

        let detail = tokio::task::spawn_blocking(move || RecipeDetail::parse(&html, &owned_url))
            .await
            .map_err(|e| SourceError::Worker(e.to_string()))??;
        Ok(detail)
    }
}
