//! Refresh aggregation: sensor specs in, one attributes record per sensor out.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{info_span, Instrument};

use crate::error::{RefreshError, SourceError};
use crate::extract::extract_attributes;
use crate::source::{RecipeSource, SearchFilters, CATEGORY_BAKING, CATEGORY_COOKING};
use crate::types::{RecipeAttributes, RefreshResult, SensorSpec, SensorType};

/// Query used by vegan sensors.
pub const VEGAN_QUERY: &str = "vegan";
/// Health filter used by vegan sensors.
pub const VEGAN_HEALTH: &str = "Vegan";

/// Resolves sensor specs into recipe attributes against a [`RecipeSource`].
///
/// Stateless between cycles; the last published result lives in the
/// coordinator.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn RecipeSource>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn RecipeSource>) -> Self {
        Self { source }
    }

    /// Run one refresh cycle.
    ///
    /// Every sensor is processed in its own task. Failures are contained per
    /// sensor, so the result always holds exactly one entry per sensor id.
    /// Dropping the returned future aborts the tasks still running.
    pub async fn refresh(&self, specs: &[SensorSpec]) -> Result<RefreshResult, RefreshError> {
        let mut result = RefreshResult::new();
        if specs.is_empty() {
            return Ok(result);
        }

        let mut tasks = JoinSet::new();
        for spec in specs {
            let source = self.source.clone();
            let spec = spec.clone();
            let span = info_span!(
                "sensor_refresh",
                sensor = %spec.id,
                sensor_type = spec.sensor_type.as_str()
            );

            tasks.spawn(
                async move {
                    let attributes = AssertUnwindSafe(process_spec(source.as_ref(), &spec))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            let message = panic_message(panic);
                            tracing::error!(error = %message, "sensor refresh panicked");
                            RecipeAttributes::failed(message)
                        });
                    (spec.id, attributes)
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            let (id, attributes) = joined.map_err(|e| RefreshError::Aborted(e.to_string()))?;
            result.insert(id, attributes);
        }

        Ok(result)
    }
}

async fn process_spec(source: &dyn RecipeSource, spec: &SensorSpec) -> RecipeAttributes {
    let url = match resolve_url(source, spec).await {
        Ok(Some(url)) => url,
        Ok(None) => {
            tracing::info!("no recipe found");
            return RecipeAttributes::not_found();
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to resolve recipe");
            return RecipeAttributes::failed(e.to_string());
        }
    };

    match source.fetch_recipe_detail(&url).await {
        Ok(detail) => {
            let attributes = extract_attributes(&detail);
            tracing::debug!(url = %url, title = %attributes.title, "recipe refreshed");
            attributes
        }
        Err(e) => {
            tracing::error!(url = %url, error = %e, "failed to load recipe details");
            RecipeAttributes::detail_error(&url, e.to_string())
        }
    }
}

/// The recipe url a sensor currently points at, if any.
pub async fn resolve_url(
    source: &dyn RecipeSource,
    spec: &SensorSpec,
) -> Result<Option<String>, SourceError> {
    let link = match spec.sensor_type {
        SensorType::Random => source.random_recipe().await?,
        SensorType::Daily => first(source.recipes_by_category(CATEGORY_COOKING).await?),
        SensorType::Baking => first(source.recipes_by_category(CATEGORY_BAKING).await?),
        SensorType::Vegan => {
            let filters = SearchFilters::default().health(&[VEGAN_HEALTH]);
            first(source.search_recipes(VEGAN_QUERY, &filters).await?)
        }
        SensorType::Search => {
            let filters = SearchFilters::from_params(&spec.search);
            first(source.search_recipes(spec.search.query.trim(), &filters).await?)
        }
        SensorType::Unknown => None,
    };

    Ok(link.map(|l| l.url).filter(|url| !url.is_empty()))
}

fn first<T>(items: Vec<T>) -> Option<T> {
    items.into_iter().next()
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "sensor task panicked".to_string()
    }
}
