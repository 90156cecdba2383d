use crate::api::ErrorResponse;
use crate::state::{build_source, AppState};
use axum::routing::post;
use axum::Router;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chefkoch_core::{EntryRegistry, IntegrationConfig, RecipeSource};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/reload (mounted at /api/reload)
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(reload))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReloadResponse {
    pub entries: usize,
    pub sensors: usize,
}

#[utoipa::path(
    post,
    path = "/api/reload",
    tag = "entries",
    operation_id = "reload",
    responses(
        (status = 200, description = "Entries set up again from the config file", body = ReloadResponse),
        (status = 400, description = "Configuration is invalid; running entries are kept", body = ErrorResponse),
        (status = 500, description = "Recipe source could not be built", body = ErrorResponse)
    )
)]
pub async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    let config = match IntegrationConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "reload rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };

    let source = match build_source(&config) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "failed to build recipe source");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("{:#}", e))),
            )
                .into_response();
        }
    };

    Json(replace_entries(&state, &config, source).await).into_response()
}

/// Set up the configured entries, then swap them in for the running ones.
///
/// The registry lock is only held for the swap, so readers keep seeing the
/// old sensors while the new entries run their first refresh.
pub async fn replace_entries(
    state: &AppState,
    config: &IntegrationConfig,
    source: Arc<dyn RecipeSource>,
) -> ReloadResponse {
    tracing::info!(entries = config.entries.len(), "reloading entries");

    let mut fresh = EntryRegistry::new();
    fresh.setup_all(config, source).await;
    let response = ReloadResponse {
        entries: fresh.len(),
        sensors: fresh.sensors().count(),
    };

    let mut previous = std::mem::replace(&mut *state.registry.write().await, fresh);
    previous.unload_all().await;

    response
}

#[derive(OpenApi)]
#[openapi(paths(reload), components(schemas(ReloadResponse)))]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, state};
    use chefkoch_core::{EntryConfig, FakeSource};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reload_replaces_entries_and_rejects_bad_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::env::set_var("CHEFKOCH_CONFIG", &path);
        let state = state().await;

        std::fs::write(&path, r#"{"entries": [{"id": "a"}, {"id": "a"}]}"#).unwrap();
        let response = reload(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.registry.read().await.len(), 1);

        std::fs::write(&path, r#"{"entries": []}"#).unwrap();
        let response = reload(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["entries"], 0);
        assert!(state.registry.read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sensors_stay_readable_while_new_entries_refresh() {
        let state = state().await;
        let slow = Arc::new(
            FakeSource::new()
                .with_delay(Duration::from_secs(3 * 3600))
                .with_random("http://x/2")
                .with_recipe("http://x/2", json!({"name": "Stew"})),
        );
        let config = IntegrationConfig {
            base_url: None,
            entries: vec![EntryConfig {
                id: "pantry".to_string(),
                ..Default::default()
            }],
        };

        let reloading = {
            let state = state.clone();
            tokio::spawn(async move { replace_entries(&state, &config, slow).await })
        };
        tokio::task::yield_now().await;

        {
            let registry = tokio::time::timeout(Duration::from_secs(60), state.registry.read())
                .await
                .expect("registry locked during reload");
            assert!(registry.get("kitchen").is_some());
            assert!(registry.get("pantry").is_none());
            assert_eq!(
                registry.sensor("kitchen_random").unwrap().native_value().as_deref(),
                Some("Soup")
            );
        }

        let response = reloading.await.unwrap();
        assert_eq!(response.entries, 1);
        assert_eq!(response.sensors, 4);

        let registry = state.registry.read().await;
        assert!(registry.get("kitchen").is_none());
        assert_eq!(
            registry.sensor("pantry_random").unwrap().native_value().as_deref(),
            Some("Stew")
        );
    }
}
