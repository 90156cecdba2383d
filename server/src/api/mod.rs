pub mod entries;
pub mod reload;
pub mod sensors;

use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "chefkoch-server", description = "Chefkoch recipe sensors"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        sensors::ApiDoc::openapi(),
        entries::ApiDoc::openapi(),
        reload::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::response::Response;
    use chefkoch_core::{EntryConfig, EntryRegistry, FakeSource, IntegrationConfig};
    use serde_json::{json, Value};

    use crate::state::{AppContext, AppState};

    /// One entry "kitchen" whose random sensor finds "Soup" and whose
    /// daily sensor finds nothing.
    pub async fn state() -> AppState {
        let source = Arc::new(
            FakeSource::new()
                .with_random("http://x/1")
                .with_recipe("http://x/1", json!({"name": "Soup"})),
        );
        let config = IntegrationConfig {
            base_url: None,
            entries: vec![EntryConfig {
                id: "kitchen".to_string(),
                sensors: chefkoch_core::config::default_sensors()
                    .into_iter()
                    .take(2)
                    .collect(),
                ..Default::default()
            }],
        };

        let mut registry = EntryRegistry::new();
        registry.setup_all(&config, source).await;
        Arc::new(AppContext::new(registry))
    }

    pub async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
