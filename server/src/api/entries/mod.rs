pub mod list;
pub mod refresh;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use chefkoch_core::EntryHandle;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/entries endpoints (mounted at /api/entries)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_entries))
        .route("/{id}/refresh", post(refresh::refresh_entry))
}

/// Coordinator status of one entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntryStatus {
    pub id: String,
    pub title: String,
    pub update_interval_hours: u64,
    pub sensor_ids: Vec<String>,
    pub last_update_success: bool,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl EntryStatus {
    pub fn from_handle(handle: &EntryHandle) -> Self {
        let config = handle.config();
        let state = handle.coordinator().state();

        Self {
            id: config.id.clone(),
            title: config.title.clone(),
            update_interval_hours: config.update_interval_hours,
            sensor_ids: config.sensors.iter().map(|s| s.id.clone()).collect(),
            last_update_success: state.last_update_success,
            last_refreshed_at: state.last_refreshed_at,
            last_error: state.last_error.clone(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_entries, refresh::refresh_entry),
    components(schemas(EntryStatus, list::EntriesListResponse))
)]
pub struct ApiDoc;
