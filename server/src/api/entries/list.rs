use super::EntryStatus;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntriesListResponse {
    pub entries: Vec<EntryStatus>,
}

#[utoipa::path(
    get,
    path = "/api/entries",
    tag = "entries",
    operation_id = "list_entries",
    responses(
        (status = 200, description = "Refresh status of every entry", body = EntriesListResponse)
    )
)]
pub async fn list_entries(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let entries = registry.handles().map(EntryStatus::from_handle).collect();

    Json(EntriesListResponse { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, state};

    #[tokio::test]
    async fn lists_entry_status() {
        let state = state().await;

        let response = list_entries(State(state)).await.into_response();
        let body = body_json(response).await;

        let entry = &body["entries"][0];
        assert_eq!(entry["id"], "kitchen");
        assert_eq!(entry["update_interval_hours"], 24);
        assert_eq!(entry["sensor_ids"], serde_json::json!(["random", "daily"]));
        assert_eq!(entry["last_update_success"], true);
    }
}
