use super::EntryStatus;
use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

#[utoipa::path(
    post,
    path = "/api/entries/{id}/refresh",
    tag = "entries",
    operation_id = "refresh_entry",
    params(
        ("id" = String, Path, description = "Entry id")
    ),
    responses(
        (status = 200, description = "Status after the refresh cycle", body = EntryStatus),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    )
)]
pub async fn refresh_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    // the lock is released before the cycle runs so reloads are not blocked
    let coordinator = {
        let registry = state.registry.read().await;
        match registry.get(&id) {
            Some(handle) => handle.coordinator().clone(),
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse::new(format!("Entry not found: {}", id))),
                )
                    .into_response();
            }
        }
    };

    let refreshed = coordinator.request_refresh().await;
    tracing::info!(
        entry = %id,
        success = refreshed.last_update_success,
        "manual refresh finished"
    );

    let registry = state.registry.read().await;
    match registry.get(&id) {
        Some(handle) => (StatusCode::OK, Json(EntryStatus::from_handle(handle))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Entry was unloaded: {}", id))),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, state};

    #[tokio::test]
    async fn refreshes_existing_entry() {
        let state = state().await;

        let response = refresh_entry(State(state), Path("kitchen".to_string()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["last_update_success"], true);
        assert!(body["last_refreshed_at"].is_string());
    }

    #[tokio::test]
    async fn unknown_entry_is_404() {
        let state = state().await;

        let response = refresh_entry(State(state), Path("garage".to_string()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
