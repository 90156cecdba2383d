use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chefkoch_core::SensorSnapshot;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SensorsListResponse {
    pub sensors: Vec<SensorSnapshot>,
}

#[utoipa::path(
    get,
    path = "/api/sensors",
    tag = "sensors",
    operation_id = "list_sensors",
    responses(
        (status = 200, description = "Every sensor of every entry", body = SensorsListResponse)
    )
)]
pub async fn list_sensors(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let sensors = registry.sensors().map(|s| s.snapshot()).collect();

    Json(SensorsListResponse { sensors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, state};

    #[tokio::test]
    async fn lists_all_sensors() {
        let state = state().await;

        let response = list_sensors(State(state)).await.into_response();
        let body = body_json(response).await;

        let sensors = body["sensors"].as_array().unwrap();
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0]["unique_id"], "kitchen_random");
        assert_eq!(sensors[0]["state"], "Soup");
        assert_eq!(sensors[1]["state"], "No recipe found");
    }
}
