use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chefkoch_core::SensorSnapshot;

#[utoipa::path(
    get,
    path = "/api/sensors/{unique_id}",
    tag = "sensors",
    operation_id = "get_sensor",
    params(
        ("unique_id" = String, Path, description = "Sensor id, {entry}_{sensor}")
    ),
    responses(
        (status = 200, description = "Sensor snapshot", body = SensorSnapshot),
        (status = 404, description = "Sensor not found", body = ErrorResponse)
    )
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    Path(unique_id): Path<String>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;

    match registry.sensor(&unique_id) {
        Some(sensor) => (StatusCode::OK, Json(sensor.snapshot())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Sensor not found: {}", unique_id))),
        )
            .into_response(),
    }
}
