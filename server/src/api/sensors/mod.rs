pub mod get;
pub mod list;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/sensors endpoints (mounted at /api/sensors)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_sensors))
        .route("/{unique_id}", get(get::get_sensor))
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_sensors, get::get_sensor),
    components(schemas(list::SensorsListResponse, chefkoch_core::SensorSnapshot))
)]
pub struct ApiDoc;
