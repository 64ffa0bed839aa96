use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub database: String,
}

/// The service answers even when the database does not; only `database` reflects it.
pub fn health_report(database_up: bool) -> ApiResponse<HealthData> {
    let data = HealthData {
        status: "ok".to_string(),
        database: if database_up { "up" } else { "down" }.to_string(),
    };

    ApiResponse::success("Health check", data, Some(Meta::empty()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let database_up = match state.orm.ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "database ping failed");
            false
        }
    };

    Json(health_report(database_up))
}
