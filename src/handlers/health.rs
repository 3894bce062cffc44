//! Health check handler

use axum::extract::State;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub database: &'static str,
}

/// Liveness check that also verifies database connectivity
pub async fn health_check(State(state): State<AppState>) -> AppResult<ApiResponse<HealthStatus>> {
    sqlx::query("SELECT 1").execute(&state.db).await?;

    Ok(ApiResponse::ok(
        HealthStatus { database: "up" },
        "Service healthy",
    ))
}
