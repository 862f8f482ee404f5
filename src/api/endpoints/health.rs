//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub oracle_configured: bool,
    pub version: &'static str,
}

/// `GET /health` — liveness plus a trivial database round trip.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let core = ctx.core.clone();
    let database = tokio::task::spawn_blocking(move || {
        core.with_db(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .is_ok()
    })
    .await?;

    Ok(Json(HealthResponse {
        status: "ok",
        database,
        oracle_configured: ctx.core.config().gemini_api_key.is_some(),
        version: crate::config::APP_VERSION,
    }))
}
