//! Health chat and disease prediction endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::assistant;
use crate::prompts::PatientDetails;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub response: String,
}

/// `POST /chat`
pub async fn chat(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let core = ctx.core.clone();
    let response =
        tokio::task::spawn_blocking(move || assistant::chat(&core, &request.message)).await??;
    Ok(Json(AnswerResponse { response }))
}

/// `POST /predict-disease`
pub async fn predict_disease(
    State(ctx): State<ApiContext>,
    payload: Result<Json<PatientDetails>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(details) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let core = ctx.core.clone();
    let response =
        tokio::task::spawn_blocking(move || assistant::predict_disease(&core, &details)).await??;
    Ok(Json(AnswerResponse { response }))
}
