//! Prescription endpoints: upload + analysis, JSON view, PDF download,
//! delete, dashboard listing.
//!
//! Oracle and database work is blocking and runs under `spawn_blocking`.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionUser};
use crate::models::{PrescriptionSummary, Role};
use crate::prescriptions;
use crate::prompts::PRESCRIPTION_ANALYSIS;

/// Multipart field carrying the prescription photo.
const UPLOAD_FIELD: &str = "prescription";

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
    /// Absent when the analysis could not be stored.
    pub prescription_id: Option<String>,
}

#[derive(Serialize)]
pub struct PrescriptionResponse {
    pub id: String,
    pub uploaded_at: DateTime<Utc>,
    pub analysis: Value,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub user: String,
    pub role: Role,
    pub prescriptions: Vec<PrescriptionSummary>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// `POST /analyze-prescription` — multipart upload, oracle analysis, store.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
            image = Some(bytes.to_vec());
            break;
        }
    }
    let image = image.ok_or(ApiError::BadRequest("Error uploading file".into()))?;

    tracing::info!(
        owner = %user.username,
        upload_bytes = image.len(),
        "Prescription upload received"
    );

    let core = ctx.core.clone();
    let owner = user.username;
    let outcome = tokio::task::spawn_blocking(move || {
        prescriptions::analyze(&core, &owner, PRESCRIPTION_ANALYSIS, Some(&image))
    })
    .await??;

    Ok(Json(AnalyzeResponse {
        analysis: outcome.analysis,
        prescription_id: outcome.record_id.map(|id| id.to_string()),
    }))
}

/// `GET /prescription/:id` — parsed analysis as JSON.
pub async fn get_one(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<PrescriptionResponse>, ApiError> {
    let id = prescriptions::parse_record_id(&id)?;
    let core = ctx.core.clone();
    let (record, parsed) = tokio::task::spawn_blocking(move || {
        prescriptions::fetch_parsed(&core, &id, &user.username)
    })
    .await??;

    Ok(Json(PrescriptionResponse {
        id: record.id.to_string(),
        uploaded_at: record.uploaded_at,
        analysis: parsed.into_value(),
    }))
}

/// `GET /prescription/:id/download` — PDF report attachment.
pub async fn download(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = prescriptions::parse_record_id(&id)?;
    let core = ctx.core.clone();
    let (filename, bytes) = tokio::task::spawn_blocking(move || {
        prescriptions::download_report(&core, &id, &user.username, Utc::now())
    })
    .await??;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| ApiError::Internal(format!("bad filename header: {e}")))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (CONTENT_DISPOSITION, disposition),
            (
                CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate"),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// `DELETE /delete-prescription?id=<id>`
pub async fn delete_by_query(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let raw = query
        .id
        .ok_or(ApiError::BadRequest("Prescription ID is required".into()))?;
    remove(ctx, user, &raw).await
}

/// `DELETE /prescription/:id`
pub async fn delete_by_path(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    remove(ctx, user, &id).await
}

async fn remove(
    ctx: ApiContext,
    user: SessionUser,
    raw_id: &str,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = prescriptions::parse_record_id(raw_id)?;
    let core = ctx.core.clone();
    let deleted =
        tokio::task::spawn_blocking(move || prescriptions::remove(&core, &id, &user.username))
            .await??;

    if !deleted {
        return Err(ApiError::NotFound("Prescription not found or unauthorized".into()));
    }
    Ok(Json(MessageResponse {
        message: "Prescription deleted successfully",
    }))
}

/// `GET /dashboard` — the caller and their prescriptions, newest first.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let core = ctx.core.clone();
    let owner = user.username.clone();
    let records =
        tokio::task::spawn_blocking(move || prescriptions::list_for_owner(&core, &owner))
            .await??;

    Ok(Json(DashboardResponse {
        user: user.username,
        role: user.role,
        prescriptions: records.iter().map(PrescriptionSummary::from).collect(),
    }))
}
