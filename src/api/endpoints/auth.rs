//! Account endpoints: register, login, logout.
//!
//! `POST /register` and `POST /login` are unprotected. Login sets the
//! `medimate_session` cookie; logout revokes it and clears the cookie.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{
    clear_session_cookie, session_cookie, session_token, ApiContext, SessionUser,
};
use crate::auth;

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

fn credentials(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, ApiError> {
    payload
        .map(|Json(c)| c)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// `POST /register` — create a patient account.
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionUser>), ApiError> {
    let creds = credentials(payload)?;
    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || {
        core.with_db(|conn| auth::register(conn, &creds.username, &creds.password))
    })
    .await??;

    Ok((StatusCode::CREATED, Json(SessionUser::from(&user))))
}

/// `POST /login` — verify credentials and open a session.
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let creds = credentials(payload)?;
    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || {
        core.with_db(|conn| auth::verify(conn, &creds.username, &creds.password))
    })
    .await??;

    let session_user = SessionUser::from(&user);
    let token = {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.create(session_user.clone())
    };
    tracing::info!(username = %session_user.username, "User logged in");

    Ok(([(SET_COOKIE, session_cookie(&token))], Json(session_user)).into_response())
}

/// `POST /logout` — end the caller's session, if any.
pub async fn logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let logged_out = match session_token(&headers) {
        Some(token) => ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?
            .revoke(&token),
        None => false,
    };

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        Json(LogoutResponse { logged_out }),
    )
        .into_response())
}
