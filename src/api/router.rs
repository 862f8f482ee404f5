//! HTTP router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Middleware uses `Extension<ApiContext>` (injected as the outermost layer);
//! handlers use `State<ApiContext>` (provided via `with_state`).

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::X_CONTENT_TYPE_OPTIONS;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the MediMate router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from pre-constructed `ApiContext`.
///
/// Used by tests that need the shared session store.
#[cfg(test)]
pub(crate) fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    let upload_limit = ctx.core.config().max_upload_bytes;

    // Protected routes. Layers apply bottom (innermost) to top (outermost);
    // the Extension must be outermost so the session check can read ApiContext.
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/dashboard", get(endpoints::prescriptions::dashboard))
        .route(
            "/analyze-prescription",
            post(endpoints::prescriptions::analyze).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/chat", post(endpoints::assistant::chat))
        .route("/predict-disease", post(endpoints::assistant::predict_disease))
        .route(
            "/prescription/:id",
            get(endpoints::prescriptions::get_one).delete(endpoints::prescriptions::delete_by_path),
        )
        .route(
            "/prescription/:id/download",
            get(endpoints::prescriptions::download),
        )
        .route(
            "/delete-prescription",
            delete(endpoints::prescriptions::delete_by_query),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_session))
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/register", post(endpoints::auth::register))
        .route("/login", post(endpoints::auth::login))
        .route("/logout", post(endpoints::auth::logout))
        .with_state(ctx);

    Router::new()
        .merge(protected)
        .merge(unprotected)
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}
