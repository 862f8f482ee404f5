//! HTTP layer: router, cookie-session middleware, endpoints, server
//! lifecycle.
//!
//! Handlers stay thin; domain work lives in `prescriptions`, `assistant`
//! and `auth`, and blocking calls run under `spawn_blocking`.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
