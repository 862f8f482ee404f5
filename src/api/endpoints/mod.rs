//! API endpoint handlers, one module per feature.

pub mod assistant;
pub mod auth;
pub mod health;
pub mod prescriptions;
