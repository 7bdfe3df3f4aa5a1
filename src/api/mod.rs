//! HTTP API.

mod goals;
mod grids;
mod routes;
pub mod types;

pub use routes::{app, serve, AppState, CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS};
