pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

/// Routes mounted under `/api/requests`.
pub fn router() -> Router<AppState> {
    handlers::request_routes()
}
