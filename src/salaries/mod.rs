//! Editable salary table over a seeded, process-local dataset.

pub mod data;
pub mod grid;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::salary_routes())
}
