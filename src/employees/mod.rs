//! Employee registry: live listing, registration form and guarded deletion.

pub mod delete;
pub mod dto;
pub mod form;
pub mod handlers;
pub mod list;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::employee_routes())
}
