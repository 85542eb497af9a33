pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::router()
}

pub fn home_router() -> Router<AppState> {
    handlers::home_router()
}
