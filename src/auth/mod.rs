use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod password;
pub mod repo;
pub mod token;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
