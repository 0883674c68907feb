//! HTTP route handlers.

pub mod health;
pub mod query;

use axum::Router;
use serde::Serialize;

use crate::models::{Question, Session};
use crate::query::EntityStore;
use crate::state::AppState;

/// Response envelope shared by every API endpoint.
#[derive(Debug, Serialize)]
pub struct GenericResponse<T> {
    pub data: T,
    pub message: &'static str,
}

impl<T> GenericResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: "Success",
        }
    }
}

/// All API and health routes, not yet bound to a state.
pub fn api_router<S: EntityStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::router::<S>())
        .merge(query::router::<Question, S>())
        .merge(query::router::<Session, S>())
}
