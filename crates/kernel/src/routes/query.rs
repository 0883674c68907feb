//! Query and field catalog endpoints, one set per entity type.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sift_sdk::{FieldDefinition, FieldDefinitionValue, QueryRequest, Searchable, Slice};
use tracing::debug;

use super::GenericResponse;
use crate::error::{AppError, AppResult};
use crate::models::{Question, Session};
use crate::query::{EntityStore, QueryService};
use crate::state::AppState;

/// An entity type exposed under `/api/{PATH}`.
pub trait EntityResource:
    Searchable + DeserializeOwned + Serialize + Send + Sync + 'static
{
    const PATH: &'static str;

    fn service<S: EntityStore>(state: &AppState<S>) -> &QueryService<Self, S>;
}

impl EntityResource for Question {
    const PATH: &'static str = "questions";

    fn service<S: EntityStore>(state: &AppState<S>) -> &QueryService<Self, S> {
        state.questions()
    }
}

impl EntityResource for Session {
    const PATH: &'static str = "sessions";

    fn service<S: EntityStore>(state: &AppState<S>) -> &QueryService<Self, S> {
        state.sessions()
    }
}

/// Search, filter, sort and paginate.
async fn query<E: EntityResource, S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Json<GenericResponse<Slice<E>>>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let slice = E::service(&state).query(&request).await?;
    debug!(
        entity = E::PATH,
        results = slice.results.len(),
        has_next = slice.has_next,
        "query complete"
    );

    Ok(Json(GenericResponse::success(slice)))
}

/// Filterable fields, for building filter UIs.
async fn fields<E: EntityResource, S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<GenericResponse<Vec<FieldDefinition>>>> {
    let fields = E::service(&state).filterable_fields()?;
    Ok(Json(GenericResponse::success(fields)))
}

/// Known values of one field, resolved by name or synonym.
async fn field_values<E: EntityResource, S: EntityStore + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> AppResult<Json<GenericResponse<FieldDefinitionValue>>> {
    let values = E::service(&state).field_definition_values(&name).await?;
    Ok(Json(GenericResponse::success(values)))
}

/// Create the router for one entity type.
pub fn router<E: EntityResource, S: EntityStore + 'static>() -> Router<AppState<S>> {
    let base = format!("/api/{}", E::PATH);

    Router::new()
        .route(&format!("{base}/query"), post(query::<E, S>))
        .route(&format!("{base}/fields"), get(fields::<E, S>))
        .route(
            &format!("{base}/fields/{{name}}/values"),
            get(field_values::<E, S>),
        )
}
