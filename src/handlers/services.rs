// Service catalogue routes: /service and /services[/:id]

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde_json::Value;

use crate::database::{Collection, Document, InsertOneResult};
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::state::AppState;

use super::utils::{into_object, parse_id};

/// Recency field for services; larger values are newer.
pub const ADDED_DATE_FIELD: &str = "serviceAddedDate";

/// Size of the home-page preview list.
pub const TOP_SERVICES_LIMIT: i64 = 3;

fn newest_first() -> Result<Filter, ApiError> {
    let mut filter = Filter::new();
    filter.order(ADDED_DATE_FIELD, SortDirection::Desc)?;
    Ok(filter)
}

/// GET /service - the newest few services
pub async fn list_top(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    let mut filter = newest_first()?;
    filter.limit(TOP_SERVICES_LIMIT)?;
    let services = state.store.find(Collection::Services, &filter).await?;
    Ok(Json(services))
}

/// GET /services - every service, newest first
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    let services = state.store.find(Collection::Services, &newest_first()?).await?;
    Ok(Json(services))
}

/// GET /services/:id
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Document>, ApiError> {
    let Path(id) = id?;
    let id = parse_id(&id)?;
    state
        .store
        .find_one(Collection::Services, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("service {} not found", id)))
}

/// POST /services - store the body verbatim
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let Json(body) = body?;
    let body = into_object(body)?;
    let result = state.store.insert_one(Collection::Services, body).await?;
    tracing::info!(id = %result.inserted_id, "service created");
    Ok(Json(result))
}
