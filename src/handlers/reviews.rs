// Public review routes: /reviews[/:id]

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::database::{Collection, Document, InsertOneResult};
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::state::AppState;

use super::utils::{into_object, parse_id};

pub const REVIEW_DATE_FIELD: &str = "reviewDate";
pub const SERVICE_REF_FIELD: &str = "service_id";

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    /// Restrict to reviews of one service
    pub service_id: Option<String>,
}

/// GET /reviews[?service_id=] - newest first
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let Query(query) = query?;
    let mut filter = Filter::new();
    filter
        .where_eq_optional(SERVICE_REF_FIELD, query.service_id.as_deref())?
        .order(REVIEW_DATE_FIELD, SortDirection::Desc)?;
    let reviews = state.store.find(Collection::Reviews, &filter).await?;
    Ok(Json(reviews))
}

/// GET /reviews/:id and GET /myreviews/:id
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Document>, ApiError> {
    let Path(id) = id?;
    let id = parse_id(&id)?;
    state
        .store
        .find_one(Collection::Reviews, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("review {} not found", id)))
}

/// POST /reviews - store the body verbatim
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let Json(body) = body?;
    let body = into_object(body)?;
    let result = state.store.insert_one(Collection::Reviews, body).await?;
    tracing::info!(id = %result.inserted_id, "review created");
    Ok(Json(result))
}
