// Owner-scoped review routes: /myreviews[/:id]

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::database::{Collection, DeleteResult, Document, UpdateResult};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::AuthUser;
use crate::state::AppState;

use super::utils::parse_id;

pub const EMAIL_FIELD: &str = "email";
pub const DESCRIPTION_FIELD: &str = "description";

#[derive(Debug, Default, Deserialize)]
pub struct MyReviewQuery {
    pub email: Option<String>,
}

/// GET /myreviews[?email=] - bearer token required
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<MyReviewQuery>, QueryRejection>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let Query(query) = query?;
    tracing::debug!(caller = ?user.email, requested = ?query.email, "listing owner reviews");
    let mut filter = Filter::new();
    filter.where_eq_optional(EMAIL_FIELD, query.email.as_deref())?;
    let reviews = state.store.find(Collection::Reviews, &filter).await?;
    Ok(Json(reviews))
}

/// PATCH /myreviews/:id - only `description` is written; other body fields are ignored
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateResult>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let id = parse_id(&id)?;
    let description = body
        .get(DESCRIPTION_FIELD)
        .cloned()
        .ok_or_else(|| ApiError::bad_request("description is required"))?;

    let mut set = Map::new();
    set.insert(DESCRIPTION_FIELD.to_string(), description);
    let result = state.store.update_one(Collection::Reviews, &id, set).await?;
    tracing::info!(
        %id,
        matched = result.matched_count,
        modified = result.modified_count,
        "review description updated"
    );
    Ok(Json(result))
}

/// DELETE /myreviews/:id - a missing id yields `deletedCount: 0`
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteResult>, ApiError> {
    let Path(id) = id?;
    let id = parse_id(&id)?;
    let result = state.store.delete_one(Collection::Reviews, &id).await?;
    tracing::info!(%id, deleted = result.deleted_count, "review deleted");
    Ok(Json(result))
}
