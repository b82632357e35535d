use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /jwt - sign the posted identity object and return `{ token }`.
///
/// Credentials are not checked: any caller can mint a token for any
/// identity. Identity must be established before this endpoint is called.
pub async fn issue_token(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    if let Some(email) = body.get("email").and_then(Value::as_str) {
        tracing::info!(%email, "issuing token");
    }
    let token = state.tokens.issue(body)?;
    Ok(Json(json!({ "token": token })))
}
