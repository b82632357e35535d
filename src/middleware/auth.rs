use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller context extracted from a bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: Option<String>,
    pub claims: Map<String, Value>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.email().map(str::to_string),
            claims: claims.payload,
        }
    }
}

/// Bearer-token gate for individual routes.
///
/// No `Authorization` header is a 401. A header that is present but does not
/// carry a valid, unexpired token is a 403. On success the decoded claims are
/// stored in request extensions as [`AuthUser`].
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::unauthorized("unauthorized access"));
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::forbidden("forbidden access"))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("rejected bearer token: {}", e);
        ApiError::forbidden("forbidden access")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}
