use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::handlers::{jwt, my_reviews, reviews, root, services};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full HTTP surface over `state`.
pub fn app(state: AppState, api: &ApiConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(root::root))
        .route("/health", get(root::health))
        .route("/jwt", post(jwt::issue_token))
        .merge(service_routes())
        .merge(review_routes())
        .merge(my_review_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/service", get(services::list_top))
        .route("/services", get(services::list).post(services::create))
        .route("/services/:id", get(services::get))
}

fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route("/reviews/:id", get(reviews::get))
}

fn my_review_routes(state: AppState) -> Router<AppState> {
    // Only the listing is gated; the per-id routes stay public.
    let protected = Router::new()
        .route("/myreviews", get(my_reviews::list))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware));

    Router::new()
        .route(
            "/myreviews/:id",
            get(reviews::get)
                .patch(my_reviews::update)
                .delete(my_reviews::delete),
        )
        .merge(protected)
}
