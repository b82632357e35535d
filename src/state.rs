use std::sync::Arc;

use crate::auth::TokenService;
use crate::database::DocumentStore;

/// Shared handles available to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
        }
    }
}
