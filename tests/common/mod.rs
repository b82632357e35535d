#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::net::TcpListener;

use service_review_api::auth::TokenService;
use service_review_api::config::{ApiConfig, AppConfig};
use service_review_api::database::{DocumentStore, InMemoryStore};
use service_review_api::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and return the assigned `insertedId`.
    pub async fn insert(&self, path: &str, body: Value) -> Result<String> {
        let res = self.client.post(self.url(path)).json(&body).send().await?;
        anyhow::ensure!(res.status().is_success(), "insert failed: {}", res.status());
        let result = res.json::<Value>().await?;
        result["insertedId"]
            .as_str()
            .map(str::to_string)
            .context("missing insertedId")
    }

    pub async fn token_for(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/jwt"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        let body = res.json::<Value>().await?;
        body["token"].as_str().map(str::to_string).context("missing token")
    }
}

/// Start the API on a free port over a fresh in-memory store.
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(Arc::new(InMemoryStore::new()), AppConfig::development().api).await
}

/// Start the API over the given store and request limits.
pub async fn spawn_server_with(store: Arc<dyn DocumentStore>, api: ApiConfig) -> Result<TestServer> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;

    let tokens = TokenService::new(TEST_SECRET, 4)?;
    let state = AppState::new(store, tokens);
    let router = app(state.clone(), &api);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        state,
        client: reqwest::Client::new(),
    })
}
