mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

use service_review_api::auth::Claims;
use service_review_api::config::{ApiConfig, AppConfig};
use service_review_api::database::{
    Collection, DatabaseError, DeleteResult, Document, DocumentId, DocumentStore, InMemoryStore,
    InsertOneResult, UpdateResult,
};
use service_review_api::filter::Filter;

/// Store whose reads fail: listing hits a corrupt row, lookups and pings lose the connection.
struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _: Collection, _: &Filter) -> Result<Vec<Document>, DatabaseError> {
        Err(DatabaseError::CorruptDocument("row 7 has string body".into()))
    }

    async fn find_one(&self, _: Collection, _: &DocumentId) -> Result<Option<Document>, DatabaseError> {
        Err(DatabaseError::ConnectionError("connection refused".into()))
    }

    async fn insert_one(&self, _: Collection, _: Map<String, Value>) -> Result<InsertOneResult, DatabaseError> {
        Err(DatabaseError::ConnectionError("connection refused".into()))
    }

    async fn update_one(
        &self,
        _: Collection,
        _: &DocumentId,
        _: Map<String, Value>,
    ) -> Result<UpdateResult, DatabaseError> {
        Err(DatabaseError::CorruptDocument("update failed".into()))
    }

    async fn delete_one(&self, _: Collection, _: &DocumentId) -> Result<DeleteResult, DatabaseError> {
        Err(DatabaseError::CorruptDocument("delete failed".into()))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::ConnectionError("connection refused".into()))
    }

    async fn close(&self) {}
}

async fn failing_server() -> Result<common::TestServer> {
    common::spawn_server_with(Arc::new(FailingStore), AppConfig::development().api).await
}

#[tokio::test]
async fn store_errors_become_json_500() -> Result<()> {
    let server = failing_server().await?;

    let res = server.client.get(server.url("/services")).send().await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    assert!(!body["message"].as_str().unwrap_or_default().contains("row 7"));

    let res = server
        .client
        .patch(server.url(&format!("/myreviews/{}", DocumentId::generate())))
        .json(&json!({"description": "x"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn lost_connection_is_503() -> Result<()> {
    let server = failing_server().await?;

    let res = server
        .client
        .get(server.url(&format!("/services/{}", DocumentId::generate())))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.json::<Value>().await?["code"], "SERVICE_UNAVAILABLE");

    let res = server
        .client
        .post(server.url("/reviews"))
        .json(&json!({"service_id": "s1"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn health_degrades_when_store_is_down() -> Result<()> {
    let server = failing_server().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unavailable");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_forbidden() -> Result<()> {
    let server = common::spawn_server().await?;

    let mut identity = Map::new();
    identity.insert("email".into(), json!("ana@example.com"));
    let expired = Claims::new(identity, chrono::Duration::hours(-2));
    let token = server.state.tokens.sign(&expired)?;

    let res = server
        .client
        .get(server.url("/myreviews"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await?["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn oversized_body_is_413_json() -> Result<()> {
    let api = ApiConfig { max_request_size_bytes: 1024 };
    let server = common::spawn_server_with(Arc::new(InMemoryStore::new()), api).await?;

    let res = server
        .client
        .post(server.url("/services"))
        .json(&json!({ "title": "x".repeat(4096) }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_400_json() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/reviews"))
        .header("content-type", "application/json")
        .body("{\"rating\": 5,")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn missing_content_type_is_415_json() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/jwt"))
        .body("{\"email\": \"ana@example.com\"}")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(res.json::<Value>().await?["code"], "UNSUPPORTED_MEDIA_TYPE");
    Ok(())
}

#[tokio::test]
async fn repeated_query_parameter_is_400_json() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .get(server.url("/reviews?service_id=a&service_id=b"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}
