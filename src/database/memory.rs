//! In-process document store for tests and local development. Ordering
//! follows JSONB type ranks like the Postgres backend, but strings compare
//! bytewise, which matches Postgres only under the C collation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::filter::Filter;

use super::document::{strip_id, with_id};
use super::{
    Collection, DatabaseError, DeleteResult, Document, DocumentId, DocumentStore, InsertOneResult,
    UpdateResult,
};

#[derive(Debug, Clone)]
struct StoredDocument {
    id: DocumentId,
    body: Map<String, Value>,
}

/// Documents per collection, kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<StoredDocument>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, |docs| docs.len())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(&collection)
            .map(|docs| docs.iter().map(|d| with_id(&d.id, &d.body)).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(filter.apply(docs))
    }

    async fn find_one(&self, collection: Collection, id: &DocumentId) -> Result<Option<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == *id))
            .map(|d| with_id(&d.id, &d.body)))
    }

    async fn insert_one(&self, collection: Collection, body: Map<String, Value>) -> Result<InsertOneResult, DatabaseError> {
        let id = DocumentId::generate();
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push(StoredDocument {
            id,
            body: strip_id(body),
        });
        debug!(%collection, %id, "inserted document");
        Ok(InsertOneResult::new(id))
    }

    async fn update_one(
        &self,
        collection: Collection,
        id: &DocumentId,
        set: Map<String, Value>,
    ) -> Result<UpdateResult, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == *id))
        else {
            return Ok(UpdateResult::new(0, 0));
        };

        let mut modified = false;
        for (field, value) in strip_id(set) {
            if stored.body.get(&field) != Some(&value) {
                stored.body.insert(field, value);
                modified = true;
            }
        }
        Ok(UpdateResult::new(1, u64::from(modified)))
    }

    async fn delete_one(&self, collection: Collection, id: &DocumentId) -> Result<DeleteResult, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::new(0));
        };
        match docs.iter().position(|d| d.id == *id) {
            Some(index) => {
                docs.remove(index);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn close(&self) {
        debug!("in-memory store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ID_FIELD;
    use crate::filter::SortDirection;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn insert_then_find_one_returns_payload_with_id() {
        let store = InMemoryStore::new();
        let result = store
            .insert_one(Collection::Services, body(json!({"name": "Photography", "price": 120})))
            .await
            .unwrap();

        let doc = store.find_one(Collection::Services, &result.inserted_id).await.unwrap().unwrap();
        assert_eq!(
            Value::Object(doc),
            json!({"_id": result.inserted_id.to_string(), "name": "Photography", "price": 120})
        );
        assert!(store
            .find_one(Collection::Reviews, &result.inserted_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn client_id_is_replaced() {
        let store = InMemoryStore::new();
        let result = store
            .insert_one(Collection::Reviews, body(json!({"_id": "forged", "email": "a@x.io"})))
            .await
            .unwrap();
        let doc = store.find_one(Collection::Reviews, &result.inserted_id).await.unwrap().unwrap();
        assert_eq!(doc[ID_FIELD], json!(result.inserted_id.to_string()));
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let store = InMemoryStore::new();
        let id = store
            .insert_one(Collection::Reviews, body(json!({"description": "ok", "rating": 4})))
            .await
            .unwrap()
            .inserted_id;

        let changed = store
            .update_one(Collection::Reviews, &id, body(json!({"description": "great"})))
            .await
            .unwrap();
        assert_eq!((changed.matched_count, changed.modified_count), (1, 1));

        let unchanged = store
            .update_one(Collection::Reviews, &id, body(json!({"description": "great"})))
            .await
            .unwrap();
        assert_eq!((unchanged.matched_count, unchanged.modified_count), (1, 0));

        let missing = store
            .update_one(Collection::Reviews, &DocumentId::generate(), body(json!({"description": "x"})))
            .await
            .unwrap();
        assert_eq!((missing.matched_count, missing.modified_count), (0, 0));

        let doc = store.find_one(Collection::Reviews, &id).await.unwrap().unwrap();
        assert_eq!(doc["rating"], json!(4));
        assert_eq!(doc["description"], json!("great"));
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let store = InMemoryStore::new();
        let id = store
            .insert_one(Collection::Reviews, body(json!({"a": 1})))
            .await
            .unwrap()
            .inserted_id;
        assert_eq!(store.delete_one(Collection::Reviews, &id).await.unwrap().deleted_count, 1);
        assert_eq!(store.delete_one(Collection::Reviews, &id).await.unwrap().deleted_count, 0);
        assert_eq!(store.len(Collection::Reviews).await, 0);
    }

    #[tokio::test]
    async fn find_applies_filter_order_and_limit() {
        let store = InMemoryStore::new();
        for (svc, date) in [("s1", "2022-01-01"), ("s2", "2024-01-01"), ("s1", "2023-06-01"), ("s1", "2021-03-01")] {
            store
                .insert_one(Collection::Reviews, body(json!({"service_id": svc, "reviewDate": date})))
                .await
                .unwrap();
        }

        let mut filter = Filter::new();
        filter
            .where_eq("service_id", "s1")
            .unwrap()
            .order("reviewDate", SortDirection::Desc)
            .unwrap()
            .limit(2)
            .unwrap();
        let docs = store.find(Collection::Reviews, &filter).await.unwrap();
        let dates: Vec<_> = docs.iter().map(|d| d["reviewDate"].as_str().unwrap()).collect();
        assert_eq!(dates, vec!["2023-06-01", "2022-01-01"]);
    }
}
