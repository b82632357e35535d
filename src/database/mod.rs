//! Document storage: the store trait and its backends.

pub mod document;
pub mod manager;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::filter::Filter;

pub use document::{
    Collection, DeleteResult, Document, DocumentId, InsertOneResult, UpdateResult, ID_FIELD,
};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// A schema-less document store holding the API's collections.
///
/// Every operation is a single atomic call against one collection; callers
/// never coordinate across calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter`, in the filter's order.
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, DatabaseError>;

    async fn find_one(&self, collection: Collection, id: &DocumentId) -> Result<Option<Document>, DatabaseError>;

    /// Store `body` under a freshly assigned id. Any `_id` in `body` is ignored.
    async fn insert_one(&self, collection: Collection, body: Map<String, Value>) -> Result<InsertOneResult, DatabaseError>;

    /// Overwrite the fields named in `set`, leaving the rest untouched.
    async fn update_one(
        &self,
        collection: Collection,
        id: &DocumentId,
        set: Map<String, Value>,
    ) -> Result<UpdateResult, DatabaseError>;

    async fn delete_one(&self, collection: Collection, id: &DocumentId) -> Result<DeleteResult, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;

    /// Release connections. Called once after the server stops.
    async fn close(&self);
}
