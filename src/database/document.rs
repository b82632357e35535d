use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored document as returned to clients: the caller's fields plus `_id`.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// The two logical collections exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Services,
    Reviews,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Services, Collection::Reviews];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::Reviews => "reviews",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Store-assigned identifier. Immutable once a document is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Join a stored body with its identifier for the wire.
pub fn with_id(id: &DocumentId, body: &Map<String, Value>) -> Document {
    let mut doc = Map::with_capacity(body.len() + 1);
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    for (k, v) in body {
        doc.insert(k.clone(), v.clone());
    }
    doc
}

/// Drop any caller-supplied `_id`; identifiers come from the store.
pub fn strip_id(mut body: Map<String, Value>) -> Map<String, Value> {
    body.remove(ID_FIELD);
    body
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: DocumentId,
}

impl InsertOneResult {
    pub fn new(inserted_id: DocumentId) -> Self {
        Self { acknowledged: true, inserted_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<DocumentId>,
    pub upserted_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self { acknowledged: true, deleted_count }
    }
}
