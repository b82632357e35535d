//! Postgres backend: one JSONB table per collection.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::filter::{Filter, SqlParam};

use super::document::{strip_id, with_id};
use super::{
    Collection, DatabaseError, DeleteResult, Document, DocumentId, DocumentStore, InsertOneResult,
    UpdateResult,
};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the collection tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        for collection in Collection::ALL {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (\
                    id UUID PRIMARY KEY, \
                    seq BIGSERIAL NOT NULL, \
                    doc JSONB NOT NULL, \
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()\
                )",
                collection.name()
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
            info!(%collection, "ensured collection table");
        }
        Ok(())
    }

    fn row_to_document(row: &PgRow) -> Result<Document, DatabaseError> {
        let id: Uuid = row.try_get("id")?;
        let id = DocumentId::from(id);
        match row.try_get::<Value, _>("doc")? {
            Value::Object(body) => Ok(with_id(&id, &body)),
            other => Err(DatabaseError::CorruptDocument(format!("{} has {} body", id, json_kind(&other)))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, Postgres, PgArguments>,
    params: Vec<SqlParam>,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s),
            SqlParam::Json(v) => query.bind(v),
            SqlParam::Int(i) => query.bind(i),
        };
    }
    query
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let sql = filter.to_sql(collection.name())?;
        debug!(%collection, query = %sql.query, "find");
        let rows = bind_params(sqlx::query(&sql.query), sql.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_document).collect()
    }

    async fn find_one(&self, collection: Collection, id: &DocumentId) -> Result<Option<Document>, DatabaseError> {
        let sql = format!("SELECT id, doc FROM \"{}\" WHERE id = $1", collection.name());
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn insert_one(&self, collection: Collection, body: Map<String, Value>) -> Result<InsertOneResult, DatabaseError> {
        let id = DocumentId::generate();
        let sql = format!("INSERT INTO \"{}\" (id, doc) VALUES ($1, $2)", collection.name());
        sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(Value::Object(strip_id(body)))
            .execute(&self.pool)
            .await?;
        Ok(InsertOneResult::new(id))
    }

    async fn update_one(
        &self,
        collection: Collection,
        id: &DocumentId,
        set: Map<String, Value>,
    ) -> Result<UpdateResult, DatabaseError> {
        // `||` on JSONB objects overwrites top-level keys only; a merge that
        // yields the stored value counts as matched but not modified.
        let table = collection.name();
        let sql = format!(
            "WITH target AS (\
                SELECT id, doc FROM \"{table}\" WHERE id = $1 FOR UPDATE\
            ), updated AS (\
                UPDATE \"{table}\" AS t SET doc = target.doc || $2::jsonb \
                FROM target \
                WHERE t.id = target.id AND target.doc || $2::jsonb <> target.doc \
                RETURNING t.id\
            ) \
            SELECT (SELECT COUNT(*) FROM target) AS matched, \
                   (SELECT COUNT(*) FROM updated) AS modified"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(Value::Object(strip_id(set)))
            .fetch_one(&self.pool)
            .await?;
        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok(UpdateResult::new(matched as u64, modified as u64))
    }

    async fn delete_one(&self, collection: Collection, id: &DocumentId) -> Result<DeleteResult, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", collection.name());
        let result = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(DeleteResult::new(result.rows_affected()))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
