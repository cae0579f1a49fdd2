//! JSONB document store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{Document, DocumentStore, StoreError, into_document};

/// [`DocumentStore`] over the `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let data = sqlx::query_scalar::<_, Value>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found(collection, id))?;

        into_document(data)
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(data))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        // jsonb `||` replaces top-level keys, matching a shallow merge.
        let result = sqlx::query(
            r"
            UPDATE documents
            SET data = data || $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(partial))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn add_document(&self, collection: &str, data: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Value::Object(data))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict(format!("{collection}/{id} already exists"));
                }
                StoreError::Database(e)
            })?;

        Ok(id)
    }

    async fn list_documents(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Value)>(
            "SELECT id, data FROM documents WHERE collection = $1 ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, data)| into_document(data).map(|doc| (id, doc)))
            .collect()
    }

    async fn server_time(&self) -> Result<DateTime<Utc>, StoreError> {
        Ok(sqlx::query_scalar::<_, DateTime<Utc>>("SELECT now()")
            .fetch_one(&self.pool)
            .await?)
    }
}
