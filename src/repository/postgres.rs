//! Postgres-backed document store (one JSONB row per document)

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgPoolOptions, types::Json, Pool, Postgres};

use super::{not_found, Document, DocumentStore};
use crate::{
    config::StoreConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open a pool and bring the schema up to date
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    async fn contains(&self, collection: &str, filter: Document) -> AppResult<Vec<Document>> {
        // Containment equals equality here: filter values are always scalars
        let rows = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT body FROM documents WHERE collection = $1 AND body @> $2 ORDER BY id",
        )
        .bind(collection)
        .bind(Json(Value::Object(filter)))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(doc)| doc))
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        let rows = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT body FROM documents WHERE collection = $1 ORDER BY id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn query_by_field(&self, collection: &str, field: &str, value: &Value) -> AppResult<Vec<Document>> {
        let mut filter = Map::new();
        filter.insert(field.to_string(), value.clone());
        self.contains(collection, filter).await
    }

    async fn query_by_two_fields(
        &self,
        collection: &str,
        field_a: &str,
        value_a: &Value,
        field_b: &str,
        value_b: &Value,
    ) -> AppResult<Vec<Document>> {
        let mut filter = Map::new();
        filter.insert(field_a.to_string(), value_a.clone());
        filter.insert(field_b.to_string(), value_b.clone());
        self.contains(collection, filter).await
    }

    async fn upsert(&self, collection: &str, id: &str, document: Document) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET body = documents.body || EXCLUDED.body, modif_date = now()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(document)))
        .execute(&self.pool)
        .await?;
        tracing::debug!(collection, id, "pg upsert");
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, partial: Document) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET body = body || $3, modif_date = now() WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(partial)))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(collection, id));
        }
        Ok(())
    }
}
