//! Repository layer over a document store
//!
//! Every collection is a set of JSON documents keyed by id. The
//! `DocumentStore` trait is the only seam to the backing database; typed
//! repositories convert documents to models with serde.

pub mod attendance;
pub mod holidays;
pub mod memory;
pub mod postgres;
pub mod students;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const STUDENTS: &str = "students";
pub const ATTENDANCE: &str = "attendance";
pub const HOLIDAYS: &str = "holidays";

/// A stored JSON object
pub type Document = serde_json::Map<String, Value>;

/// Keyed document storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>>;

    /// Documents whose `field` equals `value`
    async fn query_by_field(&self, collection: &str, field: &str, value: &Value) -> AppResult<Vec<Document>>;

    /// Documents matching both field/value pairs
    async fn query_by_two_fields(
        &self,
        collection: &str,
        field_a: &str,
        value_a: &Value,
        field_b: &str,
        value_b: &Value,
    ) -> AppResult<Vec<Document>>;

    /// Atomic insert-or-merge: fields in `document` overwrite, others are kept
    async fn upsert(&self, collection: &str, id: &str, document: Document) -> AppResult<()>;

    /// Merge `partial` into an existing document; `NotFound` if absent
    async fn update(&self, collection: &str, id: &str, partial: Document) -> AppResult<()>;

    /// `NotFound` if absent
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;
}

pub(crate) fn to_document<T: Serialize>(value: &T) -> AppResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(document: Document) -> AppResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

pub(crate) fn not_found(collection: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} document {} not found", collection, id))
}

/// Main repository struct holding the document store
#[derive(Clone)]
pub struct Repository {
    pub store: Arc<dyn DocumentStore>,
    pub students: students::StudentsRepository,
    pub attendance: attendance::AttendanceRepository,
    pub holidays: holidays::HolidaysRepository,
}

impl Repository {
    /// Create a new repository over the given store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            students: students::StudentsRepository::new(store.clone()),
            attendance: attendance::AttendanceRepository::new(store.clone()),
            holidays: holidays::HolidaysRepository::new(store.clone()),
            store,
        }
    }

    /// Repository backed by a fresh in-process store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
