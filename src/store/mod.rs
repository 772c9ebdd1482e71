//! Document store abstraction
//!
//! Records live in named collections as JSON documents. Writes can carry
//! field transforms (server timestamps, increments) that the store applies
//! atomically with the write, the way the managed database does.

pub mod firestore;
pub mod memory;
pub mod sled_store;

use crate::config::{StoreConfig, StoreProvider};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use sled_store::SledStore;

pub type Document = serde_json::Map<String, Value>;

/// A document together with its generated id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

impl StoredDocument {
    /// Decode into a record type, exposing the document id as `id`
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    /// Set the field to the store's commit time
    ServerTimestamp(String),
    /// Add to a numeric field, treating a missing field as zero
    Increment(String, i64),
}

impl FieldTransform {
    pub fn server_timestamp(field: &str) -> Self {
        FieldTransform::ServerTimestamp(field.to_string())
    }

    pub fn increment(field: &str, by: i64) -> Self {
        FieldTransform::Increment(field.to_string(), by)
    }

    pub fn field(&self) -> &str {
        match self {
            FieldTransform::ServerTimestamp(field) | FieldTransform::Increment(field, _) => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality filters plus an optional ordering and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document passes the filters and carries the ordering field
    pub fn matches(&self, doc: &Document) -> bool {
        let filtered = self
            .filters
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value));
        let orderable = match &self.order_by {
            Some(order) => doc.get(&order.field).is_some_and(|v| !v.is_null()),
            None => true,
        };
        filtered && orderable
    }

    /// Filter, sort and truncate documents held by a local store
    pub fn apply(&self, docs: Vec<StoredDocument>) -> Vec<StoredDocument> {
        let mut docs: Vec<StoredDocument> = docs
            .into_iter()
            .filter(|doc| self.matches(&doc.fields))
            .collect();

        match &self.order_by {
            Some(order) => docs.sort_by(|a, b| {
                let ordering = compare_values(&a.fields[&order.field], &b.fields[&order.field])
                    .then_with(|| a.id.cmp(&b.id));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            }),
            None => docs.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document under a generated id and return the id
    async fn add(
        &self,
        collection: &str,
        fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<String>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Merge fields into an existing document. Fails with `NotFound` when absent.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>>;

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.query(collection, &Query::new()).await?.len())
    }

    fn provider_name(&self) -> &str;
}

/// Open the store selected by configuration
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.provider {
        StoreProvider::Memory => Arc::new(MemoryStore::new()),
        StoreProvider::Sled => Arc::new(SledStore::open(&config.data_dir)?),
        StoreProvider::Firestore => Arc::new(FirestoreStore::new(&config.firestore)?),
    };
    tracing::info!("[STORE] Using {} document store", store.provider_name());
    Ok(store)
}

/// Serialize a payload into document fields
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Store(format!(
            "documents must serialize to objects, got {other}"
        ))),
    }
}

pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Total order over JSON values for local stores: null < bool < number < string < others
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Commit clock for local stores. Every stamp is strictly later than the
/// previous one, so creation order is total even within one clock tick.
#[derive(Debug, Default)]
pub struct CommitClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl CommitClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> DateTime<Utc> {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Utc::now();
        let stamp = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

/// Fixed-width RFC 3339 form so stored timestamps sort lexically
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Apply transforms to a locally held document
pub fn apply_transforms(
    doc: &mut Document,
    transforms: &[FieldTransform],
    commit_time: DateTime<Utc>,
) -> Result<()> {
    for transform in transforms {
        match transform {
            FieldTransform::ServerTimestamp(field) => {
                doc.insert(field.clone(), Value::String(format_timestamp(commit_time)));
            }
            FieldTransform::Increment(field, by) => {
                let current = match doc.get(field) {
                    None | Some(Value::Null) => 0,
                    Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
                        Error::Store(format!("field '{field}' is not an integer"))
                    })?,
                    Some(other) => {
                        return Err(Error::Store(format!(
                            "cannot increment non-numeric field '{field}': {other}"
                        )))
                    }
                };
                doc.insert(field.clone(), Value::from(current + by));
            }
        }
    }
    Ok(())
}
