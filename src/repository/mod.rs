//! Data access for the desk's collections
//!
//! Every call is one independent request against the document store. Records
//! get their id from the store and their creation time from a server
//! timestamp, and lists come back newest first.

pub mod analytics;
pub mod chats;
pub mod ideas;
pub mod models;
pub mod resources;

use crate::store::{to_document, Direction, DocumentStore, FieldTransform, Query};
use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub const RESOURCES: &str = "resources";
pub const MODELS: &str = "models";
pub const IDEAS: &str = "ideas";
pub const CHATS: &str = "chats";

pub(crate) const CREATED_AT: &str = "createdAt";
pub(crate) const UPDATED_AT: &str = "updatedAt";

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create a record stamped with createdAt and updatedAt
    async fn create_stamped<T: Serialize>(&self, collection: &str, payload: &T) -> Result<String> {
        let fields = to_document(payload)?;
        let transforms = [
            FieldTransform::server_timestamp(CREATED_AT),
            FieldTransform::server_timestamp(UPDATED_AT),
        ];
        let id = self.store.add(collection, fields, &transforms).await?;
        tracing::info!("[STORE] Created {}/{} via {}", collection, id, self.store.provider_name());
        Ok(id)
    }

    /// List every record in a collection, newest first
    async fn list_newest_first<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let query = Query::new().order_by(CREATED_AT, Direction::Descending);
        self.list_where(collection, &query).await
    }

    async fn list_where<T: DeserializeOwned>(&self, collection: &str, query: &Query) -> Result<Vec<T>> {
        self.store
            .query(collection, query)
            .await?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    pub fn memory_repository() -> Repository {
        Repository::new(Arc::new(MemoryStore::new()))
    }
}
