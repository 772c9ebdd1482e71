//! Document storage using Sled embedded database
//!
//! One tree per collection, documents stored as JSON keyed by id. Used for
//! local runs that should survive restarts without a managed database.

use super::{
    apply_transforms, new_document_id, CommitClock, Document, DocumentStore, FieldTransform,
    Query, StoredDocument,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;

pub struct SledStore {
    db: sled::Db,
    clock: CommitClock,
}

impl SledStore {
    /// Create or open the store under a data directory
    pub fn open(data_dir: &Path) -> Result<Self> {
        let db_path = data_dir.join("documents");
        std::fs::create_dir_all(data_dir)?;

        let db = sled::open(&db_path)?;
        Ok(Self {
            db,
            clock: CommitClock::new(),
        })
    }

    fn tree(&self, collection: &str) -> Result<sled::Tree> {
        Ok(self.db.open_tree(collection.as_bytes())?)
    }

    fn decode(bytes: &[u8]) -> Result<Document> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SledStore {
    async fn add(
        &self,
        collection: &str,
        mut fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<String> {
        let tree = self.tree(collection)?;
        let id = new_document_id();
        apply_transforms(&mut fields, transforms, self.clock.tick())?;

        let value = serde_json::to_vec(&fields)?;
        tree.insert(id.as_bytes(), value)?;

        tracing::debug!("[STORE] sled insert {}/{}", collection, id);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let tree = self.tree(collection)?;
        match tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<()> {
        let tree = self.tree(collection)?;

        // Compare-and-swap loop so concurrent increments are not lost
        loop {
            let current = tree
                .get(id.as_bytes())?
                .ok_or_else(|| Error::not_found(collection, id))?;

            let mut merged = Self::decode(&current)?;
            merged.extend(fields.clone());
            apply_transforms(&mut merged, transforms, self.clock.tick())?;
            let next = serde_json::to_vec(&merged)?;

            match tree.compare_and_swap(id.as_bytes(), Some(current), Some(next))? {
                Ok(()) => return Ok(()),
                Err(_) => {
                    tracing::debug!("[STORE] sled update raced on {}/{}, retrying", collection, id);
                }
            }
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let tree = self.tree(collection)?;
        tree.remove(id.as_bytes())?;
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        let tree = self.tree(collection)?;
        let mut docs = Vec::new();

        for entry in tree.iter() {
            let (key, value) = entry?;
            let id = String::from_utf8(key.to_vec())
                .map_err(|e| Error::Store(format!("invalid document key: {e}")))?;
            docs.push(StoredDocument {
                id,
                fields: Self::decode(&value)?,
            });
        }

        Ok(query.apply(docs))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.tree(collection)?.len())
    }

    fn provider_name(&self) -> &str {
        "sled"
    }
}
