//! In-process document store

use super::{
    apply_transforms, new_document_id, CommitClock, Document, DocumentStore, FieldTransform,
    Query, StoredDocument,
};
use crate::{Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Collections held in memory. Each collection is locked as a unit while a
/// write and its transforms are applied.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Document>>,
    clock: CommitClock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(
        &self,
        collection: &str,
        mut fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<String> {
        let id = new_document_id();
        apply_transforms(&mut fields, transforms, self.clock.tick())?;

        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<()> {
        let mut docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::not_found(collection, id))?;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| Error::not_found(collection, id))?;

        let mut merged = doc.clone();
        merged.extend(fields);
        apply_transforms(&mut merged, transforms, self.clock.tick())?;
        *doc = merged;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        let docs = match self.collections.get(collection) {
            Some(docs) => docs
                .iter()
                .map(|(id, fields)| StoredDocument {
                    id: id.clone(),
                    fields: fields.clone(),
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(query.apply(docs))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.collections.get(collection).map_or(0, |docs| docs.len()))
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}
