use super::{Repository, IDEAS, UPDATED_AT};
use crate::store::{to_document, FieldTransform};
use crate::types::{Idea, IdeaPatch, NewIdea};
use crate::{Error, Result};
use serde_json::Value;

impl Repository {
    /// New ideas start with no likes and no comments
    pub async fn create_idea(&self, payload: &NewIdea, user_id: &str) -> Result<String> {
        payload.validate()?;
        if user_id.trim().is_empty() {
            return Err(Error::Validation("idea author is required".to_string()));
        }

        let mut fields = to_document(payload)?;
        fields.insert("createdBy".to_string(), Value::String(user_id.to_string()));
        fields.insert("likes".to_string(), Value::from(0));
        fields.insert("comments".to_string(), Value::Array(Vec::new()));
        self.create_stamped(IDEAS, &fields).await
    }

    pub async fn list_ideas(&self) -> Result<Vec<Idea>> {
        self.list_newest_first(IDEAS).await
    }

    pub async fn update_idea(&self, id: &str, patch: &IdeaPatch) -> Result<()> {
        patch.validate()?;
        let fields = to_document(patch)?;
        self.store
            .update(IDEAS, id, fields, &[FieldTransform::server_timestamp(UPDATED_AT)])
            .await
    }

    /// Increment the like counter in a single atomic write
    pub async fn like_idea(&self, id: &str) -> Result<()> {
        self.store
            .update(IDEAS, id, Default::default(), &[FieldTransform::increment("likes", 1)])
            .await
    }

    pub async fn get_idea(&self, id: &str) -> Result<Idea> {
        let fields = self
            .store
            .get(IDEAS, id)
            .await?
            .ok_or_else(|| Error::not_found(IDEAS, id))?;
        crate::store::StoredDocument {
            id: id.to_string(),
            fields,
        }
        .decode()
    }
}
