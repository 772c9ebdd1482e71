use super::{Repository, RESOURCES};
use crate::types::{NewResource, Resource};
use crate::Result;

impl Repository {
    pub async fn create_resource(&self, payload: &NewResource) -> Result<String> {
        payload.validate()?;
        self.create_stamped(RESOURCES, payload).await
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        self.list_newest_first(RESOURCES).await
    }

    pub async fn remove_resource(&self, id: &str) -> Result<()> {
        self.store.delete(RESOURCES, id).await?;
        tracing::info!("[STORE] Removed {}/{}", RESOURCES, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::memory_repository;
    use crate::types::{NewResource, ResourceChunk, ResourceMetadata};
    use crate::Error;

    fn payload(name: &str) -> NewResource {
        NewResource {
            name: name.to_string(),
            file_type: "txt".to_string(),
            size: 10,
            uploaded_by: "kim@desk.io".to_string(),
            text: "some text".to_string(),
            chunk_count: 1,
            chunks: vec![ResourceChunk {
                index: 0,
                text: "some text".to_string(),
                embedding: vec![1.0, 0.0],
            }],
            metadata: ResourceMetadata {
                processing_status: "completed".to_string(),
                embedding_model: "gemini-embedding-001".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_resources_listed_newest_first() {
        let repo = memory_repository();
        repo.create_resource(&payload("first.txt")).await.unwrap();
        repo.create_resource(&payload("second.txt")).await.unwrap();
        repo.create_resource(&payload("third.txt")).await.unwrap();

        let names: Vec<String> = repo
            .list_resources()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["third.txt", "second.txt", "first.txt"]);
    }

    #[tokio::test]
    async fn test_created_resource_has_id_and_timestamps() {
        let repo = memory_repository();
        let id = repo.create_resource(&payload("a.txt")).await.unwrap();

        let listed = repo.list_resources().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].created_at, listed[0].updated_at);
        assert_eq!(listed[0].chunks[0].embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_invalid_resource_is_not_persisted() {
        let repo = memory_repository();
        let mut bad = payload("bad.txt");
        bad.chunk_count = 5;

        let err = repo.create_resource(&bad).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(repo.list_resources().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_resource() {
        let repo = memory_repository();
        let keep = repo.create_resource(&payload("keep.txt")).await.unwrap();
        let drop = repo.create_resource(&payload("drop.txt")).await.unwrap();

        repo.remove_resource(&drop).await.unwrap();
        let ids: Vec<String> = repo.list_resources().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![keep]);
    }
}
