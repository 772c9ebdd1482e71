use super::{Repository, CHATS, IDEAS, MODELS, RESOURCES};
use crate::store::Query;
use crate::types::{CollectionStats, Overview};
use crate::Result;
use std::collections::BTreeMap;

impl Repository {
    pub async fn stats(&self) -> Result<CollectionStats> {
        Ok(CollectionStats {
            total_resources: self.store.count(RESOURCES).await?,
            total_models: self.store.count(MODELS).await?,
            total_ideas: self.store.count(IDEAS).await?,
            total_chats: self.store.count(CHATS).await?,
        })
    }

    pub async fn overview(&self) -> Result<Overview> {
        Ok(Overview {
            resources: self.store.count(RESOURCES).await?,
            models: self.store.count(MODELS).await?,
            ideas: self.store.count(IDEAS).await?,
        })
    }

    /// Resource count per file type; resources without a type count as "other"
    pub async fn resource_distribution(&self) -> Result<BTreeMap<String, usize>> {
        let mut distribution = BTreeMap::new();
        for doc in self.store.query(RESOURCES, &Query::new()).await? {
            let file_type = doc
                .fields
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("other")
                .to_string();
            *distribution.entry(file_type).or_insert(0) += 1;
        }
        Ok(distribution)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::memory_repository;
    use crate::repository::RESOURCES;
    use crate::store::to_document;
    use serde_json::json;

    #[tokio::test]
    async fn test_distribution_counts_types() {
        let repo = memory_repository();
        for doc in [
            json!({"name": "a.pdf", "type": "pdf"}),
            json!({"name": "b.pdf", "type": "pdf"}),
            json!({"name": "c.csv", "type": "csv"}),
            json!({"name": "legacy"}),
        ] {
            repo.store()
                .add(RESOURCES, to_document(&doc).unwrap(), &[])
                .await
                .unwrap();
        }

        let distribution = repo.resource_distribution().await.unwrap();
        assert_eq!(distribution["pdf"], 2);
        assert_eq!(distribution["csv"], 1);
        assert_eq!(distribution["other"], 1);

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_resources, 4);
        assert_eq!(stats.total_chats, 0);
    }
}
