use super::{Repository, MODELS};
use crate::types::{Model, NewModel};
use crate::{Error, Result};
use serde_json::Value;

impl Repository {
    pub async fn create_model(&self, payload: &NewModel, user_id: &str) -> Result<String> {
        payload.validate()?;
        if user_id.trim().is_empty() {
            return Err(Error::Validation("model author is required".to_string()));
        }

        let mut fields = crate::store::to_document(payload)?;
        fields.insert("createdBy".to_string(), Value::String(user_id.to_string()));
        self.create_stamped(MODELS, &fields).await
    }

    pub async fn list_models(&self) -> Result<Vec<Model>> {
        self.list_newest_first(MODELS).await
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::memory_repository;
    use crate::types::{ModelKind, ModelPerformance, NewModel};

    fn payload(name: &str, kind: ModelKind) -> NewModel {
        NewModel {
            name: name.to_string(),
            kind,
            description: "intraday signals".to_string(),
            performance: ModelPerformance {
                sharpe_ratio: Some(1.8),
                win_rate: Some(54.5),
                max_drawdown: Some(12.0),
            },
        }
    }

    #[tokio::test]
    async fn test_create_model_records_author() {
        let repo = memory_repository();
        repo.create_model(&payload("Vol LSTM", ModelKind::Lstm), "uid-7")
            .await
            .unwrap();

        let models = repo.list_models().await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].created_by, "uid-7");
        assert_eq!(models[0].kind, ModelKind::Lstm);
        assert_eq!(models[0].performance.win_rate, Some(54.5));
    }

    #[tokio::test]
    async fn test_models_newest_first() {
        let repo = memory_repository();
        repo.create_model(&payload("old", ModelKind::Cnn), "u").await.unwrap();
        repo.create_model(&payload("new", ModelKind::Rl), "u").await.unwrap();

        let names: Vec<String> = repo.list_models().await.unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_model_requires_author() {
        let repo = memory_repository();
        assert!(repo.create_model(&payload("x", ModelKind::Hmm), " ").await.is_err());
        assert!(repo.list_models().await.unwrap().is_empty());
    }
}
