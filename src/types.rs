use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded document with its embedded chunks, stored denormalized
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "unknown_type")]
    pub file_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub chunk_count: usize,
    #[serde(default)]
    pub chunks: Vec<ResourceChunk>,
    #[serde(default)]
    pub metadata: ResourceMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn unknown_type() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChunk {
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    #[serde(default)]
    pub processing_status: String,
    #[serde(default)]
    pub embedding_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: u64,
    pub uploaded_by: String,
    pub text: String,
    pub chunk_count: usize,
    pub chunks: Vec<ResourceChunk>,
    pub metadata: ResourceMetadata,
}

impl NewResource {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("resource name is required".to_string()));
        }
        if self.chunk_count != self.chunks.len() {
            return Err(Error::Validation(format!(
                "chunkCount is {} but {} chunks were supplied",
                self.chunk_count,
                self.chunks.len()
            )));
        }
        if let Some(chunk) = self.chunks.iter().find(|c| c.embedding.is_empty()) {
            return Err(Error::Validation(format!(
                "chunk {} has an empty embedding",
                chunk.index
            )));
        }
        Ok(())
    }
}

/// Model architecture families tracked by the desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "CNN")]
    Cnn,
    #[serde(rename = "LSTM")]
    Lstm,
    #[serde(rename = "HMM")]
    Hmm,
    Ensemble,
    Transformer,
    #[serde(rename = "RL")]
    Rl,
}

impl ModelKind {
    pub fn all() -> &'static [ModelKind] {
        &[
            ModelKind::Cnn,
            ModelKind::Lstm,
            ModelKind::Hmm,
            ModelKind::Ensemble,
            ModelKind::Transformer,
            ModelKind::Rl,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Cnn => "CNN",
            ModelKind::Lstm => "LSTM",
            ModelKind::Hmm => "HMM",
            ModelKind::Ensemble => "Ensemble",
            ModelKind::Transformer => "Transformer",
            ModelKind::Rl => "RL",
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ModelKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation(format!("unknown model type '{s}'")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPerformance {
    #[serde(default)]
    pub sharpe_ratio: Option<f64>,
    /// Percentage
    #[serde(default)]
    pub win_rate: Option<f64>,
    /// Percentage
    #[serde(default)]
    pub max_drawdown: Option<f64>,
}

impl ModelPerformance {
    fn validate(&self) -> Result<()> {
        let figures = [
            ("sharpeRatio", self.sharpe_ratio),
            ("winRate", self.win_rate),
            ("maxDrawdown", self.max_drawdown),
        ];
        for (field, value) in figures {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(Error::Validation(format!("{field} must be a finite number")));
                }
            }
        }
        for (field, value) in [("winRate", self.win_rate), ("maxDrawdown", self.max_drawdown)] {
            if let Some(v) = value {
                if !(0.0..=100.0).contains(&v) {
                    return Err(Error::Validation(format!(
                        "{field} is a percentage, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub performance: ModelPerformance,
    #[serde(default)]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub description: String,
    pub performance: ModelPerformance,
}

impl NewModel {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("model name is required".to_string()));
        }
        self.performance.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comments: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Text sent for embedding and topic discovery
    pub fn search_text(&self) -> String {
        idea_text(&self.title, &self.description)
    }
}

pub fn idea_text(title: &str, description: &str) -> String {
    format!("{title}\n{description}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    pub embedding: Option<Vec<f32>>,
    pub topic: Option<String>,
}

impl NewIdea {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("idea title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(Error::Validation("idea description is required".to_string()));
        }
        Ok(())
    }
}

/// Editable idea fields. Likes, author and creation time are not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl IdeaPatch {
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.is_none() && self.description.is_none() && self.topic.is_none() {
            return Err(Error::Validation("idea patch is empty".to_string()));
        }
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(Error::Validation("idea title cannot be blank".to_string()));
        }
        if matches!(&self.description, Some(d) if d.trim().is_empty()) {
            return Err(Error::Validation("idea description cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// One question/answer exchange with the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub source_resources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub source_resources: Vec<String>,
}

impl NewChat {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation("chat user id is required".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(Error::Validation("chat message is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// Record counts per collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total_resources: usize,
    pub total_models: usize,
    pub total_ideas: usize,
    pub total_chats: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub resources: usize,
    pub models: usize,
    pub ideas: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource_payload() -> NewResource {
        NewResource {
            name: "notes.txt".to_string(),
            file_type: "txt".to_string(),
            size: 12,
            uploaded_by: "ana@desk.io".to_string(),
            text: "alpha beta".to_string(),
            chunk_count: 1,
            chunks: vec![ResourceChunk {
                index: 0,
                text: "alpha beta".to_string(),
                embedding: vec![0.1, 0.2],
            }],
            metadata: ResourceMetadata {
                processing_status: "completed".to_string(),
                embedding_model: "gemini-embedding-001".to_string(),
            },
        }
    }

    #[test]
    fn test_resource_payload_shape() {
        let value = serde_json::to_value(resource_payload()).unwrap();
        assert_eq!(value["type"], "txt");
        assert_eq!(value["uploadedBy"], "ana@desk.io");
        assert_eq!(value["chunkCount"], 1);
        assert_eq!(value["chunks"][0]["index"], 0);
        assert_eq!(value["metadata"]["processingStatus"], "completed");
        assert_eq!(value["metadata"]["embeddingModel"], "gemini-embedding-001");
        assert!(value.get("id").is_none());
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn test_resource_chunk_count_must_match() {
        let mut payload = resource_payload();
        payload.chunk_count = 3;
        assert!(matches!(payload.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_resource_rejects_empty_embedding() {
        let mut payload = resource_payload();
        payload.chunks[0].embedding.clear();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_model_payload_keeps_null_performance() {
        let payload = NewModel {
            name: "Momentum LSTM".to_string(),
            kind: ModelKind::Lstm,
            description: String::new(),
            performance: ModelPerformance {
                sharpe_ratio: Some(1.4),
                win_rate: None,
                max_drawdown: None,
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "LSTM");
        assert_eq!(value["performance"]["sharpeRatio"], 1.4);
        assert!(value["performance"]["winRate"].is_null());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_model_rejects_out_of_range_percentages() {
        let payload = NewModel {
            name: "Mean reversion".to_string(),
            kind: ModelKind::Hmm,
            description: String::new(),
            performance: ModelPerformance {
                sharpe_ratio: None,
                win_rate: Some(140.0),
                max_drawdown: None,
            },
        };
        assert!(payload.validate().is_err());

        let nan = NewModel {
            performance: ModelPerformance {
                sharpe_ratio: Some(f64::NAN),
                ..ModelPerformance::default()
            },
            ..payload
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("transformer".parse::<ModelKind>().unwrap(), ModelKind::Transformer);
        assert_eq!("RL".parse::<ModelKind>().unwrap(), ModelKind::Rl);
        assert!("GAN".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_idea_requires_title_and_description() {
        let idea = NewIdea {
            title: "Carry trade".to_string(),
            description: "  ".to_string(),
            embedding: None,
            topic: None,
        };
        assert!(idea.validate().is_err());
    }

    #[test]
    fn test_idea_patch_shape() {
        let patch = IdeaPatch::topic("0_rates_carry");
        assert!(patch.validate().is_ok());
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"topic": "0_rates_carry"}));

        assert!(IdeaPatch::default().validate().is_err());
    }

    #[test]
    fn test_idea_decodes_with_defaults() {
        let idea: Idea = serde_json::from_value(json!({
            "id": "abc",
            "title": "Vol surface",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(idea.likes, 0);
        assert!(idea.topic.is_none());
        assert_eq!(idea.search_text(), "Vol surface\n");
    }
}
