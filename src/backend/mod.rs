//! Backend API used by the dashboard for file processing, embedding and chat
//!
//! The wire types here are shared by the HTTP client and the backend service.

pub mod http;

use crate::types::CollectionStats;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub use http::HttpBackend;

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| crate::Error::Validation(format!("not a file: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub text: String,
    pub file_type: String,
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResourceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedResource {
    pub embedded_chunks: Vec<EmbeddedChunk>,
    pub total_embedded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub source_resources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsRequest {
    #[serde(default)]
    pub texts: Vec<String>,
}

/// A discovered topic; `name` is `<topic_id>_<keyword>_<keyword>...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: i64,
    pub name: String,
    pub count: usize,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsResponse {
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: CollectionStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionResponse {
    pub distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Extract text from a file and split it into chunks
    async fn process_file(&self, file: &UploadFile) -> Result<ProcessedFile>;

    async fn embed_resource(&self, text: &str, chunks: &[String]) -> Result<EmbeddedResource>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Ask the knowledge base; the backend records the exchange
    async fn chat(&self, message: &str, user_id: &str) -> Result<ChatReply>;

    async fn topics(&self, texts: &[String]) -> Result<Vec<Topic>>;

    async fn stats(&self) -> Result<CollectionStats>;

    async fn resource_distribution(&self) -> Result<BTreeMap<String, usize>>;

    async fn health(&self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        let processed: ProcessedFile = serde_json::from_value(json!({
            "text": "hello",
            "fileType": "txt",
            "chunks": ["hello"]
        }))
        .unwrap();
        assert_eq!(processed.file_type, "txt");

        let embedded: EmbeddedResource = serde_json::from_value(json!({
            "embeddedChunks": [{"index": 2, "text": "t", "embedding": [0.1]}],
            "totalEmbedded": 1
        }))
        .unwrap();
        assert_eq!(embedded.embedded_chunks[0].index, 2);

        let request = ChatRequest {
            message: "why".to_string(),
            user_id: Some("u1".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"message": "why", "userId": "u1"})
        );

        let stats = StatsResponse {
            stats: CollectionStats {
                total_resources: 1,
                ..CollectionStats::default()
            },
        };
        assert_eq!(serde_json::to_value(&stats).unwrap()["stats"]["totalResources"], 1);
    }

    #[tokio::test]
    async fn test_upload_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "signals.csv");
        assert_eq!(file.size(), 8);
    }
}
