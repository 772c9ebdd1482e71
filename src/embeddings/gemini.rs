//! Gemini embedding provider

use crate::config::GeminiConfig;
use crate::{Error, Result};
use super::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

/// Vector size requested from the API unless configured otherwise
pub const DEFAULT_DIMENSIONS: usize = 768;

pub struct GeminiEmbedding {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: Option<usize>,
    max_chars: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbedding {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "gemini-embedding-001".to_string());
        let base_url = base_url
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());

        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            dimensions: Some(DEFAULT_DIMENSIONS),
            max_chars: 2048 * 4,
        }
    }

    /// Requested output size; `None` leaves the model's native size
    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is required".to_string()))?;
        Ok(Self::new(
            api_key,
            Some(config.embedding_model.clone()),
            Some(config.base_url.clone()),
        )
        .with_dimensions(config.embedding_dimensions))
    }

    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    fn request_for(&self, text: &str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: self.model_path(),
            content: Content {
                parts: vec![Part {
                    text: self.preprocess_text(text),
                }],
            },
            task_type: TASK_TYPE,
            output_dimensionality: self.dimensions,
        }
    }

    fn preprocess_text(&self, text: &str) -> String {
        if text.chars().count() > self.max_chars {
            text.chars().take(self.max_chars).collect()
        } else {
            text.to_string()
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/{}:{}", self.base_url, self.model_path(), method);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Embedding(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::Embedding("Cannot embed empty text".to_string()));
        }

        let response: EmbedContentResponse = self.post("embedContent", &self.request_for(text)).await?;
        if response.embedding.values.is_empty() {
            return Err(Error::Embedding("Empty embedding received".to_string()));
        }
        tracing::debug!("[EMBED] {} chars -> {} dims", text.len(), response.embedding.values.len());
        Ok(response.embedding.values)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}
