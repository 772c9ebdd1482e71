//! HTTP client for the backend API

use super::{
    BackendApi, ChatReply, ChatRequest, DistributionResponse, EmbedRequest, EmbedResourceRequest,
    EmbedResponse, EmbeddedResource, ErrorBody, HealthResponse, ProcessedFile, StatsResponse,
    Topic, TopicsRequest, TopicsResponse, UploadFile,
};
use crate::types::CollectionStats;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| if body.is_empty() { status.to_string() } else { body });
            return Err(Error::Backend {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn post_json<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.client.post(self.endpoint(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.endpoint(path)).send().await?;
        Self::decode(response).await
    }
}

/// Drop trailing slashes so endpoint paths can be appended directly
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn process_file(&self, file: &UploadFile) -> Result<ProcessedFile> {
        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        let form = Form::new().part("file", part);

        tracing::info!("[BACKEND] Uploading {} ({} bytes) for processing", file.file_name, file.size());
        let response = self
            .client
            .post(self.endpoint("/api/process-file"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn embed_resource(&self, text: &str, chunks: &[String]) -> Result<EmbeddedResource> {
        let request = EmbedResourceRequest {
            text: Some(text.to_string()),
            chunks: chunks.to_vec(),
        };
        self.post_json("/api/embed-resource", &request).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            text: text.to_string(),
        };
        let response: EmbedResponse = self.post_json("/api/embed", &request).await?;
        Ok(response.embedding)
    }

    async fn chat(&self, message: &str, user_id: &str) -> Result<ChatReply> {
        let request = ChatRequest {
            message: message.to_string(),
            user_id: Some(user_id.to_string()),
        };
        self.post_json("/api/chat", &request).await
    }

    async fn topics(&self, texts: &[String]) -> Result<Vec<Topic>> {
        let request = TopicsRequest {
            texts: texts.to_vec(),
        };
        let response: TopicsResponse = self.post_json("/api/topics", &request).await?;
        Ok(response.topics)
    }

    async fn stats(&self) -> Result<CollectionStats> {
        let response: StatsResponse = self.get_json("/api/analytics/stats").await?;
        Ok(response.stats)
    }

    async fn resource_distribution(&self) -> Result<BTreeMap<String, usize>> {
        let response: DistributionResponse =
            self.get_json("/api/analytics/resource-distribution").await?;
        Ok(response.distribution)
    }

    async fn health(&self) -> Result<bool> {
        let response: HealthResponse = self.get_json("/api/health").await?;
        Ok(response.status == "ok")
    }
}
