//! Dashboard operations that combine the backend API with the repository

use crate::backend::{BackendApi, ChatReply, UploadFile};
use crate::error::UploadStep;
use crate::repository::Repository;
use crate::types::{
    idea_text, ChatMessage, IdeaPatch, NewIdea, NewResource, Overview, ResourceChunk,
    ResourceMetadata, Role,
};
use crate::{Error, Result};
use std::sync::Arc;

/// Topic assigned when discovery returns nothing
pub const DEFAULT_TOPIC: &str = "General";

const MIN_IDEAS_FOR_TOPICS: usize = 2;

#[derive(Clone)]
pub struct Dashboard {
    repo: Repository,
    backend: Arc<dyn BackendApi>,
    embedding_model: String,
}

impl Dashboard {
    pub fn new(repo: Repository, backend: Arc<dyn BackendApi>, embedding_model: impl Into<String>) -> Self {
        Self {
            repo,
            backend,
            embedding_model: embedding_model.into(),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn backend(&self) -> &Arc<dyn BackendApi> {
        &self.backend
    }

    /// Process, embed and persist an uploaded file. Returns the new resource id.
    pub async fn upload_resource(&self, file: &UploadFile, uploaded_by: &str) -> Result<String> {
        tracing::info!("[UPLOAD] Processing {}", file.file_name);
        let processed = self
            .backend
            .process_file(file)
            .await
            .map_err(Error::at_step(UploadStep::Process))?;

        tracing::info!(
            "[UPLOAD] Embedding {} chunks of {}",
            processed.chunks.len(),
            file.file_name
        );
        let embedded = self
            .backend
            .embed_resource(&processed.text, &processed.chunks)
            .await
            .map_err(Error::at_step(UploadStep::Embed))?;

        if embedded.total_embedded == 0 {
            tracing::warn!("[UPLOAD] No chunks of {} were embedded", file.file_name);
        }

        let chunks: Vec<ResourceChunk> = embedded
            .embedded_chunks
            .into_iter()
            .map(|c| ResourceChunk {
                index: c.index,
                text: c.text,
                embedding: c.embedding,
            })
            .collect();

        let payload = NewResource {
            name: file.file_name.clone(),
            file_type: processed.file_type,
            size: file.size(),
            uploaded_by: uploaded_by.to_string(),
            text: processed.text,
            chunk_count: chunks.len(),
            chunks,
            metadata: ResourceMetadata {
                processing_status: "completed".to_string(),
                embedding_model: self.embedding_model.clone(),
            },
        };

        let id = self
            .repo
            .create_resource(&payload)
            .await
            .map_err(Error::at_step(UploadStep::Persist))?;
        tracing::info!(
            "[UPLOAD] Stored {} as {} with {} chunks",
            file.file_name,
            id,
            payload.chunk_count
        );
        Ok(id)
    }

    /// Embed the idea text and store the idea without a topic
    pub async fn share_idea(&self, title: &str, description: &str, user_id: &str) -> Result<String> {
        let payload = NewIdea {
            title: title.to_string(),
            description: description.to_string(),
            embedding: None,
            topic: None,
        };
        payload.validate()?;

        let embedding = self.backend.embed(&idea_text(title, description)).await?;
        self.repo
            .create_idea(
                &NewIdea {
                    embedding: Some(embedding),
                    ..payload
                },
                user_id,
            )
            .await
    }

    /// Run topic discovery over every idea and label all of them with the
    /// leading topic. Returns `None` when there are too few ideas.
    pub async fn label_topics(&self) -> Result<Option<String>> {
        let ideas = self.repo.list_ideas().await?;
        if ideas.len() < MIN_IDEAS_FOR_TOPICS {
            tracing::info!("[TOPICS] Skipping topic discovery with {} ideas", ideas.len());
            return Ok(None);
        }

        let texts: Vec<String> = ideas.iter().map(|i| i.search_text()).collect();
        let topics = self.backend.topics(&texts).await?;
        let label = topics
            .first()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        for idea in &ideas {
            self.repo.update_idea(&idea.id, &IdeaPatch::topic(label.clone())).await?;
        }
        tracing::info!("[TOPICS] Labeled {} ideas as {}", ideas.len(), label);
        Ok(Some(label))
    }

    pub async fn ask(&self, message: &str, user_id: &str) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(Error::Validation("message is required".to_string()));
        }
        self.backend.chat(message, user_id).await
    }

    /// Chat history as alternating user and assistant messages, oldest first
    pub async fn conversation(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let chats = self.repo.list_my_chats(user_id).await?;
        let mut messages = Vec::with_capacity(chats.len() * 2);
        for chat in chats.into_iter().rev() {
            messages.push(ChatMessage {
                role: Role::User,
                content: chat.message,
                sources: Vec::new(),
            });
            messages.push(ChatMessage {
                role: Role::Assistant,
                content: chat.response,
                sources: chat.source_resources,
            });
        }
        Ok(messages)
    }

    pub async fn overview(&self) -> Result<Overview> {
        self.repo.overview().await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::backend::{EmbeddedChunk, EmbeddedResource, ProcessedFile, Topic};
    use crate::repository::test_support::memory_repository;
    use crate::types::CollectionStats;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Backend double: echoes uploads as text and embeds everything alike
    #[derive(Default)]
    pub struct MockBackend {
        pub fail_process: bool,
        pub fail_embed: bool,
        pub topics: Vec<Topic>,
        pub seen_texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BackendApi for MockBackend {
        async fn process_file(&self, file: &UploadFile) -> Result<ProcessedFile> {
            if self.fail_process {
                return Err(Error::Backend {
                    status: 400,
                    message: "No file provided".to_string(),
                });
            }
            let text = String::from_utf8_lossy(&file.bytes).to_string();
            Ok(ProcessedFile {
                chunks: vec![text.clone()],
                text,
                file_type: "txt".to_string(),
            })
        }

        async fn embed_resource(&self, _text: &str, chunks: &[String]) -> Result<EmbeddedResource> {
            if self.fail_embed {
                return Err(Error::Backend {
                    status: 500,
                    message: "quota exceeded".to_string(),
                });
            }
            let embedded_chunks: Vec<EmbeddedChunk> = chunks
                .iter()
                .enumerate()
                .map(|(index, text)| EmbeddedChunk {
                    index,
                    text: text.clone(),
                    embedding: vec![1.0, 0.0, 0.0],
                })
                .collect();
            Ok(EmbeddedResource {
                total_embedded: embedded_chunks.len(),
                embedded_chunks,
            })
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.seen_texts.lock().unwrap().push(text.to_string());
            Ok(vec![0.5, 0.5])
        }

        async fn chat(&self, message: &str, _user_id: &str) -> Result<ChatReply> {
            Ok(ChatReply {
                response: format!("re: {message}"),
                source_resources: vec!["notes.txt".to_string()],
            })
        }

        async fn topics(&self, texts: &[String]) -> Result<Vec<Topic>> {
            self.seen_texts.lock().unwrap().extend(texts.iter().cloned());
            Ok(self.topics.clone())
        }

        async fn stats(&self) -> Result<CollectionStats> {
            Ok(CollectionStats::default())
        }

        async fn resource_distribution(&self) -> Result<BTreeMap<String, usize>> {
            Ok(BTreeMap::new())
        }

        async fn health(&self) -> Result<bool> {
            Ok(true)
        }
    }

    pub fn dashboard(backend: MockBackend) -> Dashboard {
        Dashboard::new(memory_repository(), Arc::new(backend), "gemini-embedding-001")
    }
}
