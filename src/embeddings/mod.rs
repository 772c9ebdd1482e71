
pub mod gemini;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model(&self) -> &str;

    fn provider_name(&self) -> &str;
}

pub use gemini::GeminiEmbedding;
