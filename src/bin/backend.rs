use research_desk::chat::GeminiChat;
use research_desk::embeddings::{EmbeddingProvider, GeminiEmbedding};
use research_desk::server::{self, AppState};
use research_desk::{Config, Repository};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Research Desk backend");

    let config = Config::from_env()?;

    let store = research_desk::store::open_store(&config.store)?;
    let embedder = GeminiEmbedding::from_config(&config.gemini)?;
    tracing::info!(
        "Embedding provider initialized: {} ({})",
        embedder.provider_name(),
        embedder.model()
    );
    let chat = GeminiChat::from_config(&config.gemini)?;
    tracing::info!("Chat model: {}", config.gemini.chat_model);

    let state = AppState {
        repo: Repository::new(store),
        embedder: Arc::new(embedder),
        chat: Arc::new(chat),
        processing: config.processing.clone(),
    };

    server::serve(&config, state).await?;
    Ok(())
}
