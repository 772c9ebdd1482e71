//! HTTP backend service: file processing, embeddings, chat and analytics

pub mod error;
pub mod routes;

use crate::chat::ChatModel;
use crate::config::{Config, ProcessingConfig, ServerConfig};
use crate::embeddings::EmbeddingProvider;
use crate::repository::Repository;
use crate::{Error, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub chat: Arc<dyn ChatModel>,
    pub processing: ProcessingConfig,
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| Error::Config(format!("Invalid CORS origin '{origin}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(routes::health))
        .route("/process-file", post(routes::process_file))
        .route("/embed-resource", post(routes::embed_resource))
        .route("/embed", post(routes::embed))
        .route("/chat", post(routes::chat))
        .route("/topics", post(routes::topics))
        .route("/analytics/stats", get(routes::stats))
        .route("/analytics/resource-distribution", get(routes::resource_distribution))
}

pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    Ok(Router::new()
        .nest("/api", api_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config)?))
}

pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid address: {e}")))?;

    let router = build_router(state, &config.server)?;

    tracing::info!("[SERVER] Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::repository::test_support::memory_repository;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Embeds texts mentioning "rates" along x, everything else along y
    pub struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("fail") {
                return Err(Error::Embedding("quota".to_string()));
            }
            if text.contains("rates") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }

        fn model(&self) -> &str {
            "keyword"
        }

        fn provider_name(&self) -> &str {
            "Test"
        }
    }

    #[derive(Default)]
    pub struct EchoChat {
        pub prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for EchoChat {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("grounded answer".to_string())
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    pub fn state() -> (AppState, Arc<EchoChat>) {
        let chat = Arc::new(EchoChat::default());
        let state = AppState {
            repo: memory_repository(),
            embedder: Arc::new(KeywordEmbedder),
            chat: chat.clone(),
            processing: Config::default().processing,
        };
        (state, chat)
    }
}
