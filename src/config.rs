use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend API used by the dashboard
    pub backend: BackendConfig,

    /// Document store selection
    pub store: StoreConfig,

    /// Gemini embedding and generation
    pub gemini: GeminiConfig,

    /// Backend service listener
    pub server: ServerConfig,

    /// Chunking and retrieval
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    Memory,
    Sled,
    Firestore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub provider: StoreProvider,
    pub data_dir: PathBuf,
    pub firestore: FirestoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: Option<String>,
    pub database: String,
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    /// `None` keeps the model's native vector size
    pub embedding_dimensions: Option<usize>,
    pub chat_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_upload_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:5000".to_string(),
            },
            store: StoreConfig {
                provider: StoreProvider::Memory,
                data_dir: PathBuf::from("./data"),
                firestore: FirestoreConfig {
                    project_id: None,
                    database: "(default)".to_string(),
                    base_url: "https://firestore.googleapis.com/v1".to_string(),
                    bearer_token: None,
                    api_key: None,
                },
            },
            gemini: GeminiConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                embedding_model: "gemini-embedding-001".to_string(),
                embedding_dimensions: Some(768),
                chat_model: "gemini-2.0-flash".to_string(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                allowed_origins: vec![],
                max_upload_size: 25 * 1024 * 1024,
            },
            processing: ProcessingConfig {
                chunk_size: 300,
                chunk_overlap: 50,
                top_k: 3,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("BACKEND_URL") {
            config.backend.base_url = url;
        }

        // Store configuration
        if let Ok(provider) = std::env::var("STORE_PROVIDER") {
            config.store.provider = match provider.to_lowercase().as_str() {
                "memory" => StoreProvider::Memory,
                "sled" => StoreProvider::Sled,
                "firestore" => StoreProvider::Firestore,
                other => {
                    return Err(Error::Config(format!("Unknown STORE_PROVIDER '{other}'")));
                }
            };
        }

        if let Ok(data_dir) = std::env::var("DATA_DIR") {
            config.store.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(project_id) = std::env::var("FIRESTORE_PROJECT_ID") {
            config.store.firestore.project_id = Some(project_id);
        }

        if let Ok(database) = std::env::var("FIRESTORE_DATABASE") {
            config.store.firestore.database = database;
        }

        if let Ok(base_url) = std::env::var("FIRESTORE_BASE_URL") {
            config.store.firestore.base_url = base_url;
        }

        if let Ok(token) = std::env::var("FIRESTORE_TOKEN") {
            config.store.firestore.bearer_token = Some(token);
        }

        if let Ok(api_key) = std::env::var("FIRESTORE_API_KEY") {
            config.store.firestore.api_key = Some(api_key);
        }

        // Gemini
        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            config.gemini.api_key = Some(api_key);
        }

        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.gemini.base_url = base_url;
        }

        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.gemini.embedding_model = model;
        }

        // 0 requests the model's native size
        if let Some(dimensions) = parse_var::<usize>("EMBEDDING_DIMENSIONS")? {
            config.gemini.embedding_dimensions = (dimensions > 0).then_some(dimensions);
        }

        if let Ok(model) = std::env::var("CHAT_MODEL") {
            config.gemini.chat_model = model;
        }

        // Backend service
        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }

        if let Some(port) = parse_var::<u16>("PORT")? {
            config.server.port = port;
        }

        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.allowed_origins = split_list(&origins);
        }

        if let Some(size) = parse_var::<usize>("MAX_UPLOAD_SIZE")? {
            config.server.max_upload_size = size;
        }

        if let Some(size) = parse_var::<usize>("CHUNK_SIZE")? {
            config.processing.chunk_size = size;
        }

        if let Some(overlap) = parse_var::<usize>("CHUNK_OVERLAP")? {
            config.processing.chunk_overlap = overlap;
        }

        if let Some(top_k) = parse_var::<usize>("TOP_K")? {
            config.processing.top_k = top_k;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.processing.chunk_size == 0 {
            return Err(Error::Config("CHUNK_SIZE must be positive".to_string()));
        }
        if self.processing.chunk_overlap >= self.processing.chunk_size {
            return Err(Error::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.processing.chunk_overlap, self.processing.chunk_size
            )));
        }
        if self.processing.top_k == 0 {
            return Err(Error::Config("TOP_K must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for {name}: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
