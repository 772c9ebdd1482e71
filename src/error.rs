use thiserror::Error;

/// Step of the resource upload pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Process,
    Embed,
    Persist,
}

impl std::fmt::Display for UploadStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UploadStep::Process => "process",
            UploadStep::Embed => "embed",
            UploadStep::Persist => "persist",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Upload failed at {step} step: {source}")]
    Upload {
        step: UploadStep,
        #[source]
        source: Box<Error>,
    },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Chat generation error: {0}")]
    Chat(String),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn at_step(step: UploadStep) -> impl FnOnce(Error) -> Error {
        move |source| Error::Upload {
            step,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
