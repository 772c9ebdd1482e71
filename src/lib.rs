pub mod backend;
pub mod chat;
pub mod dashboard;
pub mod embeddings;
pub mod handlers;
pub mod ingest;
pub mod repository;
pub mod search;
pub mod server;
pub mod store;
pub mod topics;

pub mod error;
pub mod types;
pub mod config;

pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use dashboard::Dashboard;
pub use repository::Repository;
