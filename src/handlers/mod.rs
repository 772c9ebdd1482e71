//! Tool handlers behind the MCP server
//!
//! Each handler returns a JSON string. Validation problems and missing
//! records are reported as `{"error": ...}` payloads rather than failures.

pub mod chat;
pub mod ideas;
pub mod models;
pub mod resources;

pub use chat::{AskArgs, ChatHistoryArgs};
pub use ideas::{IdeaIdArgs, ShareIdeaArgs, UpdateIdeaArgs};
pub use models::CreateModelArgs;
pub use resources::{DeleteResourceArgs, UploadResourceArgs};

use crate::dashboard::Dashboard;
use crate::{Error, Result};
use std::path::PathBuf;

#[derive(Clone)]
pub struct ToolHandlers {
    dashboard: Dashboard,
}

impl ToolHandlers {
    pub fn new(dashboard: Dashboard) -> Self {
        Self { dashboard }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }
}

/// Turn user-facing errors into an error payload; anything else propagates
pub(crate) fn error_payload(err: Error) -> Result<String> {
    match err {
        Error::Validation(_) | Error::NotFound { .. } | Error::Upload { .. } | Error::Backend { .. } => {
            Ok(serde_json::json!({ "error": err.to_string() }).to_string())
        }
        other => Err(other),
    }
}

pub fn ensure_absolute_path(path: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(path);

    if path_buf.is_absolute() {
        Ok(path_buf)
    } else {
        let current_dir = std::env::current_dir()?;
        let absolute = current_dir.join(path_buf);

        tracing::warn!(
            "Relative path provided: '{}', resolved to absolute: '{}'",
            path,
            absolute.display()
        );

        Ok(absolute)
    }
}
