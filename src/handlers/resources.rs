use super::{ensure_absolute_path, error_payload, ToolHandlers};
use crate::backend::UploadFile;
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResourceArgs {
    #[schemars(description = "Path of the file to upload (pdf, txt, csv or json)")]
    pub path: String,
    #[schemars(description = "Email of the uploading user")]
    pub uploaded_by: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResourceArgs {
    #[schemars(description = "Resource id")]
    pub id: String,
}

impl ToolHandlers {
    pub async fn handle_upload_resource(&self, args: UploadResourceArgs) -> Result<String> {
        let path = ensure_absolute_path(&args.path)?;
        if !path.is_file() {
            return Ok(json!({
                "error": format!("File does not exist: {}", path.display())
            })
            .to_string());
        }

        let file = UploadFile::from_path(&path).await?;
        match self.dashboard.upload_resource(&file, &args.uploaded_by).await {
            Ok(id) => Ok(json!({
                "id": id,
                "name": file.file_name,
                "message": format!("Uploaded '{}'", file.file_name)
            })
            .to_string()),
            Err(e) => error_payload(e),
        }
    }

    /// Resource summaries without chunk text or embeddings
    pub async fn handle_list_resources(&self) -> Result<String> {
        let resources = self.dashboard.repository().list_resources().await?;
        let summaries: Vec<_> = resources
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "name": r.name,
                    "type": r.file_type,
                    "size": r.size,
                    "uploadedBy": r.uploaded_by,
                    "chunkCount": r.chunk_count,
                    "status": r.metadata.processing_status,
                    "createdAt": r.created_at,
                })
            })
            .collect();
        Ok(json!({ "total": summaries.len(), "resources": summaries }).to_string())
    }

    pub async fn handle_delete_resource(&self, args: DeleteResourceArgs) -> Result<String> {
        match self.dashboard.repository().remove_resource(&args.id).await {
            Ok(()) => Ok(json!({ "message": format!("Deleted resource {}", args.id) }).to_string()),
            Err(e) => error_payload(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{handlers, parse};

    #[tokio::test]
    async fn test_upload_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.txt");
        std::fs::write(&path, "duration risk is rising").unwrap();

        let handlers = handlers();
        let uploaded = parse(
            &handlers
                .handle_upload_resource(UploadResourceArgs {
                    path: path.to_string_lossy().to_string(),
                    uploaded_by: "ana@desk.io".to_string(),
                })
                .await
                .unwrap(),
        );
        assert_eq!(uploaded["name"], "memo.txt");

        let listed = parse(&handlers.handle_list_resources().await.unwrap());
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["resources"][0]["id"], uploaded["id"]);
        assert_eq!(listed["resources"][0]["chunkCount"], 1);
        assert!(listed["resources"][0].get("chunks").is_none());
    }

    #[tokio::test]
    async fn test_upload_missing_file_reports_error() {
        let handlers = handlers();
        let payload = parse(
            &handlers
                .handle_upload_resource(UploadResourceArgs {
                    path: "/definitely/not/here.pdf".to_string(),
                    uploaded_by: "ana@desk.io".to_string(),
                })
                .await
                .unwrap(),
        );
        assert!(payload["error"].as_str().unwrap().contains("does not exist"));
    }
}
