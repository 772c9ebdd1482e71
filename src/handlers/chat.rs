use super::{error_payload, ToolHandlers};
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskArgs {
    #[schemars(description = "Question for the team knowledge base")]
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryArgs {
    pub user_id: String,
}

impl ToolHandlers {
    pub async fn handle_ask(&self, args: AskArgs) -> Result<String> {
        match self.dashboard.ask(&args.message, &args.user_id).await {
            Ok(reply) => Ok(serde_json::to_string(&reply)?),
            Err(e) => error_payload(e),
        }
    }

    pub async fn handle_chat_history(&self, args: ChatHistoryArgs) -> Result<String> {
        let messages = self.dashboard.conversation(&args.user_id).await?;
        Ok(json!({ "messages": messages }).to_string())
    }

    pub async fn handle_overview(&self) -> Result<String> {
        let overview = self.dashboard.overview().await?;
        Ok(serde_json::to_string(&overview)?)
    }
}
