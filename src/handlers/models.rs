use super::{error_payload, ToolHandlers};
use crate::types::{ModelKind, ModelPerformance, NewModel};
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelArgs {
    #[schemars(description = "Model name")]
    pub name: String,
    #[schemars(description = "Architecture: CNN, LSTM, HMM, Ensemble, Transformer or RL")]
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sharpe_ratio: Option<f64>,
    #[schemars(description = "Win rate in percent")]
    #[serde(default)]
    pub win_rate: Option<f64>,
    #[schemars(description = "Maximum drawdown in percent")]
    #[serde(default)]
    pub max_drawdown: Option<f64>,
    #[schemars(description = "Id of the registering user")]
    pub user_id: String,
}

impl ToolHandlers {
    pub async fn handle_create_model(&self, args: CreateModelArgs) -> Result<String> {
        let kind: ModelKind = match args.kind.parse() {
            Ok(kind) => kind,
            Err(e) => return error_payload(e),
        };
        let payload = NewModel {
            name: args.name,
            kind,
            description: args.description,
            performance: ModelPerformance {
                sharpe_ratio: args.sharpe_ratio,
                win_rate: args.win_rate,
                max_drawdown: args.max_drawdown,
            },
        };

        match self.dashboard.repository().create_model(&payload, &args.user_id).await {
            Ok(id) => Ok(json!({ "id": id, "message": format!("Registered model '{}'", payload.name) }).to_string()),
            Err(e) => error_payload(e),
        }
    }

    pub async fn handle_list_models(&self) -> Result<String> {
        let models = self.dashboard.repository().list_models().await?;
        Ok(json!({ "total": models.len(), "models": models }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{handlers, parse};

    fn args(kind: &str, win_rate: Option<f64>) -> CreateModelArgs {
        CreateModelArgs {
            name: "Regime HMM".to_string(),
            kind: kind.to_string(),
            description: String::new(),
            sharpe_ratio: Some(1.1),
            win_rate,
            max_drawdown: None,
            user_id: "uid-7".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_models() {
        let handlers = handlers();
        let created = parse(&handlers.handle_create_model(args("hmm", Some(51.0))).await.unwrap());
        assert!(created["id"].is_string());

        let listed = parse(&handlers.handle_list_models().await.unwrap());
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["models"][0]["type"], "HMM");
        assert_eq!(listed["models"][0]["createdBy"], "uid-7");
        assert!(listed["models"][0]["performance"]["maxDrawdown"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_models_report_errors() {
        let handlers = handlers();
        let unknown = parse(&handlers.handle_create_model(args("GAN", None)).await.unwrap());
        assert!(unknown["error"].as_str().unwrap().contains("unknown model type"));

        let out_of_range = parse(&handlers.handle_create_model(args("RL", Some(250.0))).await.unwrap());
        assert!(out_of_range["error"].is_string());

        let listed = parse(&handlers.handle_list_models().await.unwrap());
        assert_eq!(listed["total"], 0);
    }
}
