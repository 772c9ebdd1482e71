use super::{error_payload, ToolHandlers};
use crate::types::IdeaPatch;
use crate::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareIdeaArgs {
    pub title: String,
    pub description: String,
    #[schemars(description = "Id of the sharing user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIdeaArgs {
    #[schemars(description = "Idea id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdeaIdArgs {
    #[schemars(description = "Idea id")]
    pub id: String,
}

impl ToolHandlers {
    pub async fn handle_share_idea(&self, args: ShareIdeaArgs) -> Result<String> {
        match self
            .dashboard
            .share_idea(&args.title, &args.description, &args.user_id)
            .await
        {
            Ok(id) => Ok(json!({ "id": id, "message": format!("Shared idea '{}'", args.title) }).to_string()),
            Err(e) => error_payload(e),
        }
    }

    /// Ideas newest first, embeddings omitted
    pub async fn handle_list_ideas(&self) -> Result<String> {
        let ideas = self.dashboard.repository().list_ideas().await?;
        let summaries: Vec<_> = ideas
            .iter()
            .map(|idea| {
                json!({
                    "id": idea.id,
                    "title": idea.title,
                    "description": idea.description,
                    "topic": idea.topic,
                    "likes": idea.likes,
                    "createdBy": idea.created_by,
                    "createdAt": idea.created_at,
                })
            })
            .collect();
        Ok(json!({ "total": summaries.len(), "ideas": summaries }).to_string())
    }

    pub async fn handle_update_idea(&self, args: UpdateIdeaArgs) -> Result<String> {
        let patch = IdeaPatch {
            title: args.title,
            description: args.description,
            topic: args.topic,
        };
        match self.dashboard.repository().update_idea(&args.id, &patch).await {
            Ok(()) => Ok(json!({ "message": format!("Updated idea {}", args.id) }).to_string()),
            Err(e) => error_payload(e),
        }
    }

    pub async fn handle_like_idea(&self, args: IdeaIdArgs) -> Result<String> {
        let repo = self.dashboard.repository();
        if let Err(e) = repo.like_idea(&args.id).await {
            return error_payload(e);
        }
        let idea = repo.get_idea(&args.id).await?;
        Ok(json!({ "id": idea.id, "likes": idea.likes }).to_string())
    }

    pub async fn handle_label_topics(&self) -> Result<String> {
        match self.dashboard.label_topics().await? {
            Some(topic) => Ok(json!({ "topic": topic }).to_string()),
            None => Ok(json!({
                "message": "At least two ideas are needed before topics can be discovered"
            })
            .to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{handlers, parse};

    fn share(title: &str) -> ShareIdeaArgs {
        ShareIdeaArgs {
            title: title.to_string(),
            description: "curve steepener into the meeting".to_string(),
            user_id: "uid-3".to_string(),
        }
    }

    #[tokio::test]
    async fn test_share_like_and_update() {
        let handlers = handlers();
        let shared = parse(&handlers.handle_share_idea(share("Steepener")).await.unwrap());
        let id = shared["id"].as_str().unwrap().to_string();

        let liked = parse(&handlers.handle_like_idea(IdeaIdArgs { id: id.clone() }).await.unwrap());
        assert_eq!(liked["likes"], 1);

        handlers
            .handle_update_idea(UpdateIdeaArgs {
                id: id.clone(),
                title: None,
                description: None,
                topic: Some("rates".to_string()),
            })
            .await
            .unwrap();

        let listed = parse(&handlers.handle_list_ideas().await.unwrap());
        assert_eq!(listed["ideas"][0]["topic"], "rates");
        assert_eq!(listed["ideas"][0]["likes"], 1);
        assert!(listed["ideas"][0].get("embedding").is_none());
    }

    #[tokio::test]
    async fn test_missing_idea_and_empty_patch() {
        let handlers = handlers();
        let missing = parse(
            &handlers
                .handle_like_idea(IdeaIdArgs {
                    id: "nope".to_string(),
                })
                .await
                .unwrap(),
        );
        assert!(missing["error"].as_str().unwrap().contains("not found"));

        let empty = parse(
            &handlers
                .handle_update_idea(UpdateIdeaArgs {
                    id: "nope".to_string(),
                    title: None,
                    description: None,
                    topic: None,
                })
                .await
                .unwrap(),
        );
        assert!(empty["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_label_topics_needs_ideas() {
        let handlers = handlers();
        let skipped = parse(&handlers.handle_label_topics().await.unwrap());
        assert!(skipped["message"].is_string());

        handlers.handle_share_idea(share("One")).await.unwrap();
        handlers.handle_share_idea(share("Two")).await.unwrap();
        let labeled = parse(&handlers.handle_label_topics().await.unwrap());
        assert_eq!(labeled["topic"], "General");
    }
}
