use super::{Repository, CHATS};
use crate::store::{to_document, Direction, FieldTransform, Query};
use crate::types::{Chat, NewChat};
use crate::Result;

const TIMESTAMP: &str = "timestamp";

impl Repository {
    pub async fn record_chat(&self, payload: &NewChat) -> Result<String> {
        payload.validate()?;
        let fields = to_document(payload)?;
        let id = self
            .store
            .add(CHATS, fields, &[FieldTransform::server_timestamp(TIMESTAMP)])
            .await?;
        tracing::info!("[STORE] Recorded chat {} for user {}", id, payload.user_id);
        Ok(id)
    }

    /// Chat history of one user, newest first
    pub async fn list_my_chats(&self, user_id: &str) -> Result<Vec<Chat>> {
        let query = Query::new()
            .where_eq("userId", user_id)
            .order_by(TIMESTAMP, Direction::Descending);
        self.list_where(CHATS, &query).await
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::memory_repository;
    use crate::types::NewChat;

    fn chat(user: &str, message: &str) -> NewChat {
        NewChat {
            user_id: user.to_string(),
            message: message.to_string(),
            response: format!("answer to {message}"),
            source_resources: vec!["q3-notes.pdf".to_string()],
        }
    }

    #[tokio::test]
    async fn test_list_my_chats_filters_by_user() {
        let repo = memory_repository();
        repo.record_chat(&chat("alice", "first")).await.unwrap();
        repo.record_chat(&chat("bob", "other")).await.unwrap();
        repo.record_chat(&chat("alice", "second")).await.unwrap();

        let messages: Vec<String> = repo
            .list_my_chats("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.message)
            .collect();
        assert_eq!(messages, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_chat_requires_message() {
        let repo = memory_repository();
        assert!(repo.record_chat(&chat("alice", "")).await.is_err());
        assert!(repo.list_my_chats("alice").await.unwrap().is_empty());
    }
}
