use async_trait::async_trait;
use domain::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("publish failed: {0}")]
    Publish(String),
}

impl NotifyError {
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish(message.into())
    }
}

/// 向订阅主题推送消息，不保证送达
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), NotifyError>;
}

/// 用户专属的聊天列表主题
pub fn chat_topic(user_id: UserId) -> String {
    format!("/topic/chats/{}", user_id)
}
