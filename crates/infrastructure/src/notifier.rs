//! 主题推送适配器：进程内广播与 Redis 发布

use application::{Notifier, NotifyError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::broadcast;

/// 进程内推送的一条主题消息
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// 基于 tokio broadcast 的进程内推送，订阅方自行按主题过滤
#[derive(Clone)]
pub struct LocalTopicNotifier {
    sender: broadcast::Sender<TopicMessage>,
}

impl LocalTopicNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TopicMessage> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Notifier for LocalTopicNotifier {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), NotifyError> {
        // 没有订阅者时直接丢弃
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(TopicMessage {
                topic: topic.to_owned(),
                payload,
            })
            .map_err(|err| NotifyError::publish(err.to_string()))?;
        Ok(())
    }
}

/// 通过 Redis PUBLISH 推送，频道名即主题名
#[derive(Clone)]
pub struct RedisNotifier {
    connection: ConnectionManager,
}

impl RedisNotifier {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), NotifyError> {
        let message = serde_json::to_string(&payload)?;
        let mut connection = self.connection.clone();

        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(message)
            .query_async(&mut connection)
            .await
            .map_err(|err| NotifyError::publish(err.to_string()))?;

        tracing::debug!(topic = %topic, receivers, "Redis 推送完成");
        Ok(())
    }
}
