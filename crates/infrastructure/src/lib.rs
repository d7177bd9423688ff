//! 基础设施层实现。
//!
//! 提供数据库仓储、内存仓储、密码哈希、文件存储与主题推送等适配器，
//! 实现应用/领域层定义的接口。

pub mod builder;
pub mod file_store;
pub mod memory;
pub mod migrations;
pub mod notifier;
pub mod password;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureError, NotifierHandle};
pub use file_store::LocalFileStore;
pub use memory::{InMemoryChatRepository, InMemoryUserRepository};
pub use migrations::MIGRATOR;
pub use notifier::{LocalTopicNotifier, RedisNotifier, TopicMessage};
pub use password::BcryptPasswordHasher;
pub use repository::{create_pg_pool, PgChatRepository, PgStorage, PgUserRepository};
