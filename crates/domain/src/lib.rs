//! 聊天管理核心领域模型
//!
//! 包含用户、聊天、文件引用等核心实体，以及仓储接口和领域错误。

pub mod chat;
pub mod errors;
pub mod file;
pub mod repository;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use chat::{append_unique_member, sort_by_last_message_sent, Chat, ChatStatus};
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use file::{FileRecord, FileUpload};
pub use repository::{ChatRepository, RepositoryResult, UserRepository};
pub use user::User;
pub use value_objects::{ChatId, FileId, PasswordHash, Timestamp, UserEmail, UserId, Username};

#[cfg(feature = "testing")]
pub use repository::{MockChatRepository, MockUserRepository};
