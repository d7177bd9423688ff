//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、事务边界、
//! 以及对外部适配器（例如密码哈希、文件存储、通知推送）的抽象。

pub mod clock;
pub mod dto;
pub mod error;
pub mod file_store;
pub mod lookup;
pub mod notifier;
pub mod password;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dto::{
    ChatResponse, CreateGroupChatRequest, CreatePrivateChatRequest, CreateUserRequest,
    CreateUserResponse, FileResponse, UserResponse,
};
pub use error::ApplicationError;
pub use file_store::{FileStore, FileStoreError};
pub use lookup::UserLookup;
pub use notifier::{chat_topic, Notifier, NotifyError};
pub use password::{PasswordHasher, PasswordHasherError};
pub use services::{ChatService, ChatServiceDependencies, UserService, UserServiceDependencies};
