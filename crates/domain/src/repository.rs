//! 仓储接口定义
//!
//! 内层定义接口，外层（infrastructure）实现接口。

use async_trait::async_trait;

use crate::chat::Chat;
use crate::errors::RepositoryError;
use crate::user::User;
use crate::value_objects::{ChatId, UserEmail, UserId, Username};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> RepositoryResult<User>;
    async fn update(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: UserEmail) -> RepositoryResult<Option<User>>;
    async fn find_by_username(&self, username: Username) -> RepositoryResult<Option<User>>;
    /// 未删除的用户，按创建时间倒序
    async fn list_active(&self) -> RepositoryResult<Vec<User>>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// 插入或更新整个聊天聚合（聊天本身和成员列表）
    async fn save(&self, chat: Chat) -> RepositoryResult<Chat>;
    async fn find_by_id(&self, id: ChatId) -> RepositoryResult<Option<Chat>>;
    /// 用户参与的所有聊天，按最后消息时间倒序，从未发过消息的排在最后
    async fn find_all_by_user_id(&self, user_id: UserId) -> RepositoryResult<Vec<Chat>>;
}
