use async_trait::async_trait;
use domain::UserId;

use crate::{dto::UserResponse, error::ApplicationError};

/// 按ID查询用户，找不到时返回 `DomainError::UserNotFound`
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get_user_by_id(&self, id: UserId) -> Result<UserResponse, ApplicationError>;
}
