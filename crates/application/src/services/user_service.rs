use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    DomainError, RepositoryError, User, UserEmail, UserId, UserRepository, Username,
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::{to_user_response_list, CreateUserRequest, CreateUserResponse, UserResponse},
    error::ApplicationError,
    lookup::UserLookup,
    password::PasswordHasher,
};

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<CreateUserResponse, ApplicationError> {
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;
        if request.password.trim().is_empty() {
            return Err(DomainError::invalid_argument("password", "cannot be empty").into());
        }

        if self
            .deps
            .user_repository
            .find_by_email(email.clone())
            .await?
            .is_some()
            || self
                .deps
                .user_repository
                .find_by_username(username.clone())
                .await?
                .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let user = User::register(
            UserId::from(Uuid::new_v4()),
            request.name,
            username,
            email,
            password_hash,
            self.deps.clock.now(),
        )?;

        // 并发注册的冲突由唯一约束报告
        let stored = self
            .deps
            .user_repository
            .create(user)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => ApplicationError::from(DomainError::UserAlreadyExists),
                other => ApplicationError::from(other),
            })?;
        tracing::info!(user_id = %stored.id, username = %stored.username, "用户已创建");

        Ok(CreateUserResponse::from(&stored))
    }

    pub async fn get_user_by_id(&self, id: UserId) -> Result<UserResponse, ApplicationError> {
        let user = self.find_active(id).await?;
        Ok(UserResponse::from(&user))
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ApplicationError> {
        let users = self.deps.user_repository.list_active().await?;
        Ok(to_user_response_list(&users))
    }

    /// 软删除用户，之后的查询都视为不存在
    pub async fn delete_user(&self, id: UserId) -> Result<(), ApplicationError> {
        let mut user = self.find_active(id).await?;
        user.soft_delete(self.deps.clock.now());
        self.deps.user_repository.update(user).await?;

        tracing::info!(user_id = %id, "用户已删除");
        Ok(())
    }

    async fn find_active(&self, id: UserId) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_id(id)
            .await?
            .filter(|user| !user.is_deleted())
            .ok_or_else(|| DomainError::user_not_found(id).into())
    }
}

#[async_trait]
impl UserLookup for UserService {
    async fn get_user_by_id(&self, id: UserId) -> Result<UserResponse, ApplicationError> {
        UserService::get_user_by_id(self, id).await
    }
}
