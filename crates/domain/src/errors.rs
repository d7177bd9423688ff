//! 领域模型错误定义
//!
//! 定义了领域层可能出现的错误类型，提供清晰的错误上下文。

use thiserror::Error;

use crate::value_objects::{ChatId, UserId};

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 参数校验失败
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 用户不存在
    #[error("user not found: {id}")]
    UserNotFound { id: UserId },

    /// 聊天不存在
    #[error("chat not found: {id}")]
    ChatNotFound { id: ChatId },

    /// 成员列表中出现重复的用户ID（包括与自己创建私聊）
    #[error("duplicated id: {id}")]
    DuplicateIdentifier { id: UserId },

    /// 用户名或邮箱已被占用
    #[error("user already exists")]
    UserAlreadyExists,
}

impl DomainError {
    /// 创建参数校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn user_not_found(id: UserId) -> Self {
        Self::UserNotFound { id }
    }

    pub fn chat_not_found(id: ChatId) -> Self {
        Self::ChatNotFound { id }
    }

    pub fn duplicate_identifier(id: UserId) -> Self {
        Self::DuplicateIdentifier { id }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 仓储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record conflict")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
