use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::file_store::FileStoreError;
use crate::password::PasswordHasherError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("file store error: {0}")]
    FileStore(#[from] FileStoreError),
}

impl ApplicationError {
    /// 领域错误的快捷访问，便于调用方按错误种类分支
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(err) => Some(err),
            _ => None,
        }
    }
}
