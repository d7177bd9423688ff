//! 密码哈希端口，bcrypt 实现位于基础设施层

use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

/// 哈希计算失败，原因只进入日志和错误信息
#[derive(Debug, Error)]
#[error("password hashing failed: {reason}")]
pub struct PasswordHasherError {
    reason: String,
}

impl PasswordHasherError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// 明文在进入此方法前已经过非空校验
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError>;
}
