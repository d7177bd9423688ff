use application::{PasswordHasher, PasswordHasherError};
use async_trait::async_trait;
use domain::PasswordHash;

/// bcrypt 哈希，计算放在阻塞线程池里执行
#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// 未配置时使用 `bcrypt::DEFAULT_COST`
    pub fn new(cost: Option<u32>) -> Self {
        Self {
            cost: cost.unwrap_or(bcrypt::DEFAULT_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();

        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|err| PasswordHasherError::new(err.to_string()))?
            .map_err(|err| {
                tracing::error!(cost, error = %err, "密码哈希失败");
                PasswordHasherError::new(err.to_string())
            })?;

        PasswordHash::new(digest).map_err(|err| PasswordHasherError::new(err.to_string()))
    }
}
