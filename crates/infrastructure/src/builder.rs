use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, Notifier, SystemClock, UserLookup, UserService,
    UserServiceDependencies,
};
use config::{AppConfig, NotifierBackend};
use domain::{ChatRepository, UserRepository};
use thiserror::Error;

use crate::{
    file_store::LocalFileStore,
    memory::{InMemoryChatRepository, InMemoryUserRepository},
    migrations::MIGRATOR,
    notifier::{LocalTopicNotifier, RedisNotifier},
    password::BcryptPasswordHasher,
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// 按配置选出的推送后端
#[derive(Clone)]
pub enum NotifierHandle {
    Local(Arc<LocalTopicNotifier>),
    Redis(Arc<RedisNotifier>),
}

impl NotifierHandle {
    pub fn as_notifier(&self) -> Arc<dyn Notifier> {
        match self {
            Self::Local(notifier) => notifier.clone(),
            Self::Redis(notifier) => notifier.clone(),
        }
    }

    /// 只有本地后端可以在进程内订阅
    pub fn local(&self) -> Option<&Arc<LocalTopicNotifier>> {
        match self {
            Self::Local(notifier) => Some(notifier),
            Self::Redis(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct Infrastructure {
    pub user_repository: Arc<dyn UserRepository>,
    pub chat_repository: Arc<dyn ChatRepository>,
    pub password_hasher: Arc<BcryptPasswordHasher>,
    pub file_store: Arc<LocalFileStore>,
    pub notifier: NotifierHandle,
}

impl Infrastructure {
    /// 连接 Postgres 并执行迁移，按配置选择推送后端
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        let storage = PgStorage::new(pool);

        let notifier = match config.notifier.backend {
            NotifierBackend::Local => {
                NotifierHandle::Local(Arc::new(LocalTopicNotifier::new(config.notifier.capacity)))
            }
            NotifierBackend::Redis => {
                NotifierHandle::Redis(Arc::new(RedisNotifier::connect(&config.redis.url).await?))
            }
        };

        tracing::info!(
            database = %config.redacted_database_url(),
            notifier = ?config.notifier.backend,
            upload_dir = %config.storage.upload_dir,
            "基础设施初始化完成"
        );

        Ok(Self {
            user_repository: storage.user_repository,
            chat_repository: storage.chat_repository,
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.security.bcrypt_cost)),
            file_store: Arc::new(LocalFileStore::new(
                &config.storage.upload_dir,
                Arc::new(SystemClock),
            )),
            notifier,
        })
    }

    /// 不依赖外部服务的装配，推送后端固定为本地广播
    pub fn in_memory(config: &AppConfig) -> Self {
        tracing::info!(upload_dir = %config.storage.upload_dir, "使用内存仓储");

        Self {
            user_repository: Arc::new(InMemoryUserRepository::new()),
            chat_repository: Arc::new(InMemoryChatRepository::new()),
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.security.bcrypt_cost)),
            file_store: Arc::new(LocalFileStore::new(
                &config.storage.upload_dir,
                Arc::new(SystemClock),
            )),
            notifier: NotifierHandle::Local(Arc::new(LocalTopicNotifier::new(
                config.notifier.capacity,
            ))),
        }
    }

    pub fn user_service(&self) -> Arc<UserService> {
        Arc::new(UserService::new(UserServiceDependencies {
            user_repository: self.user_repository.clone(),
            password_hasher: self.password_hasher.clone(),
            clock: Arc::new(SystemClock),
        }))
    }

    pub fn chat_service(&self, user_lookup: Arc<dyn UserLookup>) -> ChatService {
        ChatService::new(ChatServiceDependencies {
            chat_repository: self.chat_repository.clone(),
            user_lookup,
            file_store: self.file_store.clone(),
            notifier: self.notifier.as_notifier(),
            clock: Arc::new(SystemClock),
        })
    }

    /// 用户服务同时作为聊天服务的用户查询来源
    pub fn services(&self) -> (Arc<UserService>, ChatService) {
        let users = self.user_service();
        let chats = self.chat_service(users.clone());
        (users, chats)
    }
}
