use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Chat, ChatId, ChatRepository, ChatStatus, FileRecord, RepositoryError, RepositoryResult, User,
    UserEmail, UserId, UserRepository, Username,
};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use uuid::Uuid;

/// Postgres 唯一约束冲突
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    let is_conflict = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if is_conflict {
        return RepositoryError::Conflict;
    }
    tracing::error!(error = %err, "数据库操作失败");
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    username: String,
    email: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username =
            Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password = value
            .password_hash
            .map(domain::PasswordHash::new)
            .transpose()
            .map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            name: value.name,
            username,
            email,
            password,
            created_at: value.created_at,
            updated_at: value.updated_at,
            deleted_at: value.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ChatRecord {
    id: Uuid,
    name: Option<String>,
    description: Option<String>,
    created_by: String,
    status: String,
    icon: Option<Json<FileRecord>>,
    last_message_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ChatRecord {
    fn into_chat(self, members: Vec<User>) -> Result<Chat, RepositoryError> {
        let created_by =
            Username::parse(self.created_by).map_err(|err| invalid_data(err.to_string()))?;
        let status = self
            .status
            .parse::<ChatStatus>()
            .map_err(|err| invalid_data(err.to_string()))?;

        Ok(Chat {
            id: ChatId::from(self.id),
            name: self.name,
            description: self.description,
            created_by,
            status,
            icon: self.icon.map(|icon| icon.0),
            members,
            last_message_sent_at: self.last_message_sent_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// 成员行：用户字段加上所属聊天ID，不读取密码
#[derive(Debug, FromRow)]
struct MemberRecord {
    chat_id: Uuid,
    id: Uuid,
    name: String,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl MemberRecord {
    fn into_user(self) -> Result<(Uuid, User), RepositoryError> {
        let user = User::try_from(UserRecord {
            id: self.id,
            name: self.name,
            username: self.username,
            email: self.email,
            password_hash: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })?;
        Ok((self.chat_id, user))
    }
}

const USER_COLUMNS: &str =
    "id, name, username, email, password_hash, created_at, updated_at, deleted_at";

const CHAT_COLUMNS: &str = "c.id, c.name, c.description, c.created_by, c.status, c.icon, \
     c.last_message_sent_at, c.created_at, c.updated_at, c.deleted_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: String) -> RepositoryResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, name, username, email, password_hash, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::from(user.id))
        .bind(&user.name)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_ref().map(|hash| hash.as_str()))
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        // 密码为空时保留原值
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users
            SET name = $2, username = $3, email = $4,
                password_hash = COALESCE($5, password_hash),
                updated_at = $6, deleted_at = $7
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::from(user.id))
        .bind(&user.name)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_ref().map(|hash| hash.as_str()))
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: UserEmail) -> RepositoryResult<Option<User>> {
        self.find_one("email", email.as_str().to_owned()).await
    }

    async fn find_by_username(&self, username: Username) -> RepositoryResult<Option<User>> {
        self.find_one("username", username.as_str().to_owned()).await
    }

    async fn list_active(&self) -> RepositoryResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 一次性加载多个聊天的成员，按聊天分组并保持成员顺序
    async fn load_members(&self, chat_ids: &[Uuid]) -> RepositoryResult<HashMap<Uuid, Vec<User>>> {
        let records = sqlx::query_as::<_, MemberRecord>(
            r#"
            SELECT m.chat_id, u.id, u.name, u.username, u.email, u.created_at, u.updated_at, u.deleted_at
            FROM chat_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.chat_id = ANY($1)
            ORDER BY m.chat_id, m.position
            "#,
        )
        .bind(chat_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut members: HashMap<Uuid, Vec<User>> = HashMap::new();
        for record in records {
            let (chat_id, user) = record.into_user()?;
            members.entry(chat_id).or_default().push(user);
        }
        Ok(members)
    }

    async fn hydrate(&self, records: Vec<ChatRecord>) -> RepositoryResult<Vec<Chat>> {
        let chat_ids: Vec<Uuid> = records.iter().map(|record| record.id).collect();
        let mut members = self.load_members(&chat_ids).await?;

        records
            .into_iter()
            .map(|record| {
                let chat_members = members.remove(&record.id).unwrap_or_default();
                record.into_chat(chat_members)
            })
            .collect()
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    /// 聊天行与成员行在同一个事务里写入
    async fn save(&self, chat: Chat) -> RepositoryResult<Chat> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query(
            r#"
            INSERT INTO chats (id, name, description, created_by, status, icon, last_message_sent_at, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                status = EXCLUDED.status,
                icon = EXCLUDED.icon,
                last_message_sent_at = EXCLUDED.last_message_sent_at,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
            "#,
        )
        .bind(Uuid::from(chat.id))
        .bind(&chat.name)
        .bind(&chat.description)
        .bind(chat.created_by.as_str())
        .bind(chat.status.as_str())
        .bind(chat.icon.as_ref().map(Json))
        .bind(chat.last_message_sent_at)
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .bind(chat.deleted_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        sqlx::query("DELETE FROM chat_members WHERE chat_id = $1")
            .bind(Uuid::from(chat.id))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        let user_ids: Vec<Uuid> = chat.member_ids().map(Uuid::from).collect();
        let positions: Vec<i32> = (0..user_ids.len() as i32).collect();
        sqlx::query(
            r#"
            INSERT INTO chat_members (chat_id, user_id, position)
            SELECT $1, member.user_id, member.position
            FROM UNNEST($2::uuid[], $3::int4[]) AS member(user_id, position)
            "#,
        )
        .bind(Uuid::from(chat.id))
        .bind(&user_ids)
        .bind(&positions)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(chat)
    }

    async fn find_by_id(&self, id: ChatId) -> RepositoryResult<Option<Chat>> {
        let record = sqlx::query_as::<_, ChatRecord>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats c WHERE c.id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let Some(record) = record else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![record]).await?.pop())
    }

    async fn find_all_by_user_id(&self, user_id: UserId) -> RepositoryResult<Vec<Chat>> {
        let records = sqlx::query_as::<_, ChatRecord>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chats c
            JOIN chat_members m ON m.chat_id = c.id
            WHERE m.user_id = $1 AND c.deleted_at IS NULL
            ORDER BY c.last_message_sent_at DESC NULLS LAST, c.created_at DESC
            "#
        ))
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        self.hydrate(records).await
    }
}

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub chat_repository: Arc<PgChatRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            chat_repository: Arc::new(PgChatRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
