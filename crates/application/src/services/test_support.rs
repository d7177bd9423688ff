//! 服务测试共用的内存替身

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use domain::{
    sort_by_last_message_sent, Chat, ChatId, ChatRepository, DomainError, FileId, FileRecord,
    FileUpload, PasswordHash, RepositoryResult, User, UserEmail, UserId, Username,
};
use uuid::Uuid;

use crate::{
    clock::FixedClock,
    dto::UserResponse,
    error::ApplicationError,
    file_store::{FileStore, FileStoreError},
    lookup::UserLookup,
    notifier::{Notifier, NotifyError},
    password::{PasswordHasher, PasswordHasherError},
    services::{ChatService, ChatServiceDependencies},
};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn user(username: &str) -> User {
    let now = fixed_now();
    User {
        id: UserId::from(Uuid::new_v4()),
        name: username.to_uppercase(),
        username: Username::parse(username).unwrap(),
        email: UserEmail::parse(format!("{username}@example.com")).unwrap(),
        password: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

#[derive(Default)]
pub struct StaticUserLookup {
    users: Mutex<HashMap<UserId, User>>,
    calls: Mutex<Vec<UserId>>,
}

impl StaticUserLookup {
    pub fn with_users(users: &[User]) -> Self {
        let lookup = Self::default();
        {
            let mut map = lookup.users.lock().unwrap();
            for user in users {
                map.insert(user.id, user.clone());
            }
        }
        lookup
    }

    pub fn calls(&self) -> Vec<UserId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserLookup for StaticUserLookup {
    async fn get_user_by_id(&self, id: UserId) -> Result<UserResponse, ApplicationError> {
        self.calls.lock().unwrap().push(id);
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .map(UserResponse::from)
            .ok_or_else(|| DomainError::user_not_found(id).into())
    }
}

#[derive(Default)]
pub struct MemoryChatRepository {
    chats: Mutex<HashMap<ChatId, Chat>>,
    saves: Mutex<usize>,
}

impl MemoryChatRepository {
    pub fn insert(&self, chat: Chat) {
        self.chats.lock().unwrap().insert(chat.id, chat);
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn all(&self) -> Vec<Chat> {
        self.chats.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn save(&self, chat: Chat) -> RepositoryResult<Chat> {
        *self.saves.lock().unwrap() += 1;
        self.chats.lock().unwrap().insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn find_by_id(&self, id: ChatId) -> RepositoryResult<Option<Chat>> {
        Ok(self.chats.lock().unwrap().get(&id).cloned())
    }

    async fn find_all_by_user_id(&self, user_id: UserId) -> RepositoryResult<Vec<Chat>> {
        let mut chats: Vec<Chat> = self
            .chats
            .lock()
            .unwrap()
            .values()
            .filter(|chat| chat.has_member(user_id))
            .cloned()
            .collect();
        sort_by_last_message_sent(&mut chats);
        Ok(chats)
    }
}

#[derive(Default)]
pub struct RecordingFileStore {
    saved: Mutex<Vec<FileRecord>>,
}

impl RecordingFileStore {
    pub fn saved(&self) -> Vec<FileRecord> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for RecordingFileStore {
    async fn save_file(
        &self,
        upload: Option<FileUpload>,
    ) -> Result<Option<FileRecord>, FileStoreError> {
        let Some(upload) = upload.filter(|upload| !upload.is_empty()) else {
            return Ok(None);
        };
        let id = FileId::from(Uuid::new_v4());
        let record = FileRecord {
            id,
            file_name: upload.file_name,
            content_type: upload.content_type,
            size: upload.bytes.len() as i64,
            storage_path: format!("memory/{id}"),
            created_at: fixed_now(),
        };
        self.saved.lock().unwrap().push(record.clone());
        Ok(Some(record))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<(String, serde_json::Value)>>,
    failing_topics: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn fail_on(&self, topic: impl Into<String>) {
        self.failing_topics.lock().unwrap().insert(topic.into());
    }

    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), NotifyError> {
        if self.failing_topics.lock().unwrap().contains(topic) {
            return Err(NotifyError::publish("subscriber gone"));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_owned(), payload));
        Ok(())
    }
}

/// 明文加前缀，足够区分哈希前后的值
pub struct PrefixHasher;

#[async_trait]
impl PasswordHasher for PrefixHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("hashed:{plaintext}"))
            .map_err(|err| PasswordHasherError::new(err.to_string()))
    }
}

pub struct ChatHarness {
    pub service: ChatService,
    pub repository: Arc<MemoryChatRepository>,
    pub lookup: Arc<StaticUserLookup>,
    pub files: Arc<RecordingFileStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn chat_harness(users: &[User]) -> ChatHarness {
    let repository = Arc::new(MemoryChatRepository::default());
    let lookup = Arc::new(StaticUserLookup::with_users(users));
    let files = Arc::new(RecordingFileStore::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let service = ChatService::new(ChatServiceDependencies {
        chat_repository: repository.clone(),
        user_lookup: lookup.clone(),
        file_store: files.clone(),
        notifier: notifier.clone(),
        clock: Arc::new(FixedClock(fixed_now())),
    });

    ChatHarness {
        service,
        repository,
        lookup,
        files,
        notifier,
    }
}
