//! 内存仓储，用于本地开发与测试，不做持久化

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    sort_by_last_message_sent, Chat, ChatId, ChatRepository, RepositoryError, RepositoryResult,
    User, UserEmail, UserId, UserRepository, Username,
};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 用户名与邮箱在所有用户（含已删除）中保持唯一
fn conflicts(existing: &User, candidate: &User) -> bool {
    existing.id != candidate.id
        && (existing.username == candidate.username || existing.email == candidate.email)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) || users.values().any(|existing| conflicts(existing, &user))
        {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| conflicts(existing, &user)) {
            return Err(RepositoryError::Conflict);
        }
        let slot = users.get_mut(&user.id).ok_or(RepositoryError::NotFound)?;
        let password = user.password.clone().or_else(|| slot.password.clone());
        *slot = User { password, ..user };
        Ok(slot.clone())
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: UserEmail) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_username(&self, username: Username) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.username == username).cloned())
    }

    async fn list_active(&self) -> RepositoryResult<Vec<User>> {
        let users = self.users.read().await;
        let mut active: Vec<User> = users
            .values()
            .filter(|user| !user.is_deleted())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    chats: RwLock<HashMap<ChatId, Chat>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn save(&self, chat: Chat) -> RepositoryResult<Chat> {
        let mut seen = Vec::with_capacity(chat.members.len());
        for member_id in chat.member_ids() {
            if seen.contains(&member_id) {
                return Err(RepositoryError::Conflict);
            }
            seen.push(member_id);
        }

        self.chats.write().await.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn find_by_id(&self, id: ChatId) -> RepositoryResult<Option<Chat>> {
        Ok(self.chats.read().await.get(&id).cloned())
    }

    async fn find_all_by_user_id(&self, user_id: UserId) -> RepositoryResult<Vec<Chat>> {
        let chats = self.chats.read().await;
        let mut matching: Vec<Chat> = chats
            .values()
            .filter(|chat| chat.deleted_at.is_none() && chat.has_member(user_id))
            .cloned()
            .collect();
        sort_by_last_message_sent(&mut matching);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use domain::{ChatStatus, PasswordHash, Timestamp};
    use uuid::Uuid;

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn user(username: &str) -> User {
        User::register(
            UserId::from(Uuid::new_v4()),
            username,
            Username::parse(username).unwrap(),
            UserEmail::parse(format!("{username}@example.com")).unwrap(),
            PasswordHash::new("hash").unwrap(),
            now(),
        )
        .unwrap()
    }

    fn direct(a: &User, b: &User, created_at: Timestamp) -> Chat {
        Chat::new_direct(
            ChatId::from(Uuid::new_v4()),
            a.clone(),
            b.clone(),
            ChatStatus::Inactive,
            created_at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_duplicate_username_and_email() {
        let repository = InMemoryUserRepository::new();
        let alice = user("alice");
        repository.create(alice.clone()).await.unwrap();

        let mut same_name = user("alice");
        same_name.email = UserEmail::parse("other@example.com").unwrap();
        assert!(matches!(
            repository.create(same_name).await,
            Err(RepositoryError::Conflict)
        ));

        let mut same_email = user("bob");
        same_email.email = alice.email.clone();
        assert!(matches!(
            repository.create(same_email).await,
            Err(RepositoryError::Conflict)
        ));
    }

    #[tokio::test]
    async fn update_keeps_password_and_hides_deleted_users() {
        let repository = InMemoryUserRepository::new();
        let alice = repository.create(user("alice")).await.unwrap();
        repository.create(user("bob")).await.unwrap();

        let mut deleted = alice.clone();
        deleted.password = None;
        deleted.soft_delete(now());
        let stored = repository.update(deleted).await.unwrap();

        assert!(stored.is_deleted());
        assert_eq!(stored.password, alice.password);
        let active = repository.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].username.as_str(), "bob");
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let repository = InMemoryUserRepository::new();
        assert!(matches!(
            repository.update(user("ghost")).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn lists_member_chats_by_latest_message() {
        let repository = InMemoryChatRepository::new();
        let (alice, bob, carol) = (user("alice"), user("bob"), user("carol"));

        let quiet = direct(&alice, &bob, now());
        let mut busy = direct(&alice, &carol, now() - Duration::hours(2));
        busy.record_message_sent(now() + Duration::minutes(5));
        let unrelated = direct(&bob, &carol, now());

        for chat in [quiet.clone(), busy.clone(), unrelated] {
            repository.save(chat).await.unwrap();
        }

        let ids: Vec<ChatId> = repository
            .find_all_by_user_id(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|chat| chat.id)
            .collect();
        assert_eq!(ids, vec![busy.id, quiet.id]);
    }

    #[tokio::test]
    async fn save_rejects_repeated_member() {
        let repository = InMemoryChatRepository::new();
        let alice = user("alice");
        let mut chat = direct(&alice, &user("bob"), now());
        chat.members.push(alice);

        assert!(matches!(
            repository.save(chat).await,
            Err(RepositoryError::Conflict)
        ));
    }
}
