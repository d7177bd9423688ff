use std::sync::Arc;

use domain::{
    append_unique_member, Chat, ChatId, ChatRepository, ChatStatus, DomainError, FileUpload, User,
    UserId,
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::{to_chat_response_list, ChatResponse, CreateGroupChatRequest, CreatePrivateChatRequest},
    error::ApplicationError,
    file_store::FileStore,
    lookup::UserLookup,
    notifier::{chat_topic, Notifier},
};

pub struct ChatServiceDependencies {
    pub chat_repository: Arc<dyn ChatRepository>,
    pub user_lookup: Arc<dyn UserLookup>,
    pub file_store: Arc<dyn FileStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// 聊天创建与聊天列表推送。
///
/// 所有校验（用户查询、成员去重）都在写入之前完成，失败时不会产生任何聊天记录。
/// 成员去重只依赖单次调用内的累积列表，并发创建同一组成员的请求不在保护范围内。
pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 创建私聊。聊天在发送第一条消息之前处于 `INACTIVE` 状态。
    pub async fn create_private_chat(
        &self,
        request: CreatePrivateChatRequest,
    ) -> Result<ChatResponse, ApplicationError> {
        self.create_direct_chat(request, ChatStatus::Inactive).await
    }

    /// 创建单聊，创建后立即处于 `ACTIVE` 状态。
    pub async fn create_single_chat(
        &self,
        request: CreatePrivateChatRequest,
    ) -> Result<ChatResponse, ApplicationError> {
        self.create_direct_chat(request, ChatStatus::Active).await
    }

    /// 创建群聊。
    ///
    /// 群头像先于成员校验保存；成员按调用方给出的顺序逐个查询，
    /// 遇到第一个重复ID即返回 `DuplicateIdentifier`。
    pub async fn create_group_chat(
        &self,
        request: CreateGroupChatRequest,
        icon: Option<FileUpload>,
    ) -> Result<ChatResponse, ApplicationError> {
        let icon = self.deps.file_store.save_file(icon).await?;

        let creator = self.resolve_user(request.creator_user_id).await?;
        let mut members = vec![creator];
        for member_id in request.member_ids {
            let candidate = self.resolve_user(member_id).await?;
            append_unique_member(&mut members, candidate)?;
        }

        let chat = Chat::new_group(
            ChatId::from(Uuid::new_v4()),
            request.name,
            request.description,
            members,
            icon,
            self.deps.clock.now(),
        )?;

        let stored = self.persist(chat).await?;
        tracing::info!(
            chat_id = %stored.id,
            created_by = %stored.created_by,
            members = stored.members.len(),
            has_icon = stored.icon.is_some(),
            "群聊已创建"
        );

        Ok(ChatResponse::from(&stored))
    }

    pub async fn find_by_id(&self, id: ChatId) -> Result<ChatResponse, ApplicationError> {
        let chat = self.load(id).await?;
        Ok(ChatResponse::from(&chat))
    }

    /// 刷新最后消息时间并重新激活聊天
    pub async fn update_last_message_sent(
        &self,
        id: ChatId,
    ) -> Result<ChatResponse, ApplicationError> {
        let mut chat = self.load(id).await?;
        chat.record_message_sent(self.deps.clock.now());

        let stored = self.persist(chat).await?;
        tracing::debug!(chat_id = %stored.id, "最后消息时间已更新");

        Ok(ChatResponse::from(&stored))
    }

    /// 向聊天的每个成员推送其各自的完整聊天列表。
    ///
    /// 每个成员的列表单独查询，推送到 `/topic/chats/{userId}`。
    /// 推送失败只记录日志，不影响其余成员，也不回滚已持久化的数据。
    /// 返回成功推送的成员数量。
    pub async fn send_to_users_chats_ordered_by_last_message_sent(
        &self,
        id: ChatId,
    ) -> Result<usize, ApplicationError> {
        let chat = self.load(id).await?;
        let mut delivered = 0;

        for member_id in chat.member_ids() {
            let chats = self
                .deps
                .chat_repository
                .find_all_by_user_id(member_id)
                .await?;
            let topic = chat_topic(member_id);

            let payload = match serde_json::to_value(to_chat_response_list(&chats)) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(user_id = %member_id, error = %err, "聊天列表序列化失败");
                    continue;
                }
            };

            match self.deps.notifier.publish(&topic, payload).await {
                Ok(()) => {
                    delivered += 1;
                    tracing::debug!(topic = %topic, chats = chats.len(), "聊天列表已推送");
                }
                Err(err) => {
                    tracing::warn!(
                        chat_id = %id,
                        user_id = %member_id,
                        error = %err,
                        "聊天列表推送失败"
                    );
                }
            }
        }

        Ok(delivered)
    }

    async fn create_direct_chat(
        &self,
        request: CreatePrivateChatRequest,
        status: ChatStatus,
    ) -> Result<ChatResponse, ApplicationError> {
        if request.creator_user_id == request.member_id {
            return Err(DomainError::duplicate_identifier(request.member_id).into());
        }

        let creator = self.resolve_user(request.creator_user_id).await?;
        let member = self.resolve_user(request.member_id).await?;

        let chat = Chat::new_direct(
            ChatId::from(Uuid::new_v4()),
            creator,
            member,
            status,
            self.deps.clock.now(),
        )?;

        let stored = self.persist(chat).await?;
        tracing::info!(
            chat_id = %stored.id,
            created_by = %stored.created_by,
            status = %stored.status,
            "单聊已创建"
        );

        Ok(ChatResponse::from(&stored))
    }

    async fn resolve_user(&self, id: UserId) -> Result<User, ApplicationError> {
        let user = self.deps.user_lookup.get_user_by_id(id).await?;
        Ok(User::from(user))
    }

    async fn load(&self, id: ChatId) -> Result<Chat, ApplicationError> {
        self.deps
            .chat_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::chat_not_found(id).into())
    }

    async fn persist(&self, chat: Chat) -> Result<Chat, ApplicationError> {
        let chat_id = chat.id;
        self.deps.chat_repository.save(chat).await.map_err(|err| {
            tracing::error!(chat_id = %chat_id, error = %err, "聊天保存失败");
            ApplicationError::from(err)
        })
    }
}
