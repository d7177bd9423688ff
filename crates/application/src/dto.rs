//! 对外传输结构与映射
//!
//! 请求结构描述调用方的输入，响应结构是领域实体一对一的投影。

use domain::{
    Chat, ChatId, ChatStatus, FileId, FileRecord, Timestamp, User, UserEmail, UserId, Username,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrivateChatRequest {
    pub creator_user_id: UserId,
    pub member_id: UserId,
}

/// 群聊创建描述。`chatName` / `members` 为旧版字段名。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupChatRequest {
    #[serde(default, alias = "chatName")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub creator_user_id: UserId,
    #[serde(default, alias = "members")]
    pub member_ids: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub username: Username,
    pub email: UserEmail,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub id: UserId,
    pub name: String,
    pub username: Username,
    pub email: UserEmail,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: FileId,
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub id: ChatId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_by: Username,
    pub status: ChatStatus,
    pub icon: Option<FileResponse>,
    pub members: Vec<UserResponse>,
    pub last_message_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// 查询得到的用户作为聊天成员使用，不携带密码
impl From<UserResponse> for User {
    fn from(value: UserResponse) -> Self {
        Self {
            id: value.id,
            name: value.name,
            username: value.username,
            email: value.email,
            password: None,
            created_at: value.created_at,
            updated_at: value.updated_at,
            deleted_at: value.deleted_at,
        }
    }
}

impl From<&User> for CreateUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<&FileRecord> for FileResponse {
    fn from(file: &FileRecord) -> Self {
        Self {
            id: file.id,
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
            created_at: file.created_at,
        }
    }
}

impl From<&Chat> for ChatResponse {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id,
            name: chat.name.clone(),
            description: chat.description.clone(),
            created_by: chat.created_by.clone(),
            status: chat.status,
            icon: chat.icon.as_ref().map(FileResponse::from),
            members: chat.members.iter().map(UserResponse::from).collect(),
            last_message_sent_at: chat.last_message_sent_at,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            deleted_at: chat.deleted_at,
        }
    }
}

impl From<Chat> for ChatResponse {
    fn from(chat: Chat) -> Self {
        Self::from(&chat)
    }
}

pub fn to_user_response_list(users: &[User]) -> Vec<UserResponse> {
    users.iter().map(UserResponse::from).collect()
}

pub fn to_chat_response_list(chats: &[Chat]) -> Vec<ChatResponse> {
    chats.iter().map(ChatResponse::from).collect()
}
