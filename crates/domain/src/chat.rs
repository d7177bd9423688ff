//! 聊天聚合定义
//!
//! 聊天与其成员列表作为一个整体持久化。成员列表在创建时确定，
//! 任何时候都不允许出现重复的用户ID。

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::file::FileRecord;
use crate::user::User;
use crate::value_objects::{ChatId, Timestamp, UserId, Username};

/// 聊天状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatStatus {
    /// 活跃状态
    Active,
    /// 尚未发送过消息的单聊
    Inactive,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Active => "ACTIVE",
            ChatStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(ChatStatus::Active),
            "INACTIVE" => Ok(ChatStatus::Inactive),
            other => Err(DomainError::invalid_argument(
                "status",
                format!("unknown chat status {other}"),
            )),
        }
    }
}

/// 聊天实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    /// 群聊名称，单聊为空
    pub name: Option<String>,
    pub description: Option<String>,
    /// 创建者用户名
    pub created_by: Username,
    pub status: ChatStatus,
    pub icon: Option<FileRecord>,
    /// 有序成员列表，创建者总在第一位
    pub members: Vec<User>,
    pub last_message_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Chat {
    /// 创建两人之间的单聊，成员顺序为 [creator, member]
    pub fn new_direct(
        id: ChatId,
        creator: User,
        member: User,
        status: ChatStatus,
        now: Timestamp,
    ) -> DomainResult<Self> {
        if creator.id == member.id {
            return Err(DomainError::duplicate_identifier(member.id));
        }

        Ok(Self {
            id,
            name: None,
            description: None,
            created_by: creator.username.clone(),
            status,
            icon: None,
            members: vec![creator, member],
            last_message_sent_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// 创建群聊。`members` 必须以创建者开头，空白名称按未命名处理。
    pub fn new_group(
        id: ChatId,
        name: Option<String>,
        description: Option<String>,
        members: Vec<User>,
        icon: Option<FileRecord>,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let name = name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());

        let created_by = members
            .first()
            .map(|creator| creator.username.clone())
            .ok_or_else(|| DomainError::invalid_argument("members", "creator is required"))?;
        ensure_unique_members(&members)?;

        Ok(Self {
            id,
            name,
            description,
            created_by,
            status: ChatStatus::Active,
            icon,
            members,
            last_message_sent_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// 有新消息发送：刷新最后消息时间并重新激活
    pub fn record_message_sent(&mut self, now: Timestamp) {
        self.last_message_sent_at = Some(now);
        self.status = ChatStatus::Active;
        self.updated_at = now;
    }

    pub fn member_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.members.iter().map(|member| member.id)
    }

    pub fn has_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|member| member.id == user_id)
    }
}

/// 将候选成员追加到累积列表，只检查新候选是否与已有成员重复
pub fn append_unique_member(members: &mut Vec<User>, candidate: User) -> DomainResult<()> {
    if members.iter().any(|member| member.id == candidate.id) {
        return Err(DomainError::duplicate_identifier(candidate.id));
    }
    members.push(candidate);
    Ok(())
}

fn ensure_unique_members(members: &[User]) -> DomainResult<()> {
    for (index, member) in members.iter().enumerate() {
        if members[..index].iter().any(|seen| seen.id == member.id) {
            return Err(DomainError::duplicate_identifier(member.id));
        }
    }
    Ok(())
}

/// 按最后消息时间倒序排列，从未发过消息的排在最后，再按创建时间倒序
pub fn sort_by_last_message_sent(chats: &mut [Chat]) {
    chats.sort_by(|a, b| {
        match (a.last_message_sent_at, b.last_message_sent_at) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
