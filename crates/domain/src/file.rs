//! 文件上传与文件引用

use serde::{Deserialize, Serialize};

use crate::value_objects::{FileId, Timestamp};

/// 调用方提交的待保存文件（例如群头像）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// 原始文件名
    pub file_name: String,
    /// MIME类型
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// 表单里带了文件字段但没有内容时视为未上传
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 已持久化文件的引用，聊天只持有引用不持有内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub file_name: String,
    pub content_type: String,
    /// 文件大小（字节）
    pub size: i64,
    /// 存储路径
    pub storage_path: String,
    pub created_at: Timestamp,
}
