use async_trait::async_trait;
use domain::{FileRecord, FileUpload};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    #[error("file storage failed: {0}")]
    Storage(String),
}

impl FileStoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// 文件存储。没有上传内容时不做任何事并返回 `None`。
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save_file(
        &self,
        upload: Option<FileUpload>,
    ) -> Result<Option<FileRecord>, FileStoreError>;
}
