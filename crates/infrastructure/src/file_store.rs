use std::path::{Path, PathBuf};
use std::sync::Arc;

use application::{Clock, FileStore, FileStoreError};
use async_trait::async_trait;
use domain::{FileId, FileRecord, FileUpload};
use uuid::Uuid;

/// 将上传文件写入本地目录，文件名为 `{id}{.扩展名}`
pub struct LocalFileStore {
    base_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl LocalFileStore {
    pub fn new(base_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_dir: base_dir.into(),
            clock,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save_file(
        &self,
        upload: Option<FileUpload>,
    ) -> Result<Option<FileRecord>, FileStoreError> {
        let Some(upload) = upload.filter(|upload| !upload.is_empty()) else {
            return Ok(None);
        };

        let file_name = upload.file_name.trim();
        if file_name.is_empty() {
            return Err(FileStoreError::InvalidUpload(
                "file name cannot be empty".to_string(),
            ));
        }

        let id = FileId::from(Uuid::new_v4());
        let stored_name = match extension_of(file_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        let path = self.base_dir.join(stored_name);

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|err| FileStoreError::storage(err.to_string()))?;
        tokio::fs::write(&path, &upload.bytes).await.map_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "文件写入失败");
            FileStoreError::storage(err.to_string())
        })?;

        let record = FileRecord {
            id,
            file_name: file_name.to_owned(),
            content_type: upload.content_type,
            size: upload.bytes.len() as i64,
            storage_path: path.to_string_lossy().into_owned(),
            created_at: self.clock.now(),
        };
        tracing::debug!(file_id = %record.id, size = record.size, "文件已保存");

        Ok(Some(record))
    }
}
