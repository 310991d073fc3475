//! Cookie 存储 - 业务能力层
//!
//! 每个会话一个存储槽，只在关闭时写入、恢复时读取

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageError;
use crate::models::StoredCookie;

#[async_trait]
pub trait CookieStore: Send + Sync {
    async fn save(&self, session_id: &str, cookies: &[StoredCookie]) -> Result<(), StorageError>;
    /// 槽位不存在时返回 None
    async fn load(&self, session_id: &str) -> Result<Option<Vec<StoredCookie>>, StorageError>;
}

/// 文件存储：`<dir>/<session_id>.json`
///
/// 先写临时文件再重命名，保证读到的总是完整内容
pub struct FileCookieStore {
    dir: PathBuf,
}

impl FileCookieStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, session_id: &str) -> PathBuf {
        // 会话 ID 来自外部输入时，避免路径穿越
        let file_stem: String = session_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_stem))
    }

    async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(0o700)).await?;
        }
        Ok(())
    }
}

fn write_failed(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> StorageError {
    StorageError::WriteFailed {
        path: path.display().to_string(),
        source: Box::new(source),
    }
}

fn read_failed(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> StorageError {
    StorageError::ReadFailed {
        path: path.display().to_string(),
        source: Box::new(source),
    }
}

#[async_trait]
impl CookieStore for FileCookieStore {
    async fn save(&self, session_id: &str, cookies: &[StoredCookie]) -> Result<(), StorageError> {
        let path = self.slot_path(session_id);
        self.ensure_dir().await.map_err(|e| write_failed(&self.dir, e))?;

        let json = serde_json::to_vec_pretty(cookies).map_err(|e| write_failed(&path, e))?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| write_failed(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| write_failed(&path, e))?;

        debug!("已保存 {} 个 Cookie 到 {}", cookies.len(), path.display());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Vec<StoredCookie>>, StorageError> {
        let path = self.slot_path(session_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_failed(&path, e)),
        };
        let cookies: Vec<StoredCookie> = serde_json::from_slice(&bytes).map_err(|e| read_failed(&path, e))?;
        debug!("从 {} 读取 {} 个 Cookie", path.display(), cookies.len());
        Ok(Some(cookies))
    }
}

/// 内存存储
#[derive(Default)]
pub struct MemoryCookieStore {
    slots: Mutex<HashMap<String, Vec<StoredCookie>>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn save(&self, session_id: &str, cookies: &[StoredCookie]) -> Result<(), StorageError> {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session_id.to_string(), cookies.to_vec());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Vec<StoredCookie>>, StorageError> {
        Ok(self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned())
    }
}
