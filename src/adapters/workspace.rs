use crate::domain::model::CUTOUT_FORMAT;
use crate::utils::error::{ClearcutError, Result};
use crate::utils::fs::ensure_dir;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const UPLOADS_DIR: &str = "uploads";
const OUTPUTS_DIR: &str = "outputs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    pub id: String,
    pub path: PathBuf,
}

/// 上傳暫存區：`uploads/` 放使用者的原圖，`outputs/` 放去背結果
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join(OUTPUTS_DIR)
    }

    pub fn ensure(&self) -> Result<()> {
        ensure_dir(&self.uploads_dir())?;
        ensure_dir(&self.outputs_dir())
    }

    /// 以 `<uuid>.<ext>` 複製一份原圖到 uploads/
    pub async fn stage_upload(&self, source: &Path) -> Result<StagedUpload> {
        let id = Uuid::new_v4().to_string();
        let file_name = match source.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", id, ext.to_ascii_lowercase()),
            None => id.clone(),
        };
        let path = self.uploads_dir().join(file_name);

        tokio::fs::copy(source, &path)
            .await
            .map_err(|e| ClearcutError::io(source, e))?;
        tracing::debug!("Staged {} as {}", source.display(), path.display());

        Ok(StagedUpload { id, path })
    }

    /// 去背結果一律存成 PNG：`outputs/processed_<id>_<stem>.png`
    pub fn processed_path(&self, id: &str, original: &Path) -> PathBuf {
        let stem = original
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("image");
        self.outputs_dir()
            .join(format!("processed_{}_{}.{}", id, stem, CUTOUT_FORMAT.extension()))
    }

    pub async fn discard(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClearcutError::io(path, e)),
        }
    }
}
