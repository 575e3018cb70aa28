use crate::domain::model::RemovalJob;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 外部去背服務；輸入圖片路徑與解析度提示，輸出處理後的圖片路徑
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, job: &RemovalJob) -> Result<PathBuf>;

    async fn health_check(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// 檔案/資料夾選擇器；取消時回傳 `None`
pub trait PathPicker {
    fn pick(&mut self, prompt: &str, default: Option<&Path>) -> Option<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoverBackend {
    Subprocess {
        program: String,
        script: PathBuf,
        working_dir: Option<PathBuf>,
    },
    Http {
        endpoint: String,
    },
}

pub trait ConfigProvider: Send + Sync {
    fn remover_backend(&self) -> RemoverBackend;
    fn workspace_dir(&self) -> &Path;
    fn output_dir(&self) -> &Path;
    fn keep_intermediate(&self) -> bool;
}
