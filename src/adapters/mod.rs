// Adapters layer: concrete implementations of the domain ports (remover backends, workspace, picker).

pub mod http;
pub mod picker;
pub mod subprocess;
pub mod workspace;

use crate::domain::model::RemovalJob;
use crate::domain::ports::{BackgroundRemover, ConfigProvider, RemoverBackend};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub use http::HttpRemover;
pub use picker::PromptPicker;
pub use subprocess::SubprocessRemover;
pub use workspace::{LocalWorkspace, StagedUpload};

/// 依設定選出的去背後端
#[derive(Debug, Clone)]
pub enum AnyRemover {
    Subprocess(SubprocessRemover),
    Http(HttpRemover),
}

impl AnyRemover {
    pub fn from_backend(backend: RemoverBackend) -> Result<Self> {
        match backend {
            RemoverBackend::Subprocess {
                program,
                script,
                working_dir,
            } => Ok(Self::Subprocess(
                SubprocessRemover::new(program, script).with_working_dir(working_dir),
            )),
            RemoverBackend::Http { endpoint } => Ok(Self::Http(HttpRemover::new(&endpoint)?)),
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::from_backend(config.remover_backend())
    }
}

#[async_trait]
impl BackgroundRemover for AnyRemover {
    async fn remove_background(&self, job: &RemovalJob) -> Result<PathBuf> {
        match self {
            Self::Subprocess(remover) => remover.remove_background(job).await,
            Self::Http(remover) => remover.remove_background(job).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            Self::Subprocess(remover) => remover.health_check().await,
            Self::Http(remover) => remover.health_check().await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Subprocess(remover) => remover.name(),
            Self::Http(remover) => remover.name(),
        }
    }
}
