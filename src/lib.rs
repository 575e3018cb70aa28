pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{AnyRemover, HttpRemover, LocalWorkspace, SubprocessRemover};
pub use core::{engine::CutoutEngine, export::export_image};
pub use domain::model::{
    ExportFormat, ExportOptions, ExportRequest, RemovalJob, RemovalOutcome, ResolutionPreset,
};
pub use domain::ports::{BackgroundRemover, ConfigProvider, PathPicker};
pub use utils::error::{ClearcutError, Result};
