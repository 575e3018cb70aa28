pub mod encode;
pub mod engine;
pub mod export;
pub mod geometry;

pub use crate::domain::model::{ExportFormat, ExportOptions, ExportRequest, ResolutionPreset};
pub use crate::domain::ports::{BackgroundRemover, ConfigProvider};
pub use crate::utils::error::Result;
