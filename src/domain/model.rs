use crate::utils::error::{ClearcutError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_QUALITY: u8 = 90;

/// 去背服務的輸出一律是 PNG
pub const CUTOUT_FORMAT: ExportFormat = ExportFormat::Png;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPreset {
    #[default]
    Original,
    Hd,
    #[cfg_attr(feature = "cli", value(name = "fullhd"))]
    FullHd,
    #[serde(rename = "4k")]
    #[cfg_attr(feature = "cli", value(name = "4k"))]
    UltraHd,
}

impl ResolutionPreset {
    /// 預設解析度對應的外框，`Original` 不縮放
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::Original => None,
            Self::Hd => Some((1280, 720)),
            Self::FullHd => Some((1920, 1080)),
            Self::UltraHd => Some((3840, 2160)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Hd => "hd",
            Self::FullHd => "fullhd",
            Self::UltraHd => "4k",
        }
    }
}

impl fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionPreset {
    type Err = ClearcutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "hd" => Ok(Self::Hd),
            "fullhd" => Ok(Self::FullHd),
            "4k" => Ok(Self::UltraHd),
            other => Err(ClearcutError::InvalidConfigValueError {
                field: "resolution".to_string(),
                value: other.to_string(),
                reason: "Expected one of: original, hd, fullhd, 4k".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    #[cfg_attr(feature = "cli", value(alias = "jpeg"))]
    Jpg,
    Webp,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpg | Self::Webp)
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpg => image::ImageFormat::Jpeg,
            Self::Webp => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ClearcutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::Webp),
            other => Err(ClearcutError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// 縮放的目標外框；缺少的邊不限制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetBox {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetBox {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    pub fn is_unbounded(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// 一次匯出的完整設定，建立後不再修改，由 `export_image` 取得所有權
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    #[serde(default)]
    pub resolution_preset: ResolutionPreset,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default)]
    pub explicit_width: Option<u32>,
    #[serde(default)]
    pub explicit_height: Option<u32>,
    #[serde(default = "default_true")]
    pub maintain_aspect_ratio: bool,
}

fn default_true() -> bool {
    true
}

impl ExportRequest {
    pub fn new(source_path: impl Into<PathBuf>, destination_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            resolution_preset: ResolutionPreset::Original,
            format: ExportFormat::Png,
            quality: None,
            explicit_width: None,
            explicit_height: None,
            maintain_aspect_ratio: true,
        }
    }

    pub fn from_options(
        source_path: impl Into<PathBuf>,
        destination_path: impl Into<PathBuf>,
        options: &ExportOptions,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            resolution_preset: options.resolution,
            format: options.format,
            quality: options.quality,
            explicit_width: options.width,
            explicit_height: options.height,
            maintain_aspect_ratio: options.maintain_aspect_ratio,
        }
    }

    pub fn with_resolution(mut self, preset: ResolutionPreset) -> Self {
        self.resolution_preset = preset;
        self
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.explicit_width = width;
        self.explicit_height = height;
        self
    }

    pub fn with_aspect_ratio(mut self, maintain: bool) -> Self {
        self.maintain_aspect_ratio = maintain;
        self
    }

    pub fn has_explicit_dimensions(&self) -> bool {
        self.explicit_width.is_some() || self.explicit_height.is_some()
    }

    /// `original` 且沒有指定尺寸時直接複製檔案
    pub fn is_passthrough(&self) -> bool {
        self.resolution_preset == ResolutionPreset::Original && !self.has_explicit_dimensions()
    }

    /// 明確尺寸優先於預設解析度
    pub fn target_box(&self) -> TargetBox {
        if self.has_explicit_dimensions() {
            TargetBox::new(self.explicit_width, self.explicit_height)
        } else {
            match self.resolution_preset.dimensions() {
                Some((w, h)) => TargetBox::new(Some(w), Some(h)),
                None => TargetBox::default(),
            }
        }
    }

    /// 只有明確尺寸可以關閉等比例縮放
    pub fn preserves_aspect_ratio(&self) -> bool {
        self.maintain_aspect_ratio || !self.has_explicit_dimensions()
    }

    pub fn effective_quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_QUALITY)
    }
}

impl Validate for ExportRequest {
    fn validate(&self) -> Result<()> {
        if self.source_path.as_os_str().is_empty() {
            return Err(ClearcutError::MissingConfigError {
                field: "source_path".to_string(),
            });
        }
        if self.destination_path.as_os_str().is_empty() {
            return Err(ClearcutError::MissingConfigError {
                field: "destination_path".to_string(),
            });
        }
        if self.source_path == self.destination_path {
            return Err(ClearcutError::ValidationError {
                message: format!(
                    "Source and destination are the same file: {}",
                    self.source_path.display()
                ),
            });
        }
        if let Some(quality) = self.quality {
            validate_range("quality", quality, 1, 100)?;
        }
        if let Some(width) = self.explicit_width {
            validate_positive_number("width", width, 1)?;
        }
        if let Some(height) = self.explicit_height {
            validate_positive_number("height", height, 1)?;
        }
        Ok(())
    }
}

/// 匯出選項，不含路徑；由設定檔或命令列提供
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub resolution: ResolutionPreset,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default = "default_true")]
    pub maintain_aspect_ratio: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            resolution: ResolutionPreset::Original,
            format: ExportFormat::Png,
            quality: None,
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl ExportOptions {
    /// 原尺寸且沒有指定寬高時，匯出是逐位元組複製
    pub fn is_passthrough(&self) -> bool {
        self.resolution == ResolutionPreset::Original
            && self.width.is_none()
            && self.height.is_none()
    }

    /// 沒有指定輸出路徑時使用的檔名：`<stem>_clearcut.<ext>`
    ///
    /// `original` 本身就是被匯出的檔案；直接複製時副檔名沿用它的，避免
    /// PNG 內容被存成 `.jpg`。
    pub fn default_file_name(&self, original: &Path) -> String {
        let source_ext = original
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(str::to_ascii_lowercase);
        let (stem, ext) = self.name_parts(original, source_ext);
        format!("{}_clearcut.{}", stem, ext)
    }

    /// 去背後再匯出時的預設檔名；被匯出的是去背結果 (PNG)
    pub fn default_cutout_file_name(&self, original: &Path) -> String {
        let (stem, ext) = self.name_parts(original, Some(CUTOUT_FORMAT.extension().to_string()));
        format!("{}_clearcut.{}", stem, ext)
    }

    /// 批次輸出路徑；同名時依序加上 `_2`、`_3`，不互相覆蓋
    pub fn cutout_destinations(&self, output_dir: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut taken = HashSet::new();
        inputs
            .iter()
            .map(|input| {
                let (stem, ext) =
                    self.name_parts(input, Some(CUTOUT_FORMAT.extension().to_string()));
                let mut destination = output_dir.join(format!("{}_clearcut.{}", stem, ext));
                let mut suffix = 2;
                while !taken.insert(destination.clone()) {
                    destination = output_dir.join(format!("{}_clearcut_{}.{}", stem, suffix, ext));
                    suffix += 1;
                }
                if suffix > 2 {
                    tracing::warn!(
                        "Output name for {} already used in this batch, writing {}",
                        input.display(),
                        destination.display()
                    );
                }
                destination
            })
            .collect()
    }

    fn name_parts(&self, original: &Path, passthrough_ext: Option<String>) -> (String, String) {
        let stem = original
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("image")
            .to_string();
        let ext = passthrough_ext
            .filter(|_| self.is_passthrough())
            .unwrap_or_else(|| self.format.extension().to_string());
        (stem, ext)
    }
}

/// 交給去背服務的一次工作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub resolution: ResolutionPreset,
}

impl RemovalJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            resolution: ResolutionPreset::Original,
        }
    }

    pub fn with_resolution(mut self, resolution: ResolutionPreset) -> Self {
        self.resolution = resolution;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub staged_input: PathBuf,
    pub processed: PathBuf,
    pub exported: PathBuf,
}
