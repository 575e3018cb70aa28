use crate::core::encode::encode;
use crate::core::geometry::fit_dimensions;
use crate::domain::model::ExportRequest;
use crate::utils::error::{ClearcutError, Result};
use crate::utils::fs::{copy_atomically, write_atomically};
use crate::utils::validation::Validate;
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};
use std::path::PathBuf;

/// 匯出一張圖片
///
/// `original` 且沒有指定尺寸時逐位元組複製，不重新編碼；其餘情況解碼、縮到
/// 外框內、以指定格式重新編碼。輸出先寫暫存檔再 rename，失敗時目的地不會
/// 出現半成品。
pub fn export_image(request: ExportRequest) -> Result<PathBuf> {
    request.validate()?;

    tracing::debug!(
        "Exporting {} -> {} (resolution: {}, format: {})",
        request.source_path.display(),
        request.destination_path.display(),
        request.resolution_preset,
        request.format
    );

    if request.is_passthrough() {
        warn_if_format_ignored(&request);
        let copied = copy_atomically(&request.source_path, &request.destination_path)?;
        tracing::info!(
            "📋 Copied original image ({} bytes) to {}",
            copied,
            request.destination_path.display()
        );
        return Ok(request.destination_path);
    }

    let data = std::fs::read(&request.source_path)
        .map_err(|e| ClearcutError::io(&request.source_path, e))?;
    let image = image::load_from_memory(&data)
        .map_err(|e| ClearcutError::decode(&request.source_path, e.to_string()))?;
    drop(data);

    let source_size = image.dimensions();
    let (width, height) = fit_dimensions(
        source_size,
        request.target_box(),
        request.preserves_aspect_ratio(),
    );

    let image = if (width, height) == source_size {
        image
    } else {
        tracing::debug!(
            "Resizing {}x{} -> {}x{}",
            source_size.0,
            source_size.1,
            width,
            height
        );
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    let quality = request.effective_quality();
    if !request.format.is_lossy() && request.quality.is_some() {
        tracing::debug!("Quality {} ignored for {}", quality, request.format);
    }

    let encoded = encode(&image, request.format, quality)?;
    write_atomically(&request.destination_path, &encoded)?;

    tracing::info!(
        "🖼️ Exported {}x{} {} ({} bytes) to {}",
        width,
        height,
        request.format,
        encoded.len(),
        request.destination_path.display()
    );
    Ok(request.destination_path)
}

fn warn_if_format_ignored(request: &ExportRequest) {
    if let Ok(source_format) = ImageFormat::from_path(&request.source_path) {
        if source_format != request.format.image_format() {
            tracing::warn!(
                "Original resolution keeps the source encoding ({:?}); requested {} was not applied",
                source_format,
                request.format
            );
        }
    }
}
