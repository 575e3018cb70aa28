use crate::domain::model::ExportFormat;
use crate::utils::error::{ClearcutError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, RgbImage};

/// 依格式編碼；品質只影響 jpg 與 webp
pub fn encode(image: &DynamicImage, format: ExportFormat, quality: u8) -> Result<Vec<u8>> {
    let encoded = match format {
        ExportFormat::Png => encode_png(image)?,
        ExportFormat::Jpg => encode_jpeg(image, quality)?,
        ExportFormat::Webp => encode_webp(image, quality)?,
    };

    tracing::debug!(
        "Encoded {}x{} image as {} ({} bytes)",
        image.width(),
        image.height(),
        format,
        encoded.len()
    );
    Ok(encoded)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);

    // PNG 不支援浮點像素
    let result = match image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba16(image.to_rgba16()).write_with_encoder(encoder)
        }
        _ => image.write_with_encoder(encoder),
    };
    result.map_err(|e| ClearcutError::encode("png", e.to_string()))?;
    Ok(buffer)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = flatten_onto_white(image);
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| ClearcutError::encode("jpg", e.to_string()))?;
    Ok(buffer)
}

fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let memory = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        .encode_simple(false, f32::from(quality.clamp(1, 100)))
        .map_err(|e| ClearcutError::encode("webp", format!("{:?}", e)))?;
    Ok(memory.to_vec())
}

/// JPG 沒有 alpha，透明區域以白色背景合成
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
