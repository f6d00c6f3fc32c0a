pub mod gif;
pub mod lossy;
pub mod raster;
pub mod reraster;

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::capability::StrategyId;
use crate::config::Constraints;
use crate::error::StrategyError;
use crate::format::MediaBlob;

/// Uniform contract of one substitutable compression strategy.
///
/// Implementations must not mutate shared state: the same input is handed to
/// every eligible strategy concurrently.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;
    fn attempt(&self, input: &MediaBlob, constraints: &Constraints) -> Result<MediaBlob, StrategyError>;
}

/// Hand the input back when an encode at source size came out larger.
/// Explicit resize requests are honoured even when they grow the file.
pub(crate) fn no_larger_than_input(
    id: StrategyId,
    input: &MediaBlob,
    output: MediaBlob,
    constraints: &Constraints,
) -> MediaBlob {
    if constraints.resize.is_empty() && output.len() > input.len() {
        log::debug!(
            "{}: output grew ({} -> {} bytes), returning input",
            id,
            input.len(),
            output.len()
        );
        input.clone()
    } else {
        output
    }
}

pub(crate) fn decode(input: &[u8]) -> Result<(DynamicImage, image::ImageFormat), StrategyError> {
    let format = image::guess_format(input).map_err(|e| StrategyError::Decode(e.to_string()))?;
    let img = image::load_from_memory_with_format(input, format)
        .map_err(|e| StrategyError::Decode(e.to_string()))?;
    Ok((img, format))
}

pub(crate) fn resize_to(img: DynamicImage, (width, height): (u32, u32)) -> DynamicImage {
    if img.width() == width && img.height() == height {
        img
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    }
}

pub(crate) fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, StrategyError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);

    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| StrategyError::Encode(e.to_string()))?;

    Ok(output)
}

pub(crate) fn encode_webp(img: &DynamicImage, quality: u8) -> Vec<u8> {
    let rgba = img.to_rgba8();
    webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        .encode(quality as f32)
        .to_vec()
}

pub(crate) fn encode_as(img: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>, StrategyError> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), format)
        .map_err(|e| StrategyError::Encode(e.to_string()))?;
    Ok(output)
}
