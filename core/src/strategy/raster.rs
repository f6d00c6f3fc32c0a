use image::{DynamicImage, GenericImageView};

use crate::capability::StrategyId;
use crate::config::{percent, Constraints, Mode};
use crate::error::StrategyError;
use crate::format::{media_type_of, MediaBlob};
use crate::geometry::{limit_longest_side, longest_side_limit};
use crate::metadata::{embed_exif, extract_exif};
use crate::quantize::{encode_indexed_png, quantize_rgba};
use crate::strategy::{decode, encode_jpeg, encode_webp, no_larger_than_input, resize_to, Strategy};

/// Output must land under this share of the input for the search to stop.
const SIZE_BUDGET: f64 = 0.8;
const MAX_PASSES: usize = 6;
const QUALITY_STEP: f32 = 0.05;
const MIN_QUALITY: f32 = 0.3;
const SHRINK_PER_PASS: f64 = 0.95;
const QUANTIZE_SPEED: i32 = 3;

/// Dedicated size-reduction pipeline: palette quantization plus lossless
/// optimization for PNG, a target-size quality search for JPEG and WebP.
pub struct RasterOptimizer;

impl Strategy for RasterOptimizer {
    fn id(&self) -> StrategyId {
        StrategyId::RasterOptimizer
    }

    fn attempt(&self, input: &MediaBlob, constraints: &Constraints) -> Result<MediaBlob, StrategyError> {
        let (img, format) = decode(&input.data)?;

        let mut size = img.dimensions();
        if constraints.mode == Mode::KeepQuality {
            if let Some(limit) = longest_side_limit(&constraints.resize) {
                size = limit_longest_side(size, limit);
            }
        }

        let budget = (input.len() as f64 * SIZE_BUDGET) as usize;
        let output = match format {
            image::ImageFormat::Png => optimize_png(resize_to(img, size), constraints)?,
            image::ImageFormat::Jpeg | image::ImageFormat::WebP => {
                search_quality(&img, size, format, budget, constraints)?
            }
            other => {
                return Err(StrategyError::Unsupported(format!(
                    "{} is not handled by {}",
                    media_type_of(other),
                    self.id()
                )))
            }
        };

        let output = match constraints.preserve_exif.then(|| extract_exif(&input.data)).flatten() {
            Some(exif) => embed_exif(output, &exif),
            None => output,
        };

        let output = MediaBlob::new(output, media_type_of(format));
        Ok(no_larger_than_input(self.id(), input, output, constraints))
    }
}

/// Quantize to an indexed palette, then recompress losslessly with metadata stripped.
fn optimize_png(img: DynamicImage, constraints: &Constraints) -> Result<Vec<u8>, StrategyError> {
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let quantized = quantize_rgba(
        rgba.as_raw(),
        width,
        height,
        constraints.quality_percent(),
        QUANTIZE_SPEED,
        256,
    )?;
    let indexed = encode_indexed_png(&quantized, width, height)?;

    let mut opts = oxipng::Options::from_preset(4);
    opts.strip = oxipng::StripChunks::All;

    oxipng::optimize_from_memory(&indexed, &opts).map_err(|e| StrategyError::Optimize(e.to_string()))
}

/// Step quality (and in keepQuality mode, dimensions) down until the output
/// fits the budget. Keeps the smallest pass.
fn search_quality(
    img: &DynamicImage,
    start_size: (u32, u32),
    format: image::ImageFormat,
    budget: usize,
    constraints: &Constraints,
) -> Result<Vec<u8>, StrategyError> {
    let shrink = constraints.mode == Mode::KeepQuality;
    let mut quality = constraints.quality;
    let mut size = start_size;
    let mut best: Option<Vec<u8>> = None;

    for pass in 0..MAX_PASSES {
        let frame = resize_to(img.clone(), size);
        let encoded = match format {
            image::ImageFormat::Jpeg => encode_jpeg(&frame, percent(quality))?,
            _ => encode_webp(&frame, percent(quality)),
        };

        log::debug!(
            "raster-optimizer pass {}: {}x{} q={:.2} -> {} bytes (budget {})",
            pass,
            size.0,
            size.1,
            quality,
            encoded.len(),
            budget
        );

        let fits = encoded.len() <= budget;
        if best.as_ref().map_or(true, |b| encoded.len() < b.len()) {
            best = Some(encoded);
        }
        if fits || (quality <= MIN_QUALITY && !shrink) {
            break;
        }

        quality = step_down(quality, constraints.quality);
        if shrink {
            size = (
                ((size.0 as f64 * SHRINK_PER_PASS) as u32).max(1),
                ((size.1 as f64 * SHRINK_PER_PASS) as u32).max(1),
            );
        }
    }

    best.ok_or_else(|| StrategyError::Encode("no encoding pass ran".into()))
}

/// Next search quality. Never below the floor, and never above what the
/// caller asked for when that is already under the floor.
fn step_down(current: f32, requested: f32) -> f32 {
    (current - QUALITY_STEP).max(MIN_QUALITY.min(requested))
}
