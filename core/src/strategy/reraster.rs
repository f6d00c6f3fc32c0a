use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use crate::capability::StrategyId;
use crate::config::{percent, Constraints};
use crate::error::StrategyError;
use crate::format::{media_type_of, MediaBlob};
use crate::geometry::canvas_size;
use crate::strategy::{decode, encode_as, encode_jpeg, encode_webp, resize_to, Strategy};

/// Inputs under this size, kept at their dimensions, are returned untouched.
const SMALL_INPUT: usize = 100 * 1024;
/// A result counts as a clear win below this share of the input.
const CLEAR_WIN: f64 = 0.8;
/// A PNG-to-JPEG result must undercut this share of the input.
const JPEG_FALLBACK_LIMIT: f64 = 0.9;
/// Results at or above this share of the input are discarded.
const NOT_WORTH_IT: f64 = 0.95;

/// Generic fallback: decode, redraw at the target size and re-encode.
/// Metadata never survives.
pub struct Rerasterize;

impl Strategy for Rerasterize {
    fn id(&self) -> StrategyId {
        StrategyId::Rerasterize
    }

    fn attempt(&self, input: &MediaBlob, constraints: &Constraints) -> Result<MediaBlob, StrategyError> {
        let (img, format) = decode(&input.data)?;
        let source = img.dimensions();
        let size = canvas_size(source, &constraints.resize);

        if size == source && input.len() < SMALL_INPUT {
            log::debug!("rerasterize: small input at source size, keeping original");
            return Ok(input.clone());
        }

        let original = input.len() as f64;
        let canvas = resize_to(img, size);

        let picked = match format {
            image::ImageFormat::Png => {
                let png = encode_as(&canvas, image::ImageFormat::Png)?;
                if (png.len() as f64) < original * CLEAR_WIN {
                    Some((png, image::ImageFormat::Png))
                } else {
                    let jpeg = if constraints.quality < 0.8 {
                        let q = constraints.quality.max(0.7);
                        let jpeg = encode_jpeg(&on_white(&canvas), percent(q))?;
                        let limit = (png.len() as f64).min(original * JPEG_FALLBACK_LIMIT);
                        ((jpeg.len() as f64) < limit).then_some(jpeg)
                    } else {
                        None
                    };

                    match jpeg {
                        Some(jpeg) => Some((jpeg, image::ImageFormat::Jpeg)),
                        None if (png.len() as f64) >= original * NOT_WORTH_IT => None,
                        None => Some((png, image::ImageFormat::Png)),
                    }
                }
            }
            image::ImageFormat::Jpeg => {
                let q = constraints.quality;
                let ladder = [q, (q - 0.2).max(0.5), (q - 0.4).max(0.3)];
                let mut found = None;
                for quality in ladder {
                    let jpeg = encode_jpeg(&canvas, percent(quality))?;
                    if (jpeg.len() as f64) < original * CLEAR_WIN {
                        found = Some((jpeg, image::ImageFormat::Jpeg));
                        break;
                    }
                }
                found
            }
            image::ImageFormat::WebP => {
                let webp = encode_webp(&canvas, constraints.quality_percent());
                ((webp.len() as f64) < original * NOT_WORTH_IT).then_some((webp, format))
            }
            other => {
                let encoded = encode_as(&canvas, other)?;
                ((encoded.len() as f64) < original * NOT_WORTH_IT).then_some((encoded, other))
            }
        };

        Ok(match picked {
            Some((data, format)) => MediaBlob::new(data, media_type_of(format)),
            None => input.clone(),
        })
    }
}

/// Flatten transparency onto white before a JPEG encode.
fn on_white(img: &DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut canvas, &img.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mode, ResizeHints};
    use crate::strategy::fixtures;

    #[test]
    fn small_input_at_source_size_is_returned() {
        let input = fixtures::png(16, 16);
        let out = Rerasterize.attempt(&input, &Constraints::default()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn resizes_to_target() {
        let input = fixtures::jpeg(160, 80, 95);
        let constraints = Constraints {
            mode: Mode::KeepQuality,
            resize: ResizeHints {
                target_width: Some(40),
                ..ResizeHints::default()
            },
            ..Constraints::default()
        };
        let out = Rerasterize.attempt(&input, &constraints).unwrap();
        assert_eq!(out.media_type, "image/jpeg");
        assert_eq!(fixtures::dimensions(&out), (40, 20));
    }

    #[test]
    fn downsized_png_wins_clearly() {
        let input = fixtures::png(128, 128);
        let constraints = Constraints {
            quality: 0.9,
            mode: Mode::KeepQuality,
            resize: ResizeHints {
                max_width: Some(32),
                max_height: Some(32),
                ..ResizeHints::default()
            },
            ..Constraints::default()
        };
        let out = Rerasterize.attempt(&input, &constraints).unwrap();
        assert_eq!(out.media_type, "image/png");
        assert_eq!(fixtures::dimensions(&out), (32, 32));
    }

    #[test]
    fn white_background_removes_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let flat = on_white(&img).to_rgba8();
        assert_eq!(flat.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn undecodable_input_fails() {
        let input = MediaBlob::new(b"not an image".to_vec(), "image/png");
        assert!(Rerasterize.attempt(&input, &Constraints::default()).is_err());
    }
}
