use std::io::Cursor;

use gif::{ColorOutput, DecodeOptions, Encoder, Frame, Repeat};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::capability::StrategyId;
use crate::config::{Constraints, Mode, ResizeHints};
use crate::error::StrategyError;
use crate::format::MediaBlob;
use crate::geometry::fit_within;
use crate::quantize::quantize_rgba;
use crate::strategy::{no_larger_than_input, Strategy};

/// Bound used for a missing side of the resize-fit square.
const UNBOUNDED_SIDE: u32 = 9999;
const QUANTIZE_SPEED: i32 = 4;

/// GIF re-optimizer: LZW re-encode, lossy palette reduction, frame scaling.
pub struct GifOptimizer;

struct Animation {
    width: u16,
    height: u16,
    global_palette: Vec<u8>,
    repeat: Repeat,
    frames: Vec<Frame<'static>>,
}

impl Strategy for GifOptimizer {
    fn id(&self) -> StrategyId {
        StrategyId::GifOptimizer
    }

    fn attempt(&self, input: &MediaBlob, constraints: &Constraints) -> Result<MediaBlob, StrategyError> {
        if !input.media_type.to_ascii_lowercase().contains("gif") {
            return Err(StrategyError::Unsupported(format!(
                "{} only handles GIF, got {}",
                self.id(),
                input.media_type
            )));
        }

        let output = match constraints.mode {
            Mode::KeepSize => {
                let lossiness = lossiness(constraints.quality);
                if lossiness == 0 {
                    reencode(read_animation(&input.data, ColorOutput::Indexed)?)?
                } else {
                    let animation = read_animation(&input.data, ColorOutput::RGBA)?;
                    let colors = palette_budget(lossiness);
                    log::debug!("gif-optimizer: lossiness {} -> {} colors", lossiness, colors);
                    reencode(requantize(animation, None, colors, 100 - lossiness as u8)?)?
                }
            }
            Mode::KeepQuality => match resize_target(&constraints.resize) {
                None => reencode(read_animation(&input.data, ColorOutput::Indexed)?)?,
                Some(target) => {
                    let animation = read_animation(&input.data, ColorOutput::RGBA)?;
                    let size = target.resolve(animation.width, animation.height);
                    reencode(requantize(animation, Some(size), 256, 100)?)?
                }
            },
        };

        let output = MediaBlob::new(output, "image/gif");
        Ok(no_larger_than_input(self.id(), input, output, constraints))
    }
}

/// Lossiness level 0..=100 derived from quality.
fn lossiness(quality: f32) -> u32 {
    ((1.0 - quality) * 100.0).round().clamp(0.0, 100.0) as u32
}

fn palette_budget(lossiness: u32) -> u32 {
    ((256.0 * (1.0 - lossiness as f64 / 100.0)).round() as u32).max(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResizeTarget {
    Exact(u32, u32),
    FitSquare(u32),
}

impl ResizeTarget {
    fn resolve(self, width: u16, height: u16) -> (u16, u16) {
        let (w, h) = match self {
            ResizeTarget::Exact(w, h) => (w, h),
            ResizeTarget::FitSquare(side) => {
                fit_within((width as u32, height as u32), Some(side), Some(side))
            }
        };
        (
            w.clamp(1, u16::MAX as u32) as u16,
            h.clamp(1, u16::MAX as u32) as u16,
        )
    }
}

fn resize_target(hints: &ResizeHints) -> Option<ResizeTarget> {
    match (hints.target_width, hints.target_height) {
        (Some(w), Some(h)) => Some(ResizeTarget::Exact(w, h)),
        _ if hints.max_width.is_some() || hints.max_height.is_some() => {
            let side = hints
                .max_width
                .unwrap_or(UNBOUNDED_SIDE)
                .min(hints.max_height.unwrap_or(UNBOUNDED_SIDE));
            Some(ResizeTarget::FitSquare(side))
        }
        _ => None,
    }
}

fn read_animation(data: &[u8], color_output: ColorOutput) -> Result<Animation, StrategyError> {
    let mut options = DecodeOptions::new();
    options.set_color_output(color_output);

    let mut decoder = options
        .read_info(Cursor::new(data))
        .map_err(|e| StrategyError::Decode(e.to_string()))?;

    let width = decoder.width();
    let height = decoder.height();
    let global_palette = decoder.global_palette().map(|p| p.to_vec()).unwrap_or_default();

    let mut frames = Vec::new();
    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| StrategyError::Decode(e.to_string()))?
    {
        frames.push(frame.clone());
    }

    if frames.is_empty() {
        return Err(StrategyError::Decode("GIF contains no frames".into()));
    }

    Ok(Animation {
        width,
        height,
        global_palette,
        repeat: decoder.repeat(),
        frames,
    })
}

/// Re-quantize every RGBA frame, optionally scaling the whole animation.
fn requantize(
    animation: Animation,
    size: Option<(u16, u16)>,
    max_colors: u32,
    quality: u8,
) -> Result<Animation, StrategyError> {
    let (width, height) = size.unwrap_or((animation.width, animation.height));
    let sx = width as f64 / animation.width.max(1) as f64;
    let sy = height as f64 / animation.height.max(1) as f64;

    let mut frames = Vec::with_capacity(animation.frames.len());
    for frame in &animation.frames {
        let left = ((frame.left as f64 * sx).round() as u16).min(width - 1);
        let top = ((frame.top as f64 * sy).round() as u16).min(height - 1);
        let w = ((frame.width as f64 * sx).round() as u16).clamp(1, width - left);
        let h = ((frame.height as f64 * sy).round() as u16).clamp(1, height - top);

        let rgba = if (w, h) == (frame.width, frame.height) {
            frame.buffer.to_vec()
        } else {
            let source = RgbaImage::from_raw(frame.width as u32, frame.height as u32, frame.buffer.to_vec())
                .ok_or_else(|| StrategyError::Decode("frame buffer does not match its size".into()))?;
            imageops::resize(&source, w as u32, h as u32, FilterType::Triangle).into_raw()
        };

        let quantized = quantize_rgba(&rgba, w as u32, h as u32, quality, QUANTIZE_SPEED, max_colors)?;
        let transparent = quantized.transparent_index();
        let palette = quantized.rgb_palette();
        let mut out = Frame::from_palette_pixels(w, h, &quantized.indices[..], &palette[..], transparent);
        out.left = left;
        out.top = top;
        out.delay = frame.delay;
        out.dispose = frame.dispose;
        frames.push(out);
    }

    Ok(Animation {
        width,
        height,
        // every frame now carries its own palette
        global_palette: Vec::new(),
        repeat: animation.repeat,
        frames,
    })
}

fn reencode(animation: Animation) -> Result<Vec<u8>, StrategyError> {
    let mut output = Vec::new();
    {
        let mut encoder = Encoder::new(&mut output, animation.width, animation.height, &animation.global_palette)
            .map_err(|e| StrategyError::Encode(e.to_string()))?;

        if animation.frames.len() > 1 {
            encoder
                .set_repeat(animation.repeat)
                .map_err(|e| StrategyError::Encode(e.to_string()))?;
        }

        for frame in &animation.frames {
            encoder
                .write_frame(frame)
                .map_err(|e| StrategyError::Encode(e.to_string()))?;
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-frame animation with noisy 64-colour content.
    fn animated_gif(width: u16, height: u16) -> MediaBlob {
        let mut data = Vec::new();
        {
            let mut encoder = Encoder::new(&mut data, width, height, &[]).unwrap();
            encoder.set_repeat(Repeat::Infinite).unwrap();
            for shift in 0..2u32 {
                let mut rgba: Vec<u8> = (0..width as u32 * height as u32)
                    .flat_map(|i| {
                        let v = ((i * 37 + shift * 11) % 64) as u8 * 4;
                        [v, 255 - v, v / 2, 255]
                    })
                    .collect();
                let mut frame = Frame::from_rgba_speed(width, height, &mut rgba, 10);
                frame.delay = 7;
                encoder.write_frame(&frame).unwrap();
            }
        }
        MediaBlob::new(data, "image/gif")
    }

    /// Single frame of hashed noise spread over the full 256-colour palette.
    fn noisy_gif(width: u16, height: u16) -> MediaBlob {
        let mut data = Vec::new();
        {
            let mut encoder = Encoder::new(&mut data, width, height, &[]).unwrap();
            let mut rgba: Vec<u8> = (0..width as u32 * height as u32)
                .flat_map(|i| {
                    let v = (i.wrapping_mul(2_654_435_761) >> 13) as u8;
                    [v, 255 - v, v.wrapping_mul(7), 255]
                })
                .collect();
            let frame = Frame::from_rgba_speed(width, height, &mut rgba, 10);
            encoder.write_frame(&frame).unwrap();
        }
        MediaBlob::new(data, "image/gif")
    }

    fn frames_of(blob: &MediaBlob) -> Animation {
        read_animation(&blob.data, ColorOutput::Indexed).unwrap()
    }

    #[test]
    fn lossless_reencode_keeps_animation() {
        let input = animated_gif(32, 24);
        let constraints = Constraints {
            quality: 1.0,
            ..Constraints::default()
        };
        let out = GifOptimizer.attempt(&input, &constraints).unwrap();
        let anim = frames_of(&out);
        assert_eq!((anim.width, anim.height), (32, 24));
        assert_eq!(anim.frames.len(), 2);
        assert_eq!(anim.frames[0].delay, 7);
        assert!(matches!(anim.repeat, Repeat::Infinite));
    }

    #[test]
    fn lossy_reduces_palette() {
        let input = noisy_gif(64, 64);
        let constraints = Constraints {
            quality: 0.1,
            ..Constraints::default()
        };
        let out = GifOptimizer.attempt(&input, &constraints).unwrap();
        assert!(out.len() < input.len());
        let anim = frames_of(&out);
        for frame in &anim.frames {
            let palette = frame.palette.as_ref().unwrap();
            // the encoder pads palettes to a power of two
            assert!(palette.len() / 3 <= palette_budget(90).next_power_of_two() as usize);
        }
    }

    #[test]
    fn keep_quality_fits_square() {
        let input = animated_gif(40, 20);
        let constraints = Constraints {
            mode: Mode::KeepQuality,
            resize: ResizeHints {
                max_width: Some(30),
                max_height: Some(10),
                ..ResizeHints::default()
            },
            ..Constraints::default()
        };
        let out = GifOptimizer.attempt(&input, &constraints).unwrap();
        let anim = frames_of(&out);
        assert_eq!((anim.width, anim.height), (10, 5));
        assert!(anim.frames.iter().all(|f| f.width <= 10 && f.height <= 5));
    }

    #[test]
    fn keep_quality_exact_target() {
        assert_eq!(
            resize_target(&ResizeHints {
                target_width: Some(5),
                target_height: Some(6),
                ..ResizeHints::default()
            }),
            Some(ResizeTarget::Exact(5, 6))
        );
        assert_eq!(
            resize_target(&ResizeHints {
                max_height: Some(50),
                ..ResizeHints::default()
            }),
            Some(ResizeTarget::FitSquare(50))
        );
        assert_eq!(resize_target(&ResizeHints::default()), None);
    }

    #[test]
    fn lossiness_mapping() {
        assert_eq!(lossiness(1.0), 0);
        assert_eq!(lossiness(0.6), 40);
        assert_eq!(lossiness(0.0), 100);
        assert_eq!(palette_budget(100), 2);
        assert_eq!(palette_budget(0), 256);
    }

    #[test]
    fn refuses_other_types() {
        let input = MediaBlob::new(vec![1, 2, 3], "image/png");
        assert!(matches!(
            GifOptimizer.attempt(&input, &Constraints::default()),
            Err(StrategyError::Unsupported(_))
        ));
    }
}
