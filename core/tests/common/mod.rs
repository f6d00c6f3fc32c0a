#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};
use squeezer_core::config::Constraints;
use squeezer_core::strategy::Strategy;
use squeezer_core::{Compressor, MediaBlob, StrategyError, StrategyId};

/// What a scripted strategy does when attempted.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Succeed with this many bytes.
    Size(usize),
    /// Succeed with this share of the input size.
    Ratio(f64),
    Fail,
    Panic,
}

/// Strategy stand-in with a fixed behavior that counts its invocations.
pub struct Scripted {
    pub id: StrategyId,
    pub script: Script,
    pub calls: AtomicUsize,
}

impl Scripted {
    pub fn new(id: StrategyId, script: Script) -> Arc<Self> {
        Arc::new(Self {
            id,
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Strategy for Scripted {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn attempt(&self, input: &MediaBlob, _: &Constraints) -> Result<MediaBlob, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let size = match self.script {
            Script::Size(size) => size,
            Script::Ratio(ratio) => (input.len() as f64 * ratio) as usize,
            Script::Fail => return Err(StrategyError::Encode(format!("{} scripted failure", self.id))),
            Script::Panic => panic!("{} scripted panic", self.id),
        };
        Ok(MediaBlob::new(vec![self.id as u8; size], input.media_type.clone()))
    }
}

/// Compressor whose every strategy follows `script` for the listed ids.
pub fn scripted(scripts: &[(StrategyId, Script)]) -> (Compressor, Vec<Arc<Scripted>>) {
    let mut compressor = Compressor::empty();
    let mut handles = Vec::new();
    for &(id, script) in scripts {
        let strategy = Scripted::new(id, script);
        compressor.register(strategy.clone());
        handles.push(strategy);
    }
    (compressor, handles)
}

pub fn opaque_blob(size: usize, media_type: &str) -> MediaBlob {
    MediaBlob::new(vec![0xAB; size], media_type)
}

pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let n = ((x * 5 + y * 11) % 7) as u8;
        Rgba([(x % 256) as u8 ^ n, (y % 256) as u8, ((x * y) % 256) as u8, 255])
    }))
}

pub fn encode(img: &DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format).unwrap();
    out
}

pub fn jpeg_file(width: u32, height: u32, quality: u8) -> MediaBlob {
    let rgb = gradient(width, height).to_rgb8();
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut Cursor::new(&mut out), quality)
        .encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    MediaBlob::new(out, "image/jpeg")
}

pub fn png_file(width: u32, height: u32) -> MediaBlob {
    MediaBlob::new(encode(&gradient(width, height), image::ImageFormat::Png), "image/png")
}

pub fn gif_file(width: u16, height: u16) -> MediaBlob {
    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, width, height, &[]).unwrap();
        let mut rgba = gradient(width as u32, height as u32).to_rgba8().into_raw();
        let frame = gif::Frame::from_rgba_speed(width, height, &mut rgba, 10);
        encoder.write_frame(&frame).unwrap();
    }
    MediaBlob::new(out, "image/gif")
}
