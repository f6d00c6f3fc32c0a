use image::GenericImageView;

use crate::capability::StrategyId;
use crate::config::{Constraints, Mode};
use crate::error::StrategyError;
use crate::format::{is_jpeg_type, MediaBlob};
use crate::geometry::bounded_size;
use crate::metadata::{embed_exif, extract_exif};
use crate::strategy::{encode_jpeg, no_larger_than_input, resize_to, Strategy};

/// Single-pass lossy JPEG re-encode. JPEG inputs only.
pub struct LossyReencode;

impl Strategy for LossyReencode {
    fn id(&self) -> StrategyId {
        StrategyId::LossyReencode
    }

    fn attempt(&self, input: &MediaBlob, constraints: &Constraints) -> Result<MediaBlob, StrategyError> {
        if !is_jpeg_type(&input.media_type) {
            return Err(StrategyError::Unsupported(format!(
                "{} only re-encodes JPEG, got {}",
                self.id(),
                input.media_type
            )));
        }

        let img = image::load_from_memory_with_format(&input.data, image::ImageFormat::Jpeg)
            .map_err(|e| StrategyError::Decode(e.to_string()))?;

        let img = match constraints.mode {
            Mode::KeepSize => img,
            Mode::KeepQuality => {
                let size = bounded_size(img.dimensions(), &constraints.resize);
                resize_to(img, size)
            }
        };

        let mut output = encode_jpeg(&img, constraints.quality_percent())?;

        if constraints.preserve_exif {
            if let Some(exif) = extract_exif(&input.data) {
                output = embed_exif(output, &exif);
            }
        }

        let output = MediaBlob::new(output, input.media_type.clone());
        Ok(no_larger_than_input(self.id(), input, output, constraints))
    }
}
