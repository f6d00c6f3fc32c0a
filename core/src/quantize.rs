use crate::error::StrategyError;

/// Palette quantization result: RGBA palette plus one index per pixel.
pub struct Quantized {
    pub palette: Vec<imagequant::RGBA>,
    pub indices: Vec<u8>,
}

impl Quantized {
    /// Palette flattened to RGB triples, as GIF frames expect.
    pub fn rgb_palette(&self) -> Vec<u8> {
        self.palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }

    /// First fully transparent palette entry, if any.
    pub fn transparent_index(&self) -> Option<u8> {
        self.palette.iter().position(|c| c.a == 0).map(|i| i as u8)
    }
}

/// Reduce raw RGBA pixels to at most `max_colors` palette entries.
pub fn quantize_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    quality: u8,
    speed: i32,
    max_colors: u32,
) -> Result<Quantized, StrategyError> {
    let pixels: Vec<imagequant::RGBA> = rgba
        .chunks_exact(4)
        .map(|p| imagequant::RGBA {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
        .collect();

    let mut attr = imagequant::new();
    attr.set_quality(0, quality)
        .map_err(|e| StrategyError::Quantize(e.to_string()))?;
    attr.set_speed(speed)
        .map_err(|e| StrategyError::Quantize(e.to_string()))?;
    attr.set_max_colors(max_colors.clamp(2, 256))
        .map_err(|e| StrategyError::Quantize(e.to_string()))?;

    let mut image = attr
        .new_image_borrowed(&pixels, width as usize, height as usize, 0.0)
        .map_err(|e| StrategyError::Quantize(e.to_string()))?;

    let mut quantization = attr
        .quantize(&mut image)
        .map_err(|e| StrategyError::Quantize(e.to_string()))?;

    let (palette, indices) = quantization
        .remapped(&mut image)
        .map_err(|e| StrategyError::Quantize(e.to_string()))?;

    Ok(Quantized { palette, indices })
}

/// Encode quantized pixels as an 8-bit indexed PNG.
pub fn encode_indexed_png(
    quantized: &Quantized,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, StrategyError> {
    let palette: Vec<lodepng::RGBA> = quantized
        .palette
        .iter()
        .map(|c| lodepng::RGBA {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        })
        .collect();

    let mut encoder = lodepng::Encoder::new();
    encoder.set_auto_convert(false);
    encoder
        .set_palette(&palette)
        .map_err(|e| StrategyError::Encode(e.to_string()))?;

    {
        let raw = encoder.info_raw_mut();
        raw.set_colortype(lodepng::ColorType::PALETTE);
        raw.set_bitdepth(8);
        raw.palette_clear();
        for &color in &palette {
            raw.palette_add(color)
                .map_err(|e| StrategyError::Encode(e.to_string()))?;
        }
    }

    encoder
        .encode(&quantized.indices, width as usize, height as usize)
        .map_err(|e| StrategyError::Encode(e.to_string()))
}
