//! EXIF carry-over between an input and its re-encoded output.
//!
//! Blocks are copied verbatim in their container-native framing (JPEG APP1
//! segment, PNG `eXIf` chunk with its CRC, WebP `EXIF` chunk), so they can
//! only be embedded into an output of the same container.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Jpeg,
    Png,
    Webp,
}

impl Container {
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
            Some(Container::Jpeg)
        } else if data.len() >= 8 && &data[0..8] == PNG_SIGNATURE {
            Some(Container::Png)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(Container::Webp)
        } else {
            None
        }
    }
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A raw EXIF block lifted out of its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifBlock {
    pub container: Container,
    raw: Vec<u8>,
}

impl ExifBlock {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

pub fn extract_exif(data: &[u8]) -> Option<ExifBlock> {
    let container = Container::sniff(data)?;
    let raw = match container {
        Container::Jpeg => find_jpeg_exif(data),
        Container::Png => find_png_exif(data),
        Container::Webp => find_webp_exif(data),
    }?;
    Some(ExifBlock {
        container,
        raw: raw.to_vec(),
    })
}

/// Insert `exif` into `data`. Returns the input unchanged when the containers
/// differ, the output already carries EXIF, or its structure is not understood.
pub fn embed_exif(data: Vec<u8>, exif: &ExifBlock) -> Vec<u8> {
    if Container::sniff(&data) != Some(exif.container) {
        return data;
    }
    let embedded = match exif.container {
        Container::Jpeg => embed_jpeg(&data, &exif.raw),
        Container::Png => embed_png(&data, &exif.raw),
        Container::Webp => embed_webp(&data, &exif.raw),
    };
    match embedded {
        Some(out) => out,
        None => {
            log::debug!("EXIF not embedded: output structure not understood");
            data
        }
    }
}

// JPEG

/// Walk JPEG marker segments up to the start of scan, yielding
/// `(marker, segment_start, segment_end)`.
fn jpeg_segments(input: &[u8]) -> Vec<(u8, usize, usize)> {
    let mut segments = Vec::new();
    let mut pos = 2;

    while pos + 3 < input.len() {
        if input[pos] != 0xFF {
            break;
        }
        let marker = input[pos + 1];

        // fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        if marker == 0xDA || marker == 0xD9 {
            break;
        }

        let length = u16::from_be_bytes([input[pos + 2], input[pos + 3]]) as usize;
        let end = pos + 2 + length;
        if length < 2 || end > input.len() {
            break;
        }
        segments.push((marker, pos, end));
        pos = end;
    }

    segments
}

fn is_jpeg_exif(segment: &[u8]) -> bool {
    segment.len() > 10 && segment[1] == 0xE1 && segment[4..].starts_with(b"Exif\x00")
}

fn find_jpeg_exif(input: &[u8]) -> Option<&[u8]> {
    jpeg_segments(input)
        .into_iter()
        .map(|(_, start, end)| &input[start..end])
        .find(|segment| is_jpeg_exif(segment))
}

fn embed_jpeg(output: &[u8], raw: &[u8]) -> Option<Vec<u8>> {
    let segments = jpeg_segments(output);
    if segments
        .iter()
        .any(|&(_, start, end)| is_jpeg_exif(&output[start..end]))
    {
        return None;
    }

    // EXIF goes right after SOI, replacing a JFIF APP0 if one leads
    let mut rest = 2;
    if let Some(&(0xE0, start, end)) = segments.first() {
        if output[start + 4..end].starts_with(b"JFIF\x00") {
            rest = end;
        }
    }

    let mut out = Vec::with_capacity(output.len() + raw.len());
    out.extend_from_slice(&output[..2]);
    out.extend_from_slice(raw);
    out.extend_from_slice(&output[rest..]);
    Some(out)
}

// PNG

/// Walk PNG chunks, yielding `(type, chunk_start, chunk_end)` where the range
/// covers length, type, data and CRC.
fn png_chunks(input: &[u8]) -> Vec<([u8; 4], usize, usize)> {
    let mut chunks = Vec::new();
    let mut pos = PNG_SIGNATURE.len();

    while pos + 8 <= input.len() {
        let length =
            u32::from_be_bytes([input[pos], input[pos + 1], input[pos + 2], input[pos + 3]]) as usize;
        let chunk_type = [input[pos + 4], input[pos + 5], input[pos + 6], input[pos + 7]];
        let end = pos + 12 + length;
        if end > input.len() {
            break;
        }
        chunks.push((chunk_type, pos, end));
        pos = end;
    }

    chunks
}

fn find_png_exif(input: &[u8]) -> Option<&[u8]> {
    png_chunks(input)
        .into_iter()
        .find(|(t, _, _)| t == b"eXIf")
        .map(|(_, start, end)| &input[start..end])
}

fn embed_png(output: &[u8], raw: &[u8]) -> Option<Vec<u8>> {
    let chunks = png_chunks(output);
    if chunks.iter().any(|(t, _, _)| t == b"eXIf") {
        return None;
    }
    // eXIf must precede IDAT; right after IHDR is always valid
    let &(_, _, ihdr_end) = chunks.iter().find(|(t, _, _)| t == b"IHDR")?;

    let mut out = Vec::with_capacity(output.len() + raw.len());
    out.extend_from_slice(&output[..ihdr_end]);
    out.extend_from_slice(raw);
    out.extend_from_slice(&output[ihdr_end..]);
    Some(out)
}

// WebP

/// Walk RIFF chunks after the `WEBP` fourcc, yielding
/// `(fourcc, chunk_start, padded_end)`.
fn webp_chunks(input: &[u8]) -> Vec<([u8; 4], usize, usize)> {
    let mut chunks = Vec::new();
    let mut pos = 12;

    while pos + 8 <= input.len() {
        let fourcc = [input[pos], input[pos + 1], input[pos + 2], input[pos + 3]];
        let size = u32::from_le_bytes([
            input[pos + 4],
            input[pos + 5],
            input[pos + 6],
            input[pos + 7],
        ]) as usize;
        // chunks are padded to even size
        let padded = (size + 1) & !1;
        let end = (pos + 8 + padded).min(input.len());
        if pos + 8 + size > input.len() {
            break;
        }
        chunks.push((fourcc, pos, end));
        pos += 8 + padded;
    }

    chunks
}

fn find_webp_exif(input: &[u8]) -> Option<&[u8]> {
    webp_chunks(input)
        .into_iter()
        .find(|(t, _, _)| t == b"EXIF")
        .map(|(_, start, end)| &input[start..end])
}

/// Canvas size and alpha use from a simple-format bitstream chunk.
fn bitstream_info(fourcc: &[u8; 4], data: &[u8]) -> Option<(u32, u32, bool)> {
    match fourcc {
        b"VP8 " if data.len() >= 10 && data[3..6] == [0x9d, 0x01, 0x2a] => {
            let width = u16::from_le_bytes([data[6], data[7]]) & 0x3fff;
            let height = u16::from_le_bytes([data[8], data[9]]) & 0x3fff;
            Some((width as u32, height as u32, false))
        }
        b"VP8L" if data.len() >= 5 && data[0] == 0x2f => {
            let bits = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
            let width = (bits & 0x3fff) + 1;
            let height = ((bits >> 14) & 0x3fff) + 1;
            let alpha = (bits >> 28) & 1 == 1;
            Some((width, height, alpha))
        }
        _ => None,
    }
}

const VP8X_FLAG_ALPHA: u8 = 0x10;
const VP8X_FLAG_EXIF: u8 = 0x08;

fn embed_webp(output: &[u8], raw: &[u8]) -> Option<Vec<u8>> {
    let chunks = webp_chunks(output);
    if chunks.iter().any(|(t, _, _)| t == b"EXIF") {
        return None;
    }

    let mut out = Vec::with_capacity(output.len() + raw.len() + 18);
    out.extend_from_slice(&output[..12]);

    match chunks.first() {
        Some((fourcc, start, end)) if fourcc == b"VP8X" => {
            let mut vp8x = output[*start..*end].to_vec();
            if vp8x.len() < 9 {
                return None;
            }
            vp8x[8] |= VP8X_FLAG_EXIF;
            out.extend_from_slice(&vp8x);
            out.extend_from_slice(&output[*end..]);
        }
        Some((fourcc, start, end)) => {
            let data = &output[start + 8..*end];
            let (width, height, alpha) = bitstream_info(fourcc, data)?;
            if width == 0 || height == 0 {
                return None;
            }
            let mut flags = VP8X_FLAG_EXIF;
            if alpha {
                flags |= VP8X_FLAG_ALPHA;
            }
            out.extend_from_slice(b"VP8X");
            out.extend_from_slice(&10u32.to_le_bytes());
            out.extend_from_slice(&[flags, 0, 0, 0]);
            out.extend_from_slice(&(width - 1).to_le_bytes()[..3]);
            out.extend_from_slice(&(height - 1).to_le_bytes()[..3]);
            out.extend_from_slice(&output[*start..]);
        }
        None => return None,
    }

    out.extend_from_slice(raw);
    if raw.len() % 2 == 1 {
        out.push(0);
    }

    // RIFF size covers everything after the size field
    let riff_size = (out.len() - 8) as u32;
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());
    Some(out)
}
