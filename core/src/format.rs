use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

/// An immutable byte buffer with a declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub data: Bytes,
    pub media_type: String,
}

impl MediaBlob {
    pub fn new(data: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn category(&self) -> MediaCategory {
        MediaCategory::classify(&self.media_type)
    }
}

/// A blob carrying a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFile {
    pub name: String,
    pub blob: MediaBlob,
}

impl NamedFile {
    pub const DEFAULT_NAME: &'static str = "compressed";

    pub fn new(name: impl Into<String>, blob: MediaBlob) -> Self {
        Self {
            name: name.into(),
            blob,
        }
    }

    /// Build a named file from a path on disk, inferring the media type from its extension.
    pub fn from_path(path: &Path, data: impl Into<Bytes>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| Self::DEFAULT_NAME.to_string());
        let media_type = media_type_from_path(path).unwrap_or("application/octet-stream");
        Self::new(name, MediaBlob::new(data, media_type))
    }
}

impl From<MediaBlob> for NamedFile {
    fn from(blob: MediaBlob) -> Self {
        Self::new(Self::DEFAULT_NAME, blob)
    }
}

/// Coarse media category used to pick candidate strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Png,
    Gif,
    Webp,
    Other,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 4] = [
        MediaCategory::Png,
        MediaCategory::Gif,
        MediaCategory::Webp,
        MediaCategory::Other,
    ];

    /// Classify a declared media type. JPEG and anything unrecognized fall to `Other`.
    pub fn classify(media_type: &str) -> Self {
        let media_type = media_type.to_ascii_lowercase();
        if media_type.contains("png") {
            MediaCategory::Png
        } else if media_type.contains("gif") {
            MediaCategory::Gif
        } else if media_type.contains("webp") {
            MediaCategory::Webp
        } else {
            MediaCategory::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Png => "PNG",
            MediaCategory::Gif => "GIF",
            MediaCategory::Webp => "WebP",
            MediaCategory::Other => "other",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a file extension to the media type a browser would declare for it.
pub fn media_type_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Preferred file extension for a media type.
pub fn extension_for_media_type(media_type: &str) -> Option<&'static str> {
    let media_type = media_type.to_ascii_lowercase();
    match MediaCategory::classify(&media_type) {
        MediaCategory::Png => Some("png"),
        MediaCategory::Gif => Some("gif"),
        MediaCategory::Webp => Some("webp"),
        MediaCategory::Other if is_jpeg_type(&media_type) => Some("jpg"),
        MediaCategory::Other if media_type.contains("bmp") => Some("bmp"),
        MediaCategory::Other if media_type.contains("tif") => Some("tiff"),
        MediaCategory::Other => None,
    }
}

/// True when the declared media type names JPEG.
pub(crate) fn is_jpeg_type(media_type: &str) -> bool {
    let media_type = media_type.to_ascii_lowercase();
    media_type.contains("jpeg") || media_type.contains("jpg")
}

/// Media type for an encoded `image` format.
pub(crate) fn media_type_of(format: image::ImageFormat) -> &'static str {
    match format {
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::Jpeg => "image/jpeg",
        image::ImageFormat::Gif => "image/gif",
        image::ImageFormat::WebP => "image/webp",
        image::ImageFormat::Bmp => "image/bmp",
        image::ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}
