use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::ResultKind;
use crate::format::{MediaBlob, NamedFile};

/// A result converted into the caller's requested shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    Blob(MediaBlob),
    File(NamedFile),
    /// `data:<type>;base64,<payload>` URL
    Base64(String),
    ArrayBuffer(Vec<u8>),
}

impl Representation {
    pub fn kind(&self) -> ResultKind {
        match self {
            Representation::Blob(_) => ResultKind::Blob,
            Representation::File(_) => ResultKind::File,
            Representation::Base64(_) => ResultKind::Base64,
            Representation::ArrayBuffer(_) => ResultKind::ArrayBuffer,
        }
    }

    /// Size of the underlying binary payload.
    pub fn byte_len(&self) -> usize {
        match self {
            Representation::Blob(blob) => blob.len(),
            Representation::File(file) => file.blob.len(),
            Representation::Base64(url) => {
                let payload = url.split_once(',').map_or("", |(_, p)| p);
                let padding = payload.bytes().rev().take_while(|&b| b == b'=').count();
                payload.len() / 4 * 3 - padding
            }
            Representation::ArrayBuffer(bytes) => bytes.len(),
        }
    }

    pub fn into_blob(self) -> Option<MediaBlob> {
        match self {
            Representation::Blob(blob) => Some(blob),
            Representation::File(file) => Some(file.blob),
            _ => None,
        }
    }
}

/// Convert a blob into the requested representation. `file_name` names the
/// file wrapper.
pub fn convert(blob: &MediaBlob, kind: ResultKind, file_name: &str) -> Representation {
    match kind {
        ResultKind::Blob => Representation::Blob(blob.clone()),
        ResultKind::File => Representation::File(NamedFile::new(file_name, blob.clone())),
        ResultKind::Base64 => Representation::Base64(data_url(blob)),
        ResultKind::ArrayBuffer => Representation::ArrayBuffer(blob.data.to_vec()),
    }
}

fn data_url(blob: &MediaBlob) -> String {
    let media_type = if blob.media_type.is_empty() {
        "application/octet-stream"
    } else {
        &blob.media_type
    };
    format!("data:{};base64,{}", media_type, STANDARD.encode(&blob.data))
}
