use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompressError;

pub const DEFAULT_QUALITY: f32 = 0.6;

/// How the output may differ from the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Output dimensions equal input dimensions, only encoding efficiency varies.
    #[default]
    #[serde(rename = "keepSize")]
    KeepSize,
    /// Dimensions may change via target/max width/height.
    #[serde(rename = "keepQuality")]
    KeepQuality,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepSize => write!(f, "keepSize"),
            Self::KeepQuality => write!(f, "keepQuality"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keepsize" | "keep-size" => Ok(Self::KeepSize),
            "keepquality" | "keep-quality" => Ok(Self::KeepQuality),
            _ => Err(format!("unknown mode: {s}")),
        }
    }
}

/// Representation the caller wants results converted into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    #[default]
    #[serde(rename = "blob")]
    Blob,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "base64")]
    Base64,
    #[serde(rename = "arrayBuffer")]
    ArrayBuffer,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::File => write!(f, "file"),
            Self::Base64 => write!(f, "base64"),
            Self::ArrayBuffer => write!(f, "arrayBuffer"),
        }
    }
}

impl FromStr for ResultKind {
    type Err = CompressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blob" => Ok(Self::Blob),
            "file" => Ok(Self::File),
            "base64" => Ok(Self::Base64),
            "arraybuffer" | "array-buffer" => Ok(Self::ArrayBuffer),
            _ => Err(CompressError::UnsupportedRepresentation(s.to_string())),
        }
    }
}

/// Caller-facing options of a single `compress` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressOptions {
    /// Encoding quality in [0, 1]
    pub quality: f32,
    pub mode: Mode,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Only strategies that can carry EXIF through are eligible when set
    pub preserve_exif: bool,
    /// Return the full comparison report instead of the winner alone
    pub return_all_results: bool,
    #[serde(rename = "type")]
    pub result_kind: ResultKind,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            mode: Mode::KeepSize,
            target_width: None,
            target_height: None,
            max_width: None,
            max_height: None,
            preserve_exif: false,
            return_all_results: false,
            result_kind: ResultKind::Blob,
        }
    }
}

impl CompressOptions {
    /// Options equivalent to the legacy `(quality, type)` call shape.
    pub fn legacy(quality: f32, result_kind: ResultKind) -> Self {
        Self {
            quality,
            mode: Mode::KeepSize,
            result_kind,
            ..Self::default()
        }
    }

    /// Parse a JSON options object. An unrecognized `type` is reported as
    /// `UnsupportedRepresentation` rather than a generic parse error.
    pub fn from_json(json: &str) -> Result<Self, CompressError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(kind) = value.get("type").and_then(|t| t.as_str()) {
            ResultKind::from_str(kind)?;
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Anti-regression parameters used by the arbitrator.
///
/// The shipped thresholds are hand-tuned and should be calibrated against a
/// representative corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbitrationPolicy {
    /// Winner is discarded when `size >= original * size_ratio_threshold`...
    pub size_ratio_threshold: f64,
    /// ...and the requested quality is strictly above this value.
    pub quality_threshold: f32,
    /// Discard any winner strictly larger than the input. Off by default:
    /// adapters already hand back their input when they would grow it.
    pub reject_larger: bool,
}

impl Default for ArbitrationPolicy {
    fn default() -> Self {
        Self {
            size_ratio_threshold: 0.98,
            quality_threshold: 0.85,
            reject_larger: false,
        }
    }
}

/// Resize hints, only populated in keepQuality mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeHints {
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl ResizeHints {
    pub fn is_empty(&self) -> bool {
        self.target_width.is_none()
            && self.target_height.is_none()
            && self.max_width.is_none()
            && self.max_height.is_none()
    }
}

/// Normalized request constraints handed to every strategy. Never mutated
/// once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub quality: f32,
    pub mode: Mode,
    pub resize: ResizeHints,
    pub preserve_exif: bool,
}

impl Constraints {
    pub fn from_options(options: &CompressOptions) -> Self {
        let quality = if options.quality.is_finite() {
            options.quality.clamp(0.0, 1.0)
        } else {
            DEFAULT_QUALITY
        };

        let resize = match options.mode {
            Mode::KeepSize => ResizeHints::default(),
            Mode::KeepQuality => ResizeHints {
                target_width: options.target_width.filter(|&w| w > 0),
                target_height: options.target_height.filter(|&h| h > 0),
                max_width: options.max_width.filter(|&w| w > 0),
                max_height: options.max_height.filter(|&h| h > 0),
            },
        };

        Self {
            quality,
            mode: options.mode,
            resize,
            preserve_exif: options.preserve_exif,
        }
    }

    /// Quality as an 8-bit encoder setting in 1..=100.
    pub fn quality_percent(&self) -> u8 {
        percent(self.quality)
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::from_options(&CompressOptions::default())
    }
}

pub(crate) fn percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
