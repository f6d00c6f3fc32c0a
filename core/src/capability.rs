//! Static capability table: which strategies are candidates for a media
//! category, and what each strategy can do.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CompressError;
use crate::format::MediaCategory;

/// Identifier of one of the built-in compression strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyId {
    /// Dedicated size-reduction pipeline (palette quantization, target-size search)
    RasterOptimizer,
    /// Plain lossy JPEG re-encode
    LossyReencode,
    /// GIF frame re-optimizer
    GifOptimizer,
    /// Decode and re-rasterize in the source format
    Rerasterize,
}

impl StrategyId {
    pub const ALL: [StrategyId; 4] = [
        StrategyId::RasterOptimizer,
        StrategyId::LossyReencode,
        StrategyId::GifOptimizer,
        StrategyId::Rerasterize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::RasterOptimizer => "raster-optimizer",
            StrategyId::LossyReencode => "lossy-reencode",
            StrategyId::GifOptimizer => "gif-optimizer",
            StrategyId::Rerasterize => "rerasterize",
        }
    }

    pub fn capability(&self) -> &'static Capability {
        match self {
            StrategyId::RasterOptimizer => &CAPABILITIES[0],
            StrategyId::LossyReencode => &CAPABILITIES[1],
            StrategyId::GifOptimizer => &CAPABILITIES[2],
            StrategyId::Rerasterize => &CAPABILITIES[3],
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown strategy: {s}"))
    }
}

#[derive(Debug)]
pub struct Capability {
    pub id: StrategyId,
    pub categories: &'static [MediaCategory],
    pub preserves_metadata: bool,
}

impl Capability {
    pub fn supports(&self, category: MediaCategory) -> bool {
        self.categories.contains(&category)
    }
}

pub static CAPABILITIES: [Capability; 4] = [
    Capability {
        id: StrategyId::RasterOptimizer,
        categories: &[MediaCategory::Png, MediaCategory::Webp, MediaCategory::Other],
        preserves_metadata: true,
    },
    Capability {
        id: StrategyId::LossyReencode,
        categories: &[MediaCategory::Other],
        preserves_metadata: true,
    },
    Capability {
        id: StrategyId::GifOptimizer,
        categories: &[MediaCategory::Gif],
        preserves_metadata: false,
    },
    Capability {
        id: StrategyId::Rerasterize,
        categories: &[MediaCategory::Png, MediaCategory::Webp, MediaCategory::Other],
        preserves_metadata: false,
    },
];

/// Candidate strategies for a category, in priority order.
pub fn candidates(category: MediaCategory) -> &'static [StrategyId] {
    match category {
        MediaCategory::Png => &[StrategyId::RasterOptimizer, StrategyId::Rerasterize],
        MediaCategory::Gif => &[StrategyId::GifOptimizer],
        MediaCategory::Webp => &[StrategyId::Rerasterize, StrategyId::RasterOptimizer],
        MediaCategory::Other => &[
            StrategyId::RasterOptimizer,
            StrategyId::LossyReencode,
            StrategyId::Rerasterize,
        ],
    }
}

/// Narrow the category's candidates to those able to honor the constraints.
/// Fails before any work is dispatched when nothing is left.
pub fn eligible(
    category: MediaCategory,
    preserve_metadata: bool,
) -> Result<Vec<StrategyId>, CompressError> {
    let selected: Vec<StrategyId> = candidates(category)
        .iter()
        .copied()
        .filter(|id| !preserve_metadata || id.capability().preserves_metadata)
        .collect();

    if selected.is_empty() {
        return Err(CompressError::NoEligibleStrategy { category });
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        for (i, cap) in CAPABILITIES.iter().enumerate() {
            assert_eq!(cap.id, StrategyId::ALL[i]);
            assert_eq!(cap.id.capability().id, cap.id);
        }
        for category in MediaCategory::ALL {
            for id in candidates(category) {
                assert!(id.capability().supports(category), "{id} listed for {category}");
            }
        }
    }

    #[test]
    fn gif_with_metadata_has_no_candidates() {
        let err = eligible(MediaCategory::Gif, true).unwrap_err();
        assert!(matches!(
            err,
            CompressError::NoEligibleStrategy { category: MediaCategory::Gif }
        ));
    }

    #[test]
    fn png_with_metadata_drops_rerasterize() {
        assert_eq!(
            eligible(MediaCategory::Png, true).unwrap(),
            vec![StrategyId::RasterOptimizer]
        );
        assert_eq!(
            eligible(MediaCategory::Png, false).unwrap(),
            vec![StrategyId::RasterOptimizer, StrategyId::Rerasterize]
        );
    }

    #[test]
    fn other_keeps_priority_order() {
        assert_eq!(
            eligible(MediaCategory::Other, true).unwrap(),
            vec![StrategyId::RasterOptimizer, StrategyId::LossyReencode]
        );
        assert_eq!(eligible(MediaCategory::Webp, false).unwrap()[0], StrategyId::Rerasterize);
    }

    #[test]
    fn ids_round_trip_through_strings() {
        for id in StrategyId::ALL {
            assert_eq!(id.as_str().parse::<StrategyId>().unwrap(), id);
        }
        assert!("original".parse::<StrategyId>().is_err());
    }
}
