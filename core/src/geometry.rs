//! Output dimension arithmetic shared by the strategies.

use crate::config::ResizeHints;

fn scale(value: u32, num: u32, den: u32) -> u32 {
    if den == 0 {
        return value.max(1);
    }
    ((value as u64 * num as u64 + den as u64 / 2) / den as u64).max(1) as u32
}

/// Shrink `(width, height)` so it fits inside the given bounds, preserving
/// aspect ratio. Never enlarges.
pub fn fit_within(
    (width, height): (u32, u32),
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> (u32, u32) {
    let (mut w, mut h) = (width, height);
    if let Some(mw) = max_width {
        if w > mw {
            h = scale(h, mw, w);
            w = mw;
        }
    }
    if let Some(mh) = max_height {
        if h > mh {
            w = scale(w, mh, h);
            h = mh;
        }
    }
    (w.max(1), h.max(1))
}

/// Limit the longest side to `limit`, preserving aspect ratio.
pub fn limit_longest_side((width, height): (u32, u32), limit: u32) -> (u32, u32) {
    fit_within((width, height), Some(limit), Some(limit))
}

/// Explicit width and/or height; a missing side follows the aspect ratio.
pub fn explicit_size(
    (width, height): (u32, u32),
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> (u32, u32) {
    match (target_width, target_height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scale(height, w, width)),
        (None, Some(h)) => (scale(width, h, height), h),
        (None, None) => (width, height),
    }
}

/// Longest-side limit of the size-reduction pipeline: the smaller of the
/// width and height bounds, each taken from max or else target.
pub fn longest_side_limit(hints: &ResizeHints) -> Option<u32> {
    let w = hints.max_width.or(hints.target_width);
    let h = hints.max_height.or(hints.target_height);
    match (w, h) {
        (Some(w), Some(h)) => Some(w.min(h)),
        (w, h) => w.or(h),
    }
}

/// Canvas size for re-rasterization: target else max on each side, missing
/// sides derived from the source aspect ratio.
pub fn canvas_size(source: (u32, u32), hints: &ResizeHints) -> (u32, u32) {
    explicit_size(
        source,
        hints.target_width.or(hints.max_width),
        hints.target_height.or(hints.max_height),
    )
}

/// Explicit target size clamped into the max bounds.
pub fn bounded_size(source: (u32, u32), hints: &ResizeHints) -> (u32, u32) {
    let size = explicit_size(source, hints.target_width, hints.target_height);
    fit_within(size, hints.max_width, hints.max_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_never_enlarges() {
        assert_eq!(fit_within((100, 50), Some(200), Some(200)), (100, 50));
        assert_eq!(fit_within((400, 200), Some(200), None), (200, 100));
        assert_eq!(fit_within((400, 200), Some(300), Some(50)), (100, 50));
    }

    #[test]
    fn explicit_derives_missing_side() {
        assert_eq!(explicit_size((400, 200), Some(100), None), (100, 50));
        assert_eq!(explicit_size((400, 200), None, Some(100)), (200, 100));
        assert_eq!(explicit_size((400, 200), Some(10), Some(10)), (10, 10));
    }

    #[test]
    fn longest_side_prefers_max_over_target() {
        let hints = ResizeHints {
            target_width: Some(800),
            max_height: Some(300),
            ..ResizeHints::default()
        };
        assert_eq!(longest_side_limit(&hints), Some(300));
        assert_eq!(longest_side_limit(&ResizeHints::default()), None);
    }

    #[test]
    fn bounded_applies_max_after_target() {
        let hints = ResizeHints {
            target_width: Some(1000),
            max_width: Some(500),
            ..ResizeHints::default()
        };
        assert_eq!(bounded_size((2000, 1000), &hints), (500, 250));
    }

    #[test]
    fn degenerate_sizes_stay_positive() {
        assert_eq!(limit_longest_side((1000, 1), 10), (10, 1));
    }
}
