use crate::config::FilterParams;
use crate::geometry::{dedup_by_iou, Rect, RotatedRect};
use crate::perforation::PerforationStats;
use std::ops::RangeInclusive;

/// Expected frame size derived from perforation statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEnvelope {
    pub expected_width: f64,
    pub expected_height: f64,
    pub width_range: RangeInclusive<f64>,
    pub height_range: RangeInclusive<f64>,
    /// Long side / short side.
    pub aspect_range: RangeInclusive<f64>,
}

impl FrameEnvelope {
    /// `None` when the statistics carry no calibration.
    pub fn from_stats(stats: &PerforationStats, params: &FilterParams) -> Option<Self> {
        if !stats.is_calibrated() {
            return None;
        }
        let expected_width = stats.average_width * params.width_multiplier;
        let expected_height = stats.average_height * params.height_multiplier;
        Some(Self {
            expected_width,
            expected_height,
            width_range: window(expected_width, params.width_tolerance),
            height_range: window(expected_height, params.height_tolerance),
            aspect_range: params.min_aspect_ratio..=params.max_aspect_ratio,
        })
    }

    pub fn accepts(&self, bounds: &Rect) -> bool {
        let width = bounds.width() as f64;
        let height = bounds.height() as f64;
        self.width_range.contains(&width)
            && self.height_range.contains(&height)
            && self.aspect_range.contains(&(bounds.elongation() as f64))
    }
}

fn window(expected: f64, tolerance: f64) -> RangeInclusive<f64> {
    (1.0 - tolerance) * expected..=(1.0 + tolerance) * expected
}

/// Keep the candidates whose size fits the perforation-derived envelope.
///
/// Candidates are measured by their axis-aligned bounds, clipped to the
/// `image_width` x `image_height` image so a frame running off the scan is
/// judged by its visible part. Without calibration the input is returned
/// unchanged.
pub fn filter_by_perforations(
    candidates: Vec<RotatedRect>,
    stats: &PerforationStats,
    params: &FilterParams,
    image_width: u32,
    image_height: u32,
) -> Vec<RotatedRect> {
    let Some(envelope) = FrameEnvelope::from_stats(stats, params) else {
        log::debug!("Frame filter bypassed: no perforation calibration");
        return candidates;
    };

    log::debug!(
        "Frame envelope: width {:.0}..{:.0}, height {:.0}..{:.0}",
        envelope.width_range.start(),
        envelope.width_range.end(),
        envelope.height_range.start(),
        envelope.height_range.end()
    );

    let total = candidates.len();
    let kept: Vec<RotatedRect> = candidates
        .into_iter()
        .filter(|candidate| {
            candidate
                .bounds()
                .and_then(|b| b.clamp_to(image_width, image_height))
                .is_some_and(|b| envelope.accepts(&b))
        })
        .collect();

    log::debug!("Frame filter kept {} of {} candidate(s)", kept.len(), total);
    kept
}

/// Collapse candidates that describe the same frame, earlier ones winning.
pub fn dedup_frames(candidates: Vec<RotatedRect>, iou_threshold: f64) -> Vec<RotatedRect> {
    dedup_by_iou(candidates, iou_threshold, RotatedRect::bounds)
}
