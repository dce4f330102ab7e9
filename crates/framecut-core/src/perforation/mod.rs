//! Perforation analysis
//!
//! Sprocket holes are the one feature of a film strip with a physically
//! fixed size, so their measured geometry calibrates everything else. The
//! stages run in order: candidate detection, geometric and brightness
//! validation, overlap deduplication, then robust statistics.

mod detect;
mod stats;
mod validate;


pub use detect::detect_candidates;
pub use stats::{aggregate_statistics, PerforationStats};
pub use validate::{dedup_by_overlap, filter_by_brightness, filter_by_geometry};

use crate::config::PerforationParams;
use crate::geometry::{Rect, RotatedRect};
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// A fitted perforation rectangle with its derived measurements.
///
/// `width` is always the shorter side, so `aspect_ratio` is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerforationCandidate {
    pub rect: RotatedRect,
    pub width: f32,
    pub height: f32,
    pub aspect_ratio: f32,
    pub area: f32,
}

impl PerforationCandidate {
    pub fn from_rect(rect: RotatedRect) -> Self {
        let width = rect.short_side();
        let height = rect.long_side();
        let aspect_ratio = if height > 0.0 { width / height } else { 0.0 };
        Self {
            rect,
            width,
            height,
            aspect_ratio,
            area: width * height,
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.rect.bounds()
    }
}

/// Everything learned about the perforations of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct PerforationAnalysis {
    /// Raw contour candidates before validation.
    pub detected: usize,
    /// Candidates surviving validation and deduplication, in detection order.
    pub accepted: Vec<PerforationCandidate>,
    pub stats: PerforationStats,
}

/// Run the full perforation chain on a grayscale image.
pub fn analyze_perforations(gray: &GrayImage, params: &PerforationParams) -> PerforationAnalysis {
    let candidates: Vec<PerforationCandidate> = detect_candidates(gray, params)
        .into_iter()
        .map(PerforationCandidate::from_rect)
        .collect();
    let detected = candidates.len();

    let geometric = filter_by_geometry(candidates, params);
    let geometric_count = geometric.len();
    let bright = filter_by_brightness(geometric, gray, params);
    let bright_count = bright.len();
    let accepted = dedup_by_overlap(bright, params.iou_threshold);

    log::debug!(
        "Perforations: {} detected, {} geometric, {} bright, {} unique",
        detected,
        geometric_count,
        bright_count,
        accepted.len()
    );

    let stats = aggregate_statistics(&accepted, params.std_threshold);
    PerforationAnalysis {
        detected,
        accepted,
        stats,
    }
}
