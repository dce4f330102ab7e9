use super::PerforationCandidate;
use crate::config::PerforationParams;
use crate::geometry::{dedup_by_iou, RotatedRect};
use crate::imgops::{max_intensity, sample_region};
use image::GrayImage;

/// Keep candidates whose aspect ratio and side lengths are plausible.
pub fn filter_by_geometry(
    candidates: Vec<PerforationCandidate>,
    params: &PerforationParams,
) -> Vec<PerforationCandidate> {
    let size_range = params.min_size..=params.max_size;
    let aspect_range = params.min_aspect_ratio..=params.max_aspect_ratio;

    candidates
        .into_iter()
        .filter(|c| {
            aspect_range.contains(&c.aspect_ratio)
                && size_range.contains(&c.width)
                && size_range.contains(&c.height)
        })
        .collect()
}

/// Keep candidates whose interior is bright and uniform.
///
/// Each rectangle is shrunk toward its center by `shrink_factor` so the
/// sample stays clear of the hole's edges.
pub fn filter_by_brightness(
    candidates: Vec<PerforationCandidate>,
    gray: &GrayImage,
    params: &PerforationParams,
) -> Vec<PerforationCandidate> {
    let min_mean = max_intensity(gray) as f64 * params.brightness_threshold_factor as f64;
    let keep = 1.0 - params.shrink_factor;

    candidates
        .into_iter()
        .filter(|c| {
            let interior = RotatedRect {
                width: c.rect.width * keep,
                height: c.rect.height * keep,
                ..c.rect
            };
            match sample_region(gray, &interior) {
                Some((mean, std)) => mean >= min_mean && std <= params.max_interior_std,
                None => false,
            }
        })
        .collect()
}

/// Drop candidates overlapping an earlier one by `iou_threshold` or more.
pub fn dedup_by_overlap(
    candidates: Vec<PerforationCandidate>,
    iou_threshold: f64,
) -> Vec<PerforationCandidate> {
    dedup_by_iou(candidates, iou_threshold, PerforationCandidate::bounds)
}
