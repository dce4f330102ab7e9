use crate::config::PerforationParams;
use crate::geometry::RotatedRect;
use crate::imgops::{adaptive_threshold, close_mask, fit_rotated_rect, trace_contours, ContourMode};
use image::GrayImage;
use imageproc::geometry::contour_area;

/// Find candidate perforation rectangles.
///
/// Bright local maxima are isolated with an adaptive threshold, cleaned with
/// a closing, and the outer contour of each remaining blob is fitted with a
/// minimum-area rectangle. An empty result is valid.
pub fn detect_candidates(gray: &GrayImage, params: &PerforationParams) -> Vec<RotatedRect> {
    let mask = adaptive_threshold(gray, params.block_size, params.bias);
    let mask = close_mask(&mask, params.close_radius);

    trace_contours(&mask, ContourMode::External)
        .into_iter()
        .filter(|contour| contour_area(&contour.points) >= params.min_contour_area)
        .filter_map(|contour| fit_rotated_rect(&contour.points))
        .collect()
}
