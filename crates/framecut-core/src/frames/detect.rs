use crate::config::{EdgeThresholds, FrameParams};
use crate::geometry::RotatedRect;
use crate::imgops::{
    adaptive_threshold, blur, close_mask, dilate_repeated, fit_rotated_rect, max_merge,
    median_intensity, sobel_magnitude, trace_contours, ContourMode,
};
use image::GrayImage;
use imageproc::contours::BorderType;
use imageproc::edges::canny;
use imageproc::geometry::contour_area;

/// Resolve the hysteresis thresholds for an image.
pub(crate) fn resolve_thresholds(edges: &EdgeThresholds, image: &GrayImage) -> (f32, f32) {
    match *edges {
        EdgeThresholds::Fixed { low, high } => (low, high),
        EdgeThresholds::Median { sigma } => {
            let median = median_intensity(image) as f32;
            let low = ((1.0 - sigma) * median).max(0.0);
            let high = ((1.0 + sigma) * median).min(255.0);
            (low, high)
        }
    }
}

/// Dilated binary edge mask of a grayscale image.
///
/// The gradient magnitude and the adaptive threshold are merged with a
/// per-pixel maximum before edge detection, so both soft exposure borders
/// and hard strip edges produce closed outlines.
pub fn edge_mask(gray: &GrayImage, params: &FrameParams) -> GrayImage {
    let blurred = blur(gray, params.blur_sigma);
    let gradient = sobel_magnitude(&blurred);
    let threshold = adaptive_threshold(&blurred, params.adaptive_block_size, -params.adaptive_bias);
    let merged = max_merge(&gradient, &threshold);

    let (low, high) = resolve_thresholds(&params.edges, &merged);
    let edges = canny(&merged, low, high);

    let dilated = dilate_repeated(&edges, params.dilation_radius, params.dilation_iterations);
    close_mask(&dilated, params.close_radius)
}

/// Candidate frame rectangles, independent of any perforation data.
///
/// Every edge line in the mask is a band [`FrameParams::band_extent`] wide
/// on each side. A hole border runs that far inside the innermost line and
/// an outer border that far outside the outermost one, so fitted rectangles
/// are moved back onto the lines. The innermost line of a ring is the
/// frame's own outline, so hole candidates come first and win overlap
/// suppression against the outer border of the same ring.
pub fn detect_regions(gray: &GrayImage, params: &FrameParams) -> Vec<RotatedRect> {
    let mask = edge_mask(gray, params);
    let extent = params.band_extent();

    let mut holes = Vec::new();
    let mut outers = Vec::new();
    for contour in trace_contours(&mask, ContourMode::All) {
        if contour_area(&contour.points) <= params.min_contour_area {
            continue;
        }
        let Some(region) = fit_rotated_rect(&contour.points) else {
            continue;
        };
        match contour.border_type {
            BorderType::Hole => holes.push(region.inflate(extent)),
            BorderType::Outer => outers.push(region.inflate(-extent)),
        }
    }

    log::debug!(
        "Frame detector: {} hole and {} outer candidate region(s)",
        holes.len(),
        outers.len()
    );
    holes.extend(outers);
    holes
}
