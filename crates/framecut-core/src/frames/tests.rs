//! Tests for frame detection and filtering

use super::detect::resolve_thresholds;
use super::*;
use crate::config::{EdgeThresholds, FilterParams, FrameParams};
use crate::geometry::{Point, Rect, RotatedRect};
use crate::perforation::PerforationStats;
use crate::synthetic::{self, StripBuilder};
use image::{GrayImage, Luma};

// ============================================================================
// Test Helpers
// ============================================================================

fn stats(width: f64, height: f64) -> PerforationStats {
    PerforationStats {
        average_width: width,
        average_height: height,
        average_aspect_ratio: width / height,
        average_area: width * height,
        valid_count: 4,
        ..PerforationStats::default()
    }
}

fn region(x: i32, y: i32, width: i32, height: i32) -> RotatedRect {
    RotatedRect::from(Rect::new(x, y, width, height).unwrap())
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn test_median_thresholds() {
    let image = GrayImage::from_pixel(10, 10, Luma([100]));
    let (low, high) = resolve_thresholds(&EdgeThresholds::Median { sigma: 0.33 }, &image);
    assert!((low - 67.0).abs() < 1e-3);
    assert!((high - 133.0).abs() < 1e-3);

    let bright = GrayImage::from_pixel(10, 10, Luma([250]));
    let (_, high) = resolve_thresholds(&EdgeThresholds::Median { sigma: 0.5 }, &bright);
    assert_eq!(high, 255.0);
}

#[test]
fn test_fixed_thresholds_pass_through() {
    let image = GrayImage::new(4, 4);
    let edges = EdgeThresholds::Fixed {
        low: 10.0,
        high: 50.0,
    };
    assert_eq!(resolve_thresholds(&edges, &image), (10.0, 50.0));
}

#[test]
fn test_uniform_image_has_no_regions() {
    let bright = StripBuilder::new(200, 150).background(255).build();
    assert!(detect_regions(&bright, &FrameParams::default()).is_empty());
}

#[test]
fn test_detector_outlines_every_frame() {
    let (gray, layout) = synthetic::film_strip(3, 6);
    let regions = detect_regions(&gray, &FrameParams::default());

    // Over-generation is expected, but each frame must be outlined
    assert!(regions.len() >= layout.frames.len());
    for frame in &layout.frames {
        let center = frame.center();
        let hit = regions.iter().any(|r| {
            r.center.distance_squared(center) < 4.0
                && (r.long_side() - frame.height() as f32).abs() < 3.0
        });
        assert!(hit, "no candidate around {:?}", frame);
    }
}

#[test]
fn test_first_region_is_the_frame_outline_not_the_band() {
    let (gray, layout) = synthetic::film_strip(1, 0);
    let params = FrameParams::default();
    let regions = detect_regions(&gray, &params);
    let truth = layout.frames[0];

    let first = regions[0].bounds().unwrap();
    assert!((first.x() - truth.x()).abs() <= 2, "{:?}", first);
    assert!((first.y() - truth.y()).abs() <= 2, "{:?}", first);
    assert!((first.right() - truth.right()).abs() <= 2, "{:?}", first);
    assert!((first.bottom() - truth.bottom()).abs() <= 2, "{:?}", first);

    // The outer border of the same ring comes later and only reaches the
    // outermost edge line, which sits outside the frame
    let outer = regions[1..]
        .iter()
        .filter_map(RotatedRect::bounds)
        .find(|r| r.iou(&first) > 0.5)
        .unwrap();
    assert!(outer.width() > first.width());
    assert!(outer.width() - truth.width() < 2 * params.band_extent() as i32);
}

#[test]
fn test_band_extent_follows_dilation() {
    let mut params = FrameParams::default();
    assert_eq!(params.band_extent(), 6.0);
    params.dilation_iterations = 0;
    assert_eq!(params.band_extent(), 0.0);
}

#[test]
fn test_edge_mask_is_binary() {
    let (gray, _) = synthetic::film_strip(1, 2);
    let mask = edge_mask(&gray, &FrameParams::default());
    assert!(mask.pixels().all(|p| p[0] == 0 || p[0] == 255));
    assert!(mask.pixels().any(|p| p[0] == 255));
}

// ============================================================================
// Envelope and filter
// ============================================================================

#[test]
fn test_envelope_from_stats() {
    let envelope = FrameEnvelope::from_stats(&stats(19.0, 27.0), &FilterParams::default()).unwrap();
    assert!((envelope.expected_width - 171.0).abs() < 1e-9);
    assert!((envelope.expected_height - 243.0).abs() < 1e-9);
    assert!((envelope.width_range.start() - 51.3).abs() < 1e-9);
    assert!((envelope.height_range.end() - 413.1).abs() < 1e-9);
}

#[test]
fn test_envelope_needs_calibration() {
    assert!(FrameEnvelope::from_stats(&PerforationStats::unavailable(), &FilterParams::default())
        .is_none());
}

#[test]
fn test_filter_bypassed_without_calibration() {
    let candidates = vec![region(0, 0, 3, 3), region(10, 10, 1000, 20)];
    let kept = filter_by_perforations(
        candidates.clone(),
        &PerforationStats::unavailable(),
        &FilterParams::default(),
        100,
        100,
    );
    assert_eq!(kept, candidates);
}

#[test]
fn test_filter_keeps_frame_sized_candidates() {
    let frame = region(40, 90, 160, 230);
    let perforation_outline = region(35, 15, 36, 44);
    let too_elongated = region(10, 10, 280, 100);
    let rotated_frame = RotatedRect {
        center: Point::new(500.0, 200.0),
        width: 160.0,
        height: 230.0,
        angle: 2.0,
    };

    let kept = filter_by_perforations(
        vec![perforation_outline, frame, too_elongated, rotated_frame],
        &stats(19.0, 27.0),
        &FilterParams::default(),
        1000,
        400,
    );
    assert_eq!(kept, vec![frame, rotated_frame]);
}

#[test]
fn test_filter_measures_visible_part_only() {
    // 400 wide in total but only 200 inside the image
    let overhanging = region(-200, 50, 400, 250);
    let kept = filter_by_perforations(
        vec![overhanging],
        &stats(19.0, 27.0),
        &FilterParams::default(),
        600,
        400,
    );
    assert_eq!(kept.len(), 1);
}

#[test]
fn test_dedup_frames_collapses_band_borders() {
    let outer = region(30, 80, 170, 240);
    let inner = region(38, 88, 154, 224);
    let neighbour = region(240, 80, 170, 240);
    let kept = dedup_frames(vec![outer, inner, neighbour], 0.5);
    assert_eq!(kept, vec![outer, neighbour]);
}
