//! Raster operations shared by the perforation and frame detectors
//!
//! Thin wrappers over `imageproc` plus the few operations it does not offer
//! in the shape the detectors need (local-mean thresholding with a signed
//! offset, rotated region sampling).

use crate::geometry::{Point, RotatedRect};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::geometry::min_area_rect;
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::morphology;

const FOREGROUND: u8 = 255;

/// Gaussian sigma equivalent to a `block_size` x `block_size` kernel.
pub fn gaussian_sigma_for_block(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian blur that treats a non-positive sigma as "no blur".
pub fn blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma > 0.0 {
        gaussian_blur_f32(image, sigma)
    } else {
        image.clone()
    }
}

/// Binary mask of pixels whose value exceeds their Gaussian-weighted local
/// mean by more than `offset`.
///
/// A positive offset keeps only pixels clearly brighter than their
/// surroundings; a negative offset keeps everything that is not clearly
/// darker.
pub fn adaptive_threshold(image: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let local_mean = blur(image, gaussian_sigma_for_block(block_size));
    let mut mask = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        let value = image.get_pixel(x, y)[0] as f32;
        let mean = local_mean.get_pixel(x, y)[0] as f32;
        if value - mean > offset {
            *pixel = Luma([FOREGROUND]);
        }
    }
    mask
}

/// Sobel gradient magnitude `|gx| + |gy|`, saturated to 8 bits.
pub fn sobel_magnitude(image: &GrayImage) -> GrayImage {
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);
    let mut magnitude = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in magnitude.enumerate_pixels_mut() {
        let sum = (gx.get_pixel(x, y)[0] as i32).abs() + (gy.get_pixel(x, y)[0] as i32).abs();
        *pixel = Luma([sum.min(255) as u8]);
    }
    magnitude
}

/// Per-pixel maximum of two equally sized images.
pub fn max_merge(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut merged = a.clone();
    for (dst, src) in merged.pixels_mut().zip(b.pixels()) {
        dst[0] = dst[0].max(src[0]);
    }
    merged
}

/// Median pixel value (lower median for even counts).
pub fn median_intensity(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }
    let target = (total + 1) / 2;
    let mut seen = 0;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen >= target {
            return value as u8;
        }
    }
    255
}

pub fn max_intensity(image: &GrayImage) -> u8 {
    image.pixels().map(|p| p[0]).max().unwrap_or(0)
}

/// Dilate with a `(2r+1)` square kernel, `iterations` times.
pub fn dilate_repeated(mask: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    let mut out = mask.clone();
    if radius == 0 {
        return out;
    }
    for _ in 0..iterations {
        out = morphology::dilate(&out, Norm::LInf, radius);
    }
    out
}

/// Morphological closing with a `(2r+1)` square kernel; radius 0 is a no-op.
pub fn close_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    morphology::close(mask, Norm::LInf, radius)
}

/// Which contour borders to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourMode {
    /// Only outer borders of top-level components.
    External,
    /// Every outer and hole border.
    All,
}

/// Trace the borders of the non-zero regions of `mask`.
pub fn trace_contours(mask: &GrayImage, mode: ContourMode) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| match mode {
            ContourMode::External => {
                contour.border_type == BorderType::Outer && contour.parent.is_none()
            }
            ContourMode::All => true,
        })
        .collect()
}

/// Minimum-area rectangle around a traced border; `None` for an empty one.
pub fn fit_rotated_rect(points: &[imageproc::point::Point<i32>]) -> Option<RotatedRect> {
    if points.is_empty() {
        return None;
    }
    let corners = min_area_rect(points).map(|p| Point::new(p.x as f32, p.y as f32));
    Some(RotatedRect::from_corners(corners))
}

/// Mean and population standard deviation of the pixels whose centers lie
/// inside `region`. `None` when the region covers no pixel.
pub fn sample_region(image: &GrayImage, region: &RotatedRect) -> Option<(f64, f64)> {
    let bounds = region.bounds()?.clamp_to(image.width(), image.height())?;
    let (sin, cos) = region.angle.to_radians().sin_cos();
    let (half_w, half_h) = (region.width / 2.0, region.height / 2.0);

    let mut count = 0u64;
    let mut sum = 0.0_f64;
    let mut sum_sq = 0.0_f64;
    for y in bounds.y()..bounds.bottom() {
        for x in bounds.x()..bounds.right() {
            let dx = x as f32 - region.center.x;
            let dy = y as f32 - region.center.y;
            let along = dx * cos + dy * sin;
            let across = -dx * sin + dy * cos;
            if along.abs() > half_w || across.abs() > half_h {
                continue;
            }
            let value = image.get_pixel(x as u32, y as u32)[0] as f64;
            count += 1;
            sum += value;
            sum_sq += value * value;
        }
    }

    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
    Some((mean, variance.sqrt()))
}
