//! Synthetic film strips for tests and benchmarks
//!
//! The generated strips mimic a scanned negative: a dark base, mid-gray
//! exposures and near-white perforations along the top edge.

use crate::geometry::Rect;
use image::{GrayImage, Luma};

pub const BACKGROUND: u8 = 40;
pub const FRAME: u8 = 120;
pub const PERFORATION: u8 = 250;

pub const PERFORATION_WIDTH: i32 = 20;
pub const PERFORATION_HEIGHT: i32 = 28;
pub const FRAME_WIDTH: i32 = 150;
pub const FRAME_HEIGHT: i32 = 220;

const MARGIN: i32 = 40;
const PERFORATION_TOP: i32 = 20;
const PERFORATION_PITCH: i32 = 80;
const FRAME_TOP: i32 = 90;
const FRAME_PITCH: i32 = 200;
const STRIP_HEIGHT: u32 = 350;

/// Ground truth of a generated strip.
#[derive(Debug, Clone, PartialEq)]
pub struct StripLayout {
    pub frames: Vec<Rect>,
    pub perforations: Vec<Rect>,
}

/// Paints filled rectangles over a flat background.
#[derive(Debug, Clone)]
pub struct StripBuilder {
    width: u32,
    height: u32,
    background: u8,
    fills: Vec<(Rect, Fill)>,
}

#[derive(Debug, Clone, Copy)]
enum Fill {
    Solid(u8),
    Checker(u8, u8),
}

impl StripBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: BACKGROUND,
            fills: Vec::new(),
        }
    }

    pub fn background(mut self, value: u8) -> Self {
        self.background = value;
        self
    }

    pub fn rect(mut self, rect: Rect, value: u8) -> Self {
        self.fills.push((rect, Fill::Solid(value)));
        self
    }

    /// A rectangle alternating between two values pixel by pixel.
    pub fn checker(mut self, rect: Rect, a: u8, b: u8) -> Self {
        self.fills.push((rect, Fill::Checker(a, b)));
        self
    }

    pub fn build(&self) -> GrayImage {
        let mut image = GrayImage::from_pixel(self.width, self.height, Luma([self.background]));
        for (rect, fill) in &self.fills {
            let Some(area) = rect.clamp_to(self.width, self.height) else {
                continue;
            };
            for y in area.y()..area.bottom() {
                for x in area.x()..area.right() {
                    let value = match *fill {
                        Fill::Solid(v) => v,
                        Fill::Checker(a, b) => {
                            if (x + y) % 2 == 0 {
                                a
                            } else {
                                b
                            }
                        }
                    };
                    image.put_pixel(x as u32, y as u32, Luma([value]));
                }
            }
        }
        image
    }
}

/// A horizontal strip with `frame_count` exposures and `perforation_count`
/// holes along its top edge.
pub fn film_strip(frame_count: usize, perforation_count: usize) -> (GrayImage, StripLayout) {
    let frames: Vec<Rect> = (0..frame_count as i32)
        .filter_map(|i| Rect::new(MARGIN + i * FRAME_PITCH, FRAME_TOP, FRAME_WIDTH, FRAME_HEIGHT))
        .collect();
    let perforations: Vec<Rect> = (0..perforation_count as i32)
        .filter_map(|i| {
            Rect::new(
                MARGIN + i * PERFORATION_PITCH,
                PERFORATION_TOP,
                PERFORATION_WIDTH,
                PERFORATION_HEIGHT,
            )
        })
        .collect();

    let right_edge = frames
        .iter()
        .chain(&perforations)
        .map(|r| r.right())
        .max()
        .unwrap_or(0);
    let width = (right_edge + MARGIN).max(2 * MARGIN) as u32;

    let mut builder = StripBuilder::new(width, STRIP_HEIGHT);
    for frame in &frames {
        builder = builder.rect(*frame, FRAME);
    }
    for perforation in &perforations {
        builder = builder.rect(*perforation, PERFORATION);
    }

    (
        builder.build(),
        StripLayout {
            frames,
            perforations,
        },
    )
}
