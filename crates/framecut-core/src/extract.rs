//! Frame extraction
//!
//! Clamp the final boxes to the image, crop, and hand each crop to a
//! [`CropSink`]. A box that cannot be cropped or saved is reported and
//! skipped; the remaining boxes are still processed.

use crate::config::{ExtractParams, OutputFormat};
use crate::geometry::Rect;
use image::DynamicImage;
use std::fmt;
use std::path::{Path, PathBuf};

/// Destination for extracted crops.
pub trait CropSink {
    /// Persist one crop under `name`, returning where it ended up.
    fn save(&mut self, name: &str, crop: &DynamicImage) -> Result<PathBuf, String>;
}

/// Writes crops as files into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    format: OutputFormat,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P, format: OutputFormat) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            format,
        }
    }
}

impl CropSink for DirectorySink {
    fn save(&mut self, name: &str, crop: &DynamicImage) -> Result<PathBuf, String> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Failed to create {}: {}", self.dir.display(), e))?;

        let path = self.dir.join(name);
        // JPEG has no alpha channel and no 16-bit mode
        let encoded = match self.format {
            OutputFormat::Jpeg => DynamicImage::ImageRgb8(crop.to_rgb8()),
            OutputFormat::Png | OutputFormat::Tiff => crop.clone(),
        };
        encoded
            .save_with_format(&path, self.format.image_format())
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        Ok(path)
    }
}

/// Builds `[<prefix>_]<stem>_frame_<NN>.<ext>` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropNaming {
    stem: String,
    prefix: Option<String>,
    extension: &'static str,
}

impl CropNaming {
    pub fn new(stem: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            stem: stem.into(),
            prefix: None,
            extension: format.extension(),
        }
    }

    pub fn from_params(stem: impl Into<String>, params: &ExtractParams) -> Self {
        Self::new(stem, params.format).with_prefix(params.prefix.clone())
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    /// Name of the crop at 1-based `position`.
    pub fn name(&self, position: usize) -> String {
        match &self.prefix {
            Some(prefix) => format!(
                "{}_{}_frame_{:02}.{}",
                prefix, self.stem, position, self.extension
            ),
            None => format!("{}_frame_{:02}.{}", self.stem, position, self.extension),
        }
    }
}

/// One crop that was persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCrop {
    /// Index of the box in the input list.
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
    /// The clamped rectangle that was cropped.
    pub rect: Rect,
}

/// Why one box produced no output.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxFailure {
    /// Nothing of the box was left inside the image.
    BoundsRejected { index: usize, rect: Rect },
    /// The sink refused the crop.
    PersistenceFailure {
        index: usize,
        name: String,
        reason: String,
    },
}

impl fmt::Display for BoxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxFailure::BoundsRejected { index, rect } => write!(
                f,
                "box {} ({}x{} at {},{}) lies outside the image",
                index + 1,
                rect.width(),
                rect.height(),
                rect.x(),
                rect.y()
            ),
            BoxFailure::PersistenceFailure {
                index,
                name,
                reason,
            } => write!(f, "box {} ({}) could not be saved: {}", index + 1, name, reason),
        }
    }
}

impl std::error::Error for BoxFailure {}

/// Outcome of extracting every box of one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    pub saved: Vec<SavedCrop>,
    pub failures: Vec<BoxFailure>,
}

impl ExtractionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Grow `rect` by `margin` on every side, then clamp it to the image.
pub fn clamp_box(rect: &Rect, margin: u32, width: u32, height: u32) -> Option<Rect> {
    let margin = i32::try_from(margin).unwrap_or(i32::MAX / 4);
    Rect::from_corners(
        rect.x().saturating_sub(margin),
        rect.y().saturating_sub(margin),
        rect.right().saturating_add(margin),
        rect.bottom().saturating_add(margin),
    )?
    .clamp_to(width, height)
}

/// Crop every box out of `image` and save it through `sink`.
pub fn extract_frames(
    image: &DynamicImage,
    boxes: &[Rect],
    naming: &CropNaming,
    margin: u32,
    sink: &mut dyn CropSink,
) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    for (index, rect) in boxes.iter().enumerate() {
        let Some(clamped) = clamp_box(rect, margin, image.width(), image.height()) else {
            log::warn!("Skipping box {}: outside the {}x{} image", index + 1, image.width(), image.height());
            report.failures.push(BoxFailure::BoundsRejected {
                index,
                rect: *rect,
            });
            continue;
        };

        let crop = image.crop_imm(
            clamped.x() as u32,
            clamped.y() as u32,
            clamped.width() as u32,
            clamped.height() as u32,
        );
        let name = naming.name(index + 1);

        match sink.save(&name, &crop) {
            Ok(path) => {
                log::debug!("Saved {}", path.display());
                report.saved.push(SavedCrop {
                    index,
                    name,
                    path,
                    rect: clamped,
                });
            }
            Err(reason) => {
                log::warn!("Failed to save {}: {}", name, reason);
                report.failures.push(BoxFailure::PersistenceFailure {
                    index,
                    name,
                    reason,
                });
            }
        }
    }

    report
}
