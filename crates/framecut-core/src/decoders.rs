//! Image decoding
//!
//! JPEG, PNG and TIFF (8 and 16 bit) through the `image` crate. The decoded
//! pixels are kept at their native depth so crops are written back without
//! loss; detection works on an 8-bit grayscale view.

use crate::error::FrameError;
use image::{DynamicImage, GrayImage, ImageReader};
use std::path::{Path, PathBuf};

/// File extensions accepted as source scans.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// A decoded source scan.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Name used in logs, errors and output file names (the file stem).
    pub name: String,

    /// Where the image was read from, if it came from disk.
    pub source: Option<PathBuf>,

    pub image: DynamicImage,
}

impl DecodedImage {
    /// Wrap an in-memory image. Fails for zero-area images.
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Result<Self, FrameError> {
        let name = name.into();
        if image.width() == 0 || image.height() == 0 {
            return Err(FrameError::invalid_input(name, "image has zero area"));
        }
        Ok(Self {
            name,
            source: None,
            image,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// 8-bit luminance view used by every detector.
    pub fn to_gray(&self) -> GrayImage {
        self.image.to_luma8()
    }
}

/// Whether a path has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an image from a file path.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DecodedImage, FrameError> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();

    if !is_supported_path(path) {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("<none>");
        return Err(FrameError::invalid_input(
            name,
            format!("unsupported file format: {}", extension),
        ));
    }

    let reader = ImageReader::open(path)
        .map_err(|source| FrameError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| FrameError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let image = reader
        .decode()
        .map_err(|e| FrameError::invalid_input(name.clone(), e))?;

    log::debug!(
        "Decoded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );

    let mut decoded = DecodedImage::new(name, image)?;
    decoded.source = Some(path.to_path_buf());
    Ok(decoded)
}

/// Decode an image held in memory, e.g. an upload body.
pub fn decode_bytes(bytes: &[u8], name: &str) -> Result<DecodedImage, FrameError> {
    if bytes.is_empty() {
        return Err(FrameError::invalid_input(name, "empty image data"));
    }
    let image = image::load_from_memory(bytes).map_err(|e| FrameError::invalid_input(name, e))?;
    DecodedImage::new(name, image)
}

#[cfg(test)]
mod tests;
