//! Framecut Core Library
//!
//! Locates the exposures on a scanned 35mm film strip, using the
//! perforations as a physical size reference, and crops each one out.

pub mod config;
pub mod decoders;
pub mod error;
pub mod extract;
pub mod frames;
pub mod geometry;
pub mod imgops;
pub mod perforation;
pub mod pipeline;
pub mod profiles;
pub mod session;
pub mod synthetic;

// Re-export commonly used types
pub use config::{DetectionConfig, OutputFormat, Profile};
pub use decoders::{decode_bytes, load_image, DecodedImage};
pub use error::{DetectionStage, FrameError};
pub use extract::{BoxFailure, CropSink, DirectorySink, ExtractionReport};
pub use geometry::{Point, Rect, RotatedRect};
pub use perforation::{PerforationCandidate, PerforationStats};
pub use pipeline::{
    detect_frames, extract_boxes, measure_perforations, process_image, CalibrationSource,
    FrameDetection, PipelineWarning,
};
pub use session::{EditSession, InputEvent, SessionOutcome};
