//! Shared utilities for framecut-cli
//!
//! Argument parsers and input/settings handling used by the command
//! implementations in the `framecut` binary.

pub mod parsers;
pub mod processing;

// Re-export commonly used items at the crate root for convenience
pub use parsers::{parse_margin, parse_output_format, parse_prefix, parse_threads};
pub use processing::{
    apply_overrides, crop_stems, duplicate_stems, expand_inputs, load_calibration, output_dir_or_default,
    resolve_config, ExtractOverrides, DEFAULT_OUTPUT_DIR,
};
