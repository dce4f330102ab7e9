//! Input handling and run settings.

mod input;
mod settings;

pub use input::{
    crop_stems, duplicate_stems, expand_inputs, output_dir_or_default, DEFAULT_OUTPUT_DIR,
};
pub use settings::{apply_overrides, load_calibration, resolve_config, ExtractOverrides};
