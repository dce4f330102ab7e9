//! Detection configuration
//!
//! One [`DetectionConfig`] drives every stage. Built-in profiles cover the
//! common scanning setups, a YAML file on disk can override any field, and
//! every section is sanitized after loading so the algorithms never see an
//! even block size or an inverted range.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Once;

/// Candidate config file names searched on disk.
const CONFIG_FILENAMES: &[&str] = &["framecut.yml", "framecut.yaml"];

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FRAMECUT_CONFIG";

// ============================================================================
// Profiles
// ============================================================================

/// Built-in parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Balanced settings for flatbed and camera scans.
    #[default]
    Default,
    /// Heavier dilation and lower thresholds for faint frame borders.
    Aggressive,
    /// Median-derived edge thresholds and a tight size envelope.
    Conservative,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Default, Profile::Aggressive, Profile::Conservative];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Default => "default",
            Profile::Aggressive => "aggressive",
            Profile::Conservative => "conservative",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Profile::Default),
            "aggressive" => Ok(Profile::Aggressive),
            "conservative" => Ok(Profile::Conservative),
            other => Err(format!(
                "Unknown profile '{}'. Valid options: default, aggressive, conservative",
                other
            )),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Complete configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub perforation: PerforationParams,
    pub frames: FrameParams,
    pub filter: FilterParams,
    pub session: SessionParams,
    pub extract: ExtractParams,
}

impl DetectionConfig {
    pub fn for_profile(profile: Profile) -> Self {
        let mut config = Self::default();
        match profile {
            Profile::Default => {}
            Profile::Aggressive => {
                config.perforation.bias = 1.0;
                config.perforation.min_contour_area = 30.0;
                config.perforation.max_interior_std = 30.0;
                config.frames.dilation_radius = 3;
                config.frames.edges = EdgeThresholds::Fixed {
                    low: 5.0,
                    high: 30.0,
                };
            }
            Profile::Conservative => {
                config.perforation.brightness_threshold_factor = 0.85;
                config.perforation.max_interior_std = 15.0;
                config.frames.edges = EdgeThresholds::Median { sigma: 0.33 };
                config.frames.dilation_radius = 1;
                config.frames.dilation_iterations = 2;
                config.frames.close_radius = 2;
                config.frames.min_contour_area = 500.0;
                config.filter.width_tolerance = 0.35;
                config.filter.height_tolerance = 0.35;
                config.filter.min_aspect_ratio = 1.2;
                config.filter.max_aspect_ratio = 1.8;
            }
        }
        config
    }

    /// Clamp every section into its valid range.
    pub fn sanitize(mut self) -> Self {
        self.perforation.sanitize();
        self.frames.sanitize();
        self.filter.sanitize();
        self.session.sanitize();
        self.extract.sanitize();
        self
    }
}

/// Perforation detection, validation and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerforationParams {
    /// Neighbourhood of the adaptive threshold (odd, >= 3).
    pub block_size: u32,
    /// A pixel must exceed its local mean by more than this to count.
    pub bias: f32,
    /// Radius of the square closing kernel (1 = 3x3).
    pub close_radius: u8,
    pub min_contour_area: f64,
    /// Accepted range of short side / long side.
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Fraction removed from each dimension before sampling the interior.
    pub shrink_factor: f32,
    /// Interior mean must reach this fraction of the image maximum.
    pub brightness_threshold_factor: f32,
    pub max_interior_std: f64,
    pub iou_threshold: f64,
    /// Outlier cutoff in standard deviations.
    pub std_threshold: f64,
}

impl PerforationParams {
    pub(crate) fn sanitize(&mut self) {
        self.block_size = sanitize_block_size(self.block_size);
        self.close_radius = self.close_radius.min(10);
        self.min_contour_area = self.min_contour_area.max(0.0);
        self.min_aspect_ratio = self.min_aspect_ratio.clamp(0.0, 1.0);
        self.max_aspect_ratio = self.max_aspect_ratio.clamp(self.min_aspect_ratio, 1.0);
        self.min_size = self.min_size.max(1.0);
        self.max_size = self.max_size.max(self.min_size);
        self.shrink_factor = self.shrink_factor.clamp(0.0, 0.9);
        self.brightness_threshold_factor = self.brightness_threshold_factor.clamp(0.0, 1.0);
        self.max_interior_std = self.max_interior_std.max(0.0);
        self.iou_threshold = self.iou_threshold.clamp(0.0, 1.0);
        self.std_threshold = self.std_threshold.max(0.0);
    }
}

impl Default for PerforationParams {
    fn default() -> Self {
        Self {
            block_size: 15,
            bias: 2.0,
            close_radius: 1,
            min_contour_area: 50.0,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 1.0,
            min_size: 10.0,
            max_size: 400.0,
            shrink_factor: 0.2,
            brightness_threshold_factor: 0.8,
            max_interior_std: 20.0,
            iou_threshold: 0.5,
            std_threshold: 2.0,
        }
    }
}

/// How the Canny hysteresis thresholds are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EdgeThresholds {
    Fixed { low: f32, high: f32 },
    /// `low = (1 - sigma) * median`, `high = (1 + sigma) * median`.
    Median { sigma: f32 },
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        EdgeThresholds::Fixed {
            low: 10.0,
            high: 50.0,
        }
    }
}

/// Frame region detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameParams {
    pub blur_sigma: f32,
    pub adaptive_block_size: u32,
    /// A pixel stays foreground unless it is darker than its local mean by more than this.
    pub adaptive_bias: f32,
    pub edges: EdgeThresholds,
    pub dilation_radius: u8,
    pub dilation_iterations: u32,
    /// Radius of the optional closing after dilation (0 disables it).
    pub close_radius: u8,
    pub min_contour_area: f64,
}

impl FrameParams {
    pub(crate) fn sanitize(&mut self) {
        self.blur_sigma = self.blur_sigma.clamp(0.0, 20.0);
        self.adaptive_block_size = sanitize_block_size(self.adaptive_block_size);
        self.edges = match self.edges {
            EdgeThresholds::Fixed { low, high } => {
                let low = low.clamp(0.0, 255.0);
                EdgeThresholds::Fixed {
                    low,
                    high: high.clamp(low, 255.0),
                }
            }
            EdgeThresholds::Median { sigma } => EdgeThresholds::Median {
                sigma: sigma.clamp(0.0, 1.0),
            },
        };
        self.dilation_radius = self.dilation_radius.min(10);
        self.dilation_iterations = self.dilation_iterations.min(20);
        self.close_radius = self.close_radius.min(10);
        self.min_contour_area = self.min_contour_area.max(0.0);
    }

    /// How far dilation spreads an edge line to each side, in pixels.
    pub fn band_extent(&self) -> f32 {
        self.dilation_radius as f32 * self.dilation_iterations as f32
    }
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            adaptive_block_size: 11,
            adaptive_bias: 2.0,
            edges: EdgeThresholds::default(),
            dilation_radius: 2,
            dilation_iterations: 3,
            close_radius: 0,
            min_contour_area: 10.0,
        }
    }
}

/// Perforation-guided size envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub width_multiplier: f64,
    pub height_multiplier: f64,
    /// Relative tolerance around the expected width, in `[0, 1)`.
    pub width_tolerance: f64,
    pub height_tolerance: f64,
    /// Accepted range of long side / short side.
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Overlap above which a later frame candidate is dropped.
    pub frame_iou_threshold: f64,
}

impl FilterParams {
    pub(crate) fn sanitize(&mut self) {
        self.width_multiplier = self.width_multiplier.max(0.0);
        self.height_multiplier = self.height_multiplier.max(0.0);
        self.width_tolerance = self.width_tolerance.clamp(0.0, 0.99);
        self.height_tolerance = self.height_tolerance.clamp(0.0, 0.99);
        self.min_aspect_ratio = self.min_aspect_ratio.max(1.0);
        self.max_aspect_ratio = self.max_aspect_ratio.max(self.min_aspect_ratio);
        self.frame_iou_threshold = self.frame_iou_threshold.clamp(0.0, 1.0);
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            width_multiplier: 9.0,
            height_multiplier: 9.0,
            width_tolerance: 0.7,
            height_tolerance: 0.7,
            min_aspect_ratio: 1.0,
            max_aspect_ratio: 2.2,
            frame_iou_threshold: 0.5,
        }
    }
}

/// Interactive editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    /// Corner hit radius in display pixels.
    pub anchor_radius: f32,
    /// Side of the square added with a secondary click, in image pixels.
    pub new_box_size: i32,
}

impl SessionParams {
    pub(crate) fn sanitize(&mut self) {
        self.anchor_radius = self.anchor_radius.clamp(1.0, 100.0);
        self.new_box_size = self.new_box_size.max(2);
    }
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            anchor_radius: 10.0,
            new_box_size: 100,
        }
    }
}

/// Crop persistence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractParams {
    pub format: OutputFormat,
    /// Optional namespace prepended to every crop name.
    pub prefix: Option<String>,
    /// Pixels added on every side of a box before clamping.
    pub margin: u32,
}

impl ExtractParams {
    pub(crate) fn sanitize(&mut self) {
        self.margin = self.margin.min(1000);
        if self.prefix.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.prefix = None;
        }
    }
}

/// Encoded format of extracted crops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Tiff,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            other => Err(format!(
                "Unknown output format '{}'. Valid options: jpeg, png, tiff",
                other
            )),
        }
    }
}

fn sanitize_block_size(block_size: u32) -> u32 {
    let clamped = block_size.clamp(3, 255);
    if clamped % 2 == 0 {
        clamped + 1
    } else {
        clamped
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Loaded configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    pub config: DetectionConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Load configuration from disk, optionally forcing a specific path.
///
/// Unreadable or unparsable candidates become warnings and the search moves
/// on; when nothing loads, the built-in defaults are returned.
pub fn load_config(custom_path: Option<&Path>) -> ConfigHandle {
    let mut warnings = Vec::new();

    for candidate in config_candidates(custom_path) {
        if !candidate.is_file() {
            continue;
        }

        match fs::read_to_string(&candidate) {
            Ok(contents) => match serde_yaml::from_str::<DetectionConfig>(&contents) {
                Ok(config) => {
                    let source = fs::canonicalize(&candidate).unwrap_or(candidate);
                    return ConfigHandle {
                        config: config.sanitize(),
                        source: Some(source),
                        warnings,
                    };
                }
                Err(err) => warnings.push(format!(
                    "Failed to parse config {}: {}",
                    candidate.display(),
                    err
                )),
            },
            Err(err) => warnings.push(format!(
                "Failed to read config {}: {}",
                candidate.display(),
                err
            )),
        }
    }

    if let Some(path) = custom_path {
        if !path.is_file() {
            warnings.push(format!("Config file {} does not exist", path.display()));
        }
    }

    ConfigHandle {
        config: DetectionConfig::default(),
        source: None,
        warnings,
    }
}

fn config_candidates(custom_path: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = custom_path {
        candidates.push(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(cwd.join("config").join(name));
            candidates.push(cwd.join(name));
        }
    }

    if let Some(home_dir) = dirs::home_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(home_dir.join("framecut").join(name));
        }
    }

    candidates
}

static LOG_CONFIG_ONCE: Once = Once::new();

/// Log the config source and any load warnings, once per process.
pub fn log_config_usage(handle: &ConfigHandle) {
    LOG_CONFIG_ONCE.call_once(|| {
        match &handle.source {
            Some(source) => log::info!("Loaded config from {}", source.display()),
            None => log::debug!("Using built-in detection defaults"),
        }
        for warning in &handle.warnings {
            log::warn!("Config warning: {}", warning);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_profile_parsing() {
        assert_eq!("Aggressive".parse::<Profile>(), Ok(Profile::Aggressive));
        assert_eq!("default".parse::<Profile>(), Ok(Profile::Default));
        assert!("loose".parse::<Profile>().is_err());
    }

    #[test]
    fn test_profiles_differ_from_default() {
        let default = DetectionConfig::for_profile(Profile::Default);
        assert_eq!(default, DetectionConfig::default());
        for profile in [Profile::Aggressive, Profile::Conservative] {
            let config = DetectionConfig::for_profile(profile);
            assert_ne!(config, default, "{} should change something", profile);
            assert_eq!(config.clone().sanitize(), config, "{} should be sane", profile);
        }
    }

    #[test]
    fn test_sanitize_fixes_block_sizes_and_ranges() {
        let mut config = DetectionConfig::default();
        config.perforation.block_size = 14;
        config.perforation.min_size = 50.0;
        config.perforation.max_size = 20.0;
        config.frames.adaptive_block_size = 1;
        config.frames.edges = EdgeThresholds::Fixed {
            low: 80.0,
            high: 40.0,
        };
        config.filter.width_tolerance = 1.5;
        config.filter.min_aspect_ratio = 0.5;

        let config = config.sanitize();
        assert_eq!(config.perforation.block_size, 15);
        assert_eq!(config.perforation.max_size, 50.0);
        assert_eq!(config.frames.adaptive_block_size, 3);
        assert_eq!(
            config.frames.edges,
            EdgeThresholds::Fixed {
                low: 80.0,
                high: 80.0
            }
        );
        assert!(config.filter.width_tolerance < 1.0);
        assert_eq!(config.filter.min_aspect_ratio, 1.0);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "filter:\n  width_multiplier: 7.5\nframes:\n  edges:\n    mode: median\n    sigma: 0.4\n";
        let config: DetectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.filter.width_multiplier, 7.5);
        assert_eq!(config.filter.height_multiplier, 9.0);
        assert_eq!(config.frames.edges, EdgeThresholds::Median { sigma: 0.4 });
        assert_eq!(config.perforation, PerforationParams::default());
    }

    #[test]
    fn test_load_config_from_custom_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "perforation:\n  block_size: 20\nextract:\n  format: png").unwrap();

        let handle = load_config(Some(file.path()));
        assert!(handle.source.is_some());
        assert_eq!(handle.config.perforation.block_size, 21);
        assert_eq!(handle.config.extract.format, OutputFormat::Png);
    }

    #[test]
    fn test_load_config_reports_parse_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "perforation: [not, a, map]").unwrap();

        let handle = load_config(Some(file.path()));
        assert!(handle
            .warnings
            .iter()
            .any(|w| w.contains("Failed to parse config")));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JPG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("tiff".parse::<OutputFormat>(), Ok(OutputFormat::Tiff));
        assert_eq!(OutputFormat::Tiff.extension(), "tif");
        assert!("bmp".parse::<OutputFormat>().is_err());
    }
}
