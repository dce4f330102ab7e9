//! Detection settings assembled from config files, profiles and flags.

use framecut_core::config::{load_config, log_config_usage};
use framecut_core::profiles::{get_profiles_dir, resolve_profile_with};
use framecut_core::{CalibrationSource, DetectionConfig, OutputFormat, PerforationStats};
use std::path::{Path, PathBuf};

/// Extraction flags that override the loaded configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOverrides {
    pub format: Option<OutputFormat>,
    pub prefix: Option<String>,
    pub margin: Option<u32>,
}

/// Load the detection configuration.
///
/// A named profile replaces the config file entirely; otherwise the usual
/// config search applies (explicit path, `FRAMECUT_CONFIG`, working
/// directory, home directory) and falls back to built-in defaults.
pub fn resolve_config(
    config_path: Option<&Path>,
    profile: Option<&str>,
) -> Result<DetectionConfig, String> {
    let handle = load_config(config_path);
    log_config_usage(&handle);

    match profile {
        None => Ok(handle.config),
        Some(name) => {
            let config = resolve_profile_with(name, || {
                Ok(get_profiles_dir().unwrap_or_else(|_| PathBuf::from("profiles")))
            })
            .map_err(|e| e.to_string())?;
            log::info!("Using detection profile '{}'", name);
            Ok(config)
        }
    }
}

/// Apply command-line overrides on top of a configuration.
pub fn apply_overrides(mut config: DetectionConfig, overrides: ExtractOverrides) -> DetectionConfig {
    if let Some(format) = overrides.format {
        config.extract.format = format;
    }
    if let Some(prefix) = overrides.prefix {
        config.extract.prefix = Some(prefix);
    }
    if let Some(margin) = overrides.margin {
        config.extract.margin = margin;
    }
    config.sanitize()
}

/// Perforation calibration: loaded from a stats file when given, otherwise
/// measured per image.
pub fn load_calibration(perf_stats: Option<&Path>) -> Result<CalibrationSource, String> {
    match perf_stats {
        None => Ok(CalibrationSource::Detect),
        Some(path) => {
            let stats = PerforationStats::load_json(path).map_err(|e| e.to_string())?;
            if !stats.is_calibrated() {
                log::warn!(
                    "{} holds no perforation measurements; frame size filter will be bypassed",
                    path.display()
                );
            }
            Ok(CalibrationSource::Precomputed(stats))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::Profile;

    #[test]
    fn test_builtin_profile_overrides_config() {
        let config = resolve_config(None, Some("aggressive")).unwrap();
        assert_eq!(config, DetectionConfig::for_profile(Profile::Aggressive));
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let err = resolve_config(None, Some("no-such-profile-xyz")).unwrap_err();
        assert!(err.contains("no-such-profile-xyz"));
    }

    #[test]
    fn test_apply_overrides() {
        let config = apply_overrides(
            DetectionConfig::default(),
            ExtractOverrides {
                format: Some(OutputFormat::Png),
                prefix: Some("roll7".to_string()),
                margin: Some(12),
            },
        );
        assert_eq!(config.extract.format, OutputFormat::Png);
        assert_eq!(config.extract.prefix.as_deref(), Some("roll7"));
        assert_eq!(config.extract.margin, 12);

        let untouched = apply_overrides(DetectionConfig::default(), ExtractOverrides::default());
        assert_eq!(untouched, DetectionConfig::default());
    }

    #[test]
    fn test_load_calibration() {
        assert_eq!(load_calibration(None), Ok(CalibrationSource::Detect));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let stats = PerforationStats {
            average_width: 19.0,
            average_height: 27.0,
            average_aspect_ratio: 19.0 / 27.0,
            average_area: 513.0,
            valid_count: 4,
            ..PerforationStats::default()
        };
        std::fs::write(&path, stats.to_json().unwrap()).unwrap();
        assert_eq!(
            load_calibration(Some(&path)),
            Ok(CalibrationSource::Precomputed(stats))
        );

        std::fs::write(&path, "perforations: many").unwrap();
        assert!(load_calibration(Some(&path)).is_err());
    }
}
