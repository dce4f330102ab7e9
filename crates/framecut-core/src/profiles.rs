//! Named detection profiles
//!
//! Built-in profiles come from [`Profile`]; user profiles are
//! [`DetectionConfig`] dumps stored as YAML under `~/framecut/profiles/`.

use crate::config::{DetectionConfig, Profile};
use crate::error::FrameError;
use std::path::{Path, PathBuf};

/// Check that `name` can name a user profile file.
///
/// Names are file stems made of ASCII letters, digits, `-` and `_`, and may
/// not shadow a built-in profile (built-ins resolve first, so such a file
/// could never be loaded).
pub fn validate_profile_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Profile name cannot be empty".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(format!(
            "Profile name '{}' contains '{}'; use letters, digits, '-' or '_'",
            name.escape_default(),
            c.escape_default()
        ));
    }
    if name.parse::<Profile>().is_ok() {
        return Err(format!("'{}' is a built-in profile name", name));
    }
    Ok(())
}

/// Load a profile from a YAML file. Missing fields take their defaults.
pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<DetectionConfig, FrameError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| FrameError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: DetectionConfig = serde_yaml::from_str(&contents).map_err(|e| {
        FrameError::Config(format!(
            "Failed to parse profile {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(config.sanitize())
}

/// Save a profile to a YAML file.
pub fn save_profile<P: AsRef<Path>>(config: &DetectionConfig, path: P) -> Result<(), FrameError> {
    let path = path.as_ref();
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| FrameError::Config(format!("Failed to serialize profile: {}", e)))?;

    std::fs::write(path, yaml).map_err(|source| FrameError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// List the user profiles stored in a directory, sorted by name.
pub fn list_profiles<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, FrameError> {
    let dir = dir.as_ref();
    let io_err = |source| FrameError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        );
        if is_yaml {
            if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

/// Directory holding user profiles, created on first use.
pub fn get_profiles_dir() -> Result<PathBuf, FrameError> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| FrameError::Config("Could not determine home directory".to_string()))?;

    let profiles_dir = home_dir.join("framecut").join("profiles");
    if !profiles_dir.exists() {
        std::fs::create_dir_all(&profiles_dir).map_err(|source| FrameError::Io {
            path: profiles_dir.clone(),
            source,
        })?;
    }

    Ok(profiles_dir)
}

/// Path of the YAML file backing a user profile in `dir`.
pub fn profile_path(dir: &Path, name: &str) -> Result<PathBuf, FrameError> {
    validate_profile_name(name).map_err(FrameError::Config)?;
    Ok(dir.join(format!("{}.yml", name)))
}

/// Resolve a profile name: built-ins first, then user profiles in `dir`.
pub fn resolve_profile(name: &str, dir: &Path) -> Result<DetectionConfig, FrameError> {
    resolve_profile_with(name, || Ok(dir.to_path_buf()))
}

/// Like [`resolve_profile`], but the user profile directory is only looked
/// up when `name` is not a built-in.
pub fn resolve_profile_with<F>(name: &str, profiles_dir: F) -> Result<DetectionConfig, FrameError>
where
    F: FnOnce() -> Result<PathBuf, FrameError>,
{
    if let Ok(profile) = name.parse::<Profile>() {
        return Ok(DetectionConfig::for_profile(profile));
    }

    let dir = profiles_dir()?;
    let path = profile_path(&dir, name)?;
    if !path.is_file() {
        return Err(FrameError::Config(format!(
            "Profile '{}' is neither built in nor present in {}",
            name,
            dir.display()
        )));
    }
    load_profile(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_profile_name() {
        assert!(validate_profile_name("scanner-a").is_ok());
        assert!(validate_profile_name("roll_07").is_ok());
        assert!(validate_profile_name("").is_err());
        assert!(validate_profile_name("../etc").is_err());
        assert!(validate_profile_name("a/b").is_err());
        assert!(validate_profile_name(".hidden").is_err());
        assert!(validate_profile_name("two words").is_err());
        assert!(validate_profile_name("nul\0").is_err());
    }

    #[test]
    fn test_builtin_names_are_not_user_profiles() {
        let err = validate_profile_name("Aggressive").unwrap_err();
        assert!(err.contains("built-in"));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            profile_path(dir.path(), "default"),
            Err(FrameError::Config(_))
        ));
    }

    #[test]
    fn test_builtin_resolves_without_profile_dir() {
        let resolved = resolve_profile_with("conservative", || {
            panic!("profile directory looked up for a built-in")
        })
        .unwrap();
        assert_eq!(resolved, DetectionConfig::for_profile(Profile::Conservative));

        let err = resolve_profile_with("nikon", || {
            Err(FrameError::Config("no home".to_string()))
        })
        .unwrap_err();
        assert!(err.to_string().contains("no home"));
    }

    #[test]
    fn test_save_list_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DetectionConfig::for_profile(Profile::Conservative);
        config.filter.width_multiplier = 8.0;

        save_profile(&config, profile_path(dir.path(), "nikon").unwrap()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(list_profiles(dir.path()).unwrap(), vec!["nikon".to_string()]);

        let loaded = resolve_profile("nikon", dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_resolve_builtin_before_user_profile() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_profile("aggressive", dir.path()).unwrap();
        assert_eq!(resolved, DetectionConfig::for_profile(Profile::Aggressive));
    }

    #[test]
    fn test_resolve_unknown_profile() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_profile("missing", dir.path()).unwrap_err();
        assert!(matches!(err, FrameError::Config(_)));
    }

    #[test]
    fn test_load_profile_rejects_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        std::fs::write(&path, "filter: 12").unwrap();
        assert!(matches!(load_profile(&path), Err(FrameError::Config(_))));
    }
}
