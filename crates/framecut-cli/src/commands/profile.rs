use framecut_core::profiles::{
    get_profiles_dir, list_profiles, profile_path, resolve_profile_with, save_profile,
};
use framecut_core::{DetectionConfig, Profile};
use std::path::PathBuf;

fn profiles_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| get_profiles_dir().unwrap_or_else(|_| PathBuf::from("profiles")))
}

/// List built-in profiles and the user profiles in the profile directory.
pub fn cmd_profile_list(dir: Option<PathBuf>) -> Result<(), String> {
    println!("Built-in profiles:");
    for profile in Profile::ALL {
        println!("  {}", profile);
    }

    let dir = profiles_dir(dir);
    println!("\nUser profiles in: {}", dir.display());
    if !dir.is_dir() {
        println!("  (none)");
        return Ok(());
    }
    let names = list_profiles(&dir).map_err(|e| format!("Failed to list profiles: {}", e))?;
    if names.is_empty() {
        println!("  (none)");
    }
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}

/// Print a profile as YAML.
pub fn cmd_profile_show(name: String, dir: Option<PathBuf>) -> Result<(), String> {
    let config =
        resolve_profile_with(&name, || Ok(profiles_dir(dir))).map_err(|e| e.to_string())?;
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| format!("Failed to serialize profile: {}", e))?;
    println!("# profile: {}", name);
    print!("{}", yaml);
    Ok(())
}

/// Save the active configuration as a user profile.
pub fn cmd_profile_save(
    name: String,
    config: &DetectionConfig,
    dir: Option<PathBuf>,
    force: bool,
) -> Result<(), String> {
    let dir = profiles_dir(dir);
    let path = profile_path(&dir, &name).map_err(|e| e.to_string())?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    if path.exists() && !force {
        return Err(format!(
            "Profile {} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    save_profile(config, &path).map_err(|e| e.to_string())?;
    println!("Profile saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_show_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DetectionConfig::default();
        config.extract.margin = 8;

        cmd_profile_save("roll".to_string(), &config, Some(dir.path().to_path_buf()), false)
            .unwrap();
        assert!(dir.path().join("roll.yml").is_file());
        assert_eq!(
            framecut_core::profiles::resolve_profile("roll", dir.path()).unwrap(),
            config
        );

        cmd_profile_show("roll".to_string(), Some(dir.path().to_path_buf())).unwrap();
        cmd_profile_list(Some(dir.path().to_path_buf())).unwrap();
    }

    #[test]
    fn test_save_refuses_overwrite_and_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectionConfig::default();
        let target = Some(dir.path().to_path_buf());

        cmd_profile_save("roll".to_string(), &config, target.clone(), false).unwrap();
        assert!(cmd_profile_save("roll".to_string(), &config, target.clone(), false).is_err());
        assert!(cmd_profile_save("roll".to_string(), &config, target.clone(), true).is_ok());
        assert!(cmd_profile_save("Default".to_string(), &config, target.clone(), true).is_err());
        assert!(cmd_profile_save("../escape".to_string(), &config, target, true).is_err());
    }
}
