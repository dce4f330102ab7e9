//! Input file handling and path utilities.

use framecut_core::decoders::is_supported_path;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Directory crops are written to when `--out` is not given.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Expand a list of inputs (files and directories) into a list of image files.
///
/// Directories are scanned for supported image files (.jpg, .jpeg, .png,
/// .tif, .tiff). If `recursive` is true, subdirectories are also scanned.
/// Explicitly named files are passed through as-is.
pub fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            collect_images_from_dir(input, recursive, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(format!("Path not found: {}", input.display()));
        }
    }

    // Sort for consistent ordering
    files.sort();
    files.dedup();
    Ok(files)
}

fn collect_images_from_dir(
    dir: &Path,
    recursive: bool,
    files: &mut Vec<PathBuf>,
) -> Result<(), String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory {}: {}", dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Error reading directory entry: {}", e))?;
        let path = entry.path();

        if path.is_dir() && recursive {
            collect_images_from_dir(&path, recursive, files)?;
        } else if path.is_file() && is_supported_path(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// File stems shared by more than one input.
///
/// Crops are named after the input stem, so two inputs with the same stem
/// write to the same crop names in one output directory.
pub fn duplicate_stems(files: &[PathBuf]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for file in files {
        if let Some(stem) = file.file_stem() {
            *counts.entry(stem.to_string_lossy().into_owned()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(stem, _)| stem)
        .collect()
}

/// One distinct crop stem per input, in input order.
///
/// Inputs whose stem is unique keep it. Inputs sharing a stem are prefixed
/// with their parent directory name (`roll1/scan.jpg` becomes `roll1_scan`),
/// and a running number is appended while the name is still taken.
pub fn crop_stems(files: &[PathBuf]) -> Vec<String> {
    let shared: BTreeSet<String> = duplicate_stems(files).into_iter().collect();
    let mut taken: BTreeSet<String> = files
        .iter()
        .map(|file| file_stem(file))
        .filter(|stem| !shared.contains(stem))
        .collect();

    files
        .iter()
        .map(|file| {
            let stem = file_stem(file);
            if !shared.contains(&stem) {
                return stem;
            }
            let base = match file.parent().and_then(|p| p.file_name()) {
                Some(parent) => format!("{}_{}", parent.to_string_lossy(), stem),
                None => stem,
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while taken.contains(&candidate) {
                n += 1;
                candidate = format!("{}_{}", base, n);
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn file_stem(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The requested output directory, or [`DEFAULT_OUTPUT_DIR`].
pub fn output_dir_or_default(out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_expand_inputs_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.JPG"));
        touch(&dir.path().join("a.tif"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("roll2")).unwrap();
        touch(&dir.path().join("roll2").join("c.png"));

        let flat = expand_inputs(&[dir.path().to_path_buf()], false).unwrap();
        assert_eq!(
            flat,
            vec![dir.path().join("a.tif"), dir.path().join("b.JPG")]
        );

        let deep = expand_inputs(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&dir.path().join("roll2").join("c.png")));
    }

    #[test]
    fn test_expand_inputs_keeps_explicit_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scan.png");
        touch(&file);

        let files = expand_inputs(&[file.clone(), dir.path().to_path_buf()], false).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_expand_inputs_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = expand_inputs(&[dir.path().join("missing.jpg")], false).unwrap_err();
        assert!(err.contains("Path not found"));
    }

    #[test]
    fn test_duplicate_stems() {
        let files = vec![
            PathBuf::from("roll1/scan.jpg"),
            PathBuf::from("roll2/scan.tif"),
            PathBuf::from("roll2/other.tif"),
        ];
        assert_eq!(duplicate_stems(&files), vec!["scan".to_string()]);
        assert!(duplicate_stems(&files[1..]).is_empty());
    }

    #[test]
    fn test_crop_stems_separate_same_named_scans() {
        let files = vec![
            PathBuf::from("a/scan.jpg"),
            PathBuf::from("b/scan.jpg"),
            PathBuf::from("b/other.png"),
        ];
        assert_eq!(crop_stems(&files), vec!["a_scan", "b_scan", "other"]);
    }

    #[test]
    fn test_crop_stems_number_what_the_folder_cannot_separate() {
        let files = vec![
            PathBuf::from("a/scan.jpg"),
            PathBuf::from("a/scan.png"),
            PathBuf::from("x/a/scan.tif"),
            PathBuf::from("a_scan.jpg"),
        ];
        let stems = crop_stems(&files);
        assert_eq!(stems, vec!["a_scan_2", "a_scan_3", "a_scan_4", "a_scan"]);
    }

    #[test]
    fn test_output_dir_default() {
        assert_eq!(output_dir_or_default(None), PathBuf::from("output"));
        assert_eq!(
            output_dir_or_default(Some(PathBuf::from("crops"))),
            PathBuf::from("crops")
        );
    }
}
