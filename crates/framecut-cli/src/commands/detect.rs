use framecut_cli::expand_inputs;
use framecut_core::{CalibrationSource, DetectionConfig, FrameDetection};
use std::path::PathBuf;

/// Detect frames in each input and print the boxes without writing crops.
pub fn cmd_detect(
    inputs: Vec<PathBuf>,
    recursive: bool,
    config: &DetectionConfig,
    calibration: &CalibrationSource,
    json: bool,
) -> Result<(), String> {
    let inputs = expand_inputs(&inputs, recursive)?;
    if inputs.is_empty() {
        return Err("No supported image files found".to_string());
    }

    let mut reports = Vec::new();
    let mut errors: Vec<(PathBuf, String)> = Vec::new();

    for input in &inputs {
        let result = framecut_core::load_image(input)
            .and_then(|decoded| framecut_core::detect_frames(&decoded, config, calibration));
        match result {
            Ok(detection) => {
                if json {
                    reports.push(detection_json(&detection));
                } else {
                    print_detection(&detection);
                }
            }
            Err(e) => errors.push((input.clone(), e.to_string())),
        }
    }

    if json {
        let text = serde_json::to_string_pretty(&reports)
            .map_err(|e| format!("Failed to serialize detections: {}", e))?;
        println!("{}", text);
    }

    if !errors.is_empty() {
        eprintln!("\nErrors:");
        for (path, error) in &errors {
            eprintln!("  {}: {}", path.display(), error);
        }
        return Err(format!("{} of {} files failed", errors.len(), inputs.len()));
    }
    Ok(())
}

fn detection_json(detection: &FrameDetection) -> serde_json::Value {
    serde_json::json!({
        "name": detection.name,
        "width": detection.width,
        "height": detection.height,
        "perforations": detection.stats,
        "region_candidates": detection.region_count,
        "boxes": detection.boxes,
        "warnings": detection
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>(),
    })
}

fn print_detection(detection: &FrameDetection) {
    println!(
        "\n{} ({}x{})",
        detection.name, detection.width, detection.height
    );
    if detection.stats.is_calibrated() {
        println!(
            "  Perforations: {} (avg {:.1}x{:.1} px)",
            detection.stats.valid_count, detection.stats.average_width, detection.stats.average_height
        );
    } else {
        println!("  Perforations: none usable");
    }
    for warning in &detection.warnings {
        println!("  Warning: {}", warning);
    }
    println!(
        "  Frames: {} (from {} candidates)",
        detection.boxes.len(),
        detection.region_count
    );
    for (i, rect) in detection.boxes.iter().enumerate() {
        println!(
            "    {:02}: x={} y={} w={} h={}",
            i + 1,
            rect.x(),
            rect.y(),
            rect.width(),
            rect.height()
        );
    }
}
