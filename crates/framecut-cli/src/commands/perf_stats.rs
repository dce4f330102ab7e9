use framecut_core::DetectionConfig;
use std::path::PathBuf;

/// Measure the perforations of one scan and emit the statistics as JSON.
///
/// The JSON can be fed back to `extract --perf-stats` to calibrate the frame
/// filter for scans whose own perforations are unusable.
pub fn cmd_perf_stats(
    input: PathBuf,
    config: &DetectionConfig,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let decoded = framecut_core::load_image(&input).map_err(|e| e.to_string())?;
    let analysis = framecut_core::measure_perforations(&decoded, &config.perforation);
    let stats = analysis.stats;

    if !stats.is_calibrated() {
        log::warn!(
            "{}: no usable perforations ({} candidates detected)",
            decoded.name,
            analysis.detected
        );
    }

    let json = stats.to_json().map_err(|e| e.to_string())?;

    match out {
        Some(path) => {
            std::fs::write(&path, &json)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!(
                "{}: {} of {} perforations kept, avg {:.2}x{:.2} px",
                decoded.name,
                stats.valid_count,
                analysis.detected,
                stats.average_width,
                stats.average_height
            );
            println!("Statistics saved to: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
