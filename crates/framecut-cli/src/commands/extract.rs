use framecut_cli::{crop_stems, duplicate_stems, expand_inputs, output_dir_or_default};
use framecut_core::{CalibrationSource, DetectionConfig, DirectorySink};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

struct FileOutcome {
    saved: usize,
    frames: usize,
    failures: Vec<String>,
}

/// Detect and crop the frames of several scans in parallel.
///
/// Each file is an independent task: it is calibrated by its own
/// perforations (or the shared precomputed statistics) and its crops are
/// named after its own stem, made distinct with [`crop_stems`]. Failures
/// are collected and reported at the end.
pub fn cmd_extract(
    inputs: Vec<PathBuf>,
    out: Option<PathBuf>,
    recursive: bool,
    threads: Option<usize>,
    config: &DetectionConfig,
    calibration: &CalibrationSource,
) -> Result<(), String> {
    let batch_start = Instant::now();

    let inputs = expand_inputs(&inputs, recursive)?;
    if inputs.is_empty() {
        return Err("No supported image files found".to_string());
    }

    for stem in duplicate_stems(&inputs) {
        log::warn!(
            "Several inputs share the name '{}'; their crops are prefixed with the folder name",
            stem
        );
    }
    let stems = crop_stems(&inputs);

    // Configure thread pool if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("Using {} threads for parallel processing", num_threads);
    }

    let output_dir = output_dir_or_default(out);
    std::fs::create_dir_all(&output_dir)
        .map_err(|e| format!("Failed to create {}: {}", output_dir.display(), e))?;

    println!("\nProcessing {} files in parallel...\n", inputs.len());

    // Progress tracking
    let processed_count = AtomicUsize::new(0);
    let total_files = inputs.len();

    let results: Vec<Result<FileOutcome, String>> = inputs
        .par_iter()
        .zip(&stems)
        .map(|(input, stem)| {
            let file_start = Instant::now();

            let mut decoded = framecut_core::load_image(input).map_err(|e| e.to_string())?;
            decoded.name = stem.clone();
            let mut sink = DirectorySink::new(&output_dir, config.extract.format);
            let processed = framecut_core::process_image(&decoded, config, calibration, &mut sink)
                .map_err(|e| e.to_string())?;

            let outcome = FileOutcome {
                saved: processed.report.saved.len(),
                frames: processed.detection.boxes.len(),
                failures: processed
                    .report
                    .failures
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            };

            let count = processed_count.fetch_add(1, Ordering::SeqCst) + 1;
            println!(
                "[{}/{}] {} -> {} frame(s) ({:.2}s)",
                count,
                total_files,
                input.display(),
                outcome.saved,
                file_start.elapsed().as_secs_f64()
            );

            Ok(outcome)
        })
        .collect();

    // Summarize results
    let mut success_count = 0;
    let mut frame_count = 0;
    let mut errors: Vec<(PathBuf, String)> = Vec::new();

    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(outcome) => {
                frame_count += outcome.saved;
                if outcome.failures.is_empty() {
                    success_count += 1;
                } else {
                    let skipped = outcome.frames - outcome.saved;
                    errors.push((
                        input.clone(),
                        format!("{} frame(s) skipped: {}", skipped, outcome.failures.join("; ")),
                    ));
                }
            }
            Err(e) => errors.push((input.clone(), e)),
        }
    }

    let batch_elapsed = batch_start.elapsed();

    println!("\n========================================");
    println!("EXTRACTION COMPLETE");
    println!("========================================");
    println!("  Successful: {}", success_count);
    println!("  Failed:     {}", errors.len());
    println!("  Frames:     {}", frame_count);
    println!("  Output dir: {}", output_dir.display());
    println!("  Total time: {:.2}s", batch_elapsed.as_secs_f64());

    if !errors.is_empty() {
        println!("\nErrors:");
        for (path, error) in &errors {
            println!("  {}: {}", path.display(), error);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} files failed to process", errors.len()))
    }
}
