//! Detection and extraction pipeline
//!
//! Wires the stages together for one source image:
//! perforation analysis (or precomputed statistics), frame region
//! detection, perforation-guided filtering, deduplication, and finally
//! extraction of whatever boxes the caller settles on.

use crate::config::{DetectionConfig, PerforationParams};
use crate::decoders::DecodedImage;
use crate::error::{DetectionStage, FrameError};
use crate::extract::{extract_frames, CropNaming, CropSink, ExtractionReport};
use crate::frames::{dedup_frames, detect_regions, filter_by_perforations};
use crate::geometry::Rect;
use crate::perforation::{analyze_perforations, PerforationAnalysis, PerforationCandidate, PerforationStats};
use std::fmt;

/// Where the perforation statistics for an image come from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CalibrationSource {
    /// Measure the perforations of the image itself.
    #[default]
    Detect,
    /// Use statistics measured elsewhere, e.g. loaded from JSON.
    Precomputed(PerforationStats),
}

/// Non-fatal conditions worth reporting to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    /// No usable perforations; frame candidates were not size-filtered.
    CalibrationUnavailable { detected: usize },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::CalibrationUnavailable { detected } => write!(
                f,
                "no usable perforations ({} candidate(s) detected); frame size filter bypassed",
                detected
            ),
        }
    }
}

/// Everything the detection stages produced for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDetection {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Validated perforations (empty when statistics were precomputed).
    pub perforations: Vec<PerforationCandidate>,
    pub stats: PerforationStats,
    /// Raw region candidates before filtering.
    pub region_count: usize,
    /// Frame boxes in detection order, ready for review or extraction.
    pub boxes: Vec<Rect>,
    pub warnings: Vec<PipelineWarning>,
}

/// Detection followed by extraction of the detected boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pub detection: FrameDetection,
    pub report: ExtractionReport,
}

/// Measure the perforations of one image.
pub fn measure_perforations(
    decoded: &DecodedImage,
    params: &PerforationParams,
) -> PerforationAnalysis {
    let analysis = analyze_perforations(&decoded.to_gray(), params);
    log::info!(
        "{}: {} perforation(s) accepted of {} detected",
        decoded.name,
        analysis.accepted.len(),
        analysis.detected
    );
    analysis
}

/// Produce the frame boxes for one image.
///
/// Fails with [`FrameError::NoRegionsDetected`] when the detector finds
/// nothing or when no candidate survives the size filter. Missing
/// calibration is a warning, not an error.
pub fn detect_frames(
    decoded: &DecodedImage,
    config: &DetectionConfig,
    calibration: &CalibrationSource,
) -> Result<FrameDetection, FrameError> {
    let gray = decoded.to_gray();
    let mut warnings = Vec::new();

    let (perforations, stats, detected) = match calibration {
        CalibrationSource::Detect => {
            let analysis = analyze_perforations(&gray, &config.perforation);
            (analysis.accepted, analysis.stats, analysis.detected)
        }
        CalibrationSource::Precomputed(stats) => (Vec::new(), *stats, 0),
    };

    if !stats.is_calibrated() {
        let warning = PipelineWarning::CalibrationUnavailable { detected };
        log::warn!("{}: {}", decoded.name, warning);
        warnings.push(warning);
    }

    let regions = detect_regions(&gray, &config.frames);
    let region_count = regions.len();
    if regions.is_empty() {
        return Err(FrameError::NoRegionsDetected {
            name: decoded.name.clone(),
            stage: DetectionStage::RegionDetection,
        });
    }

    let filtered = filter_by_perforations(
        regions,
        &stats,
        &config.filter,
        decoded.width(),
        decoded.height(),
    );
    let boxes: Vec<Rect> = dedup_frames(filtered, config.filter.frame_iou_threshold)
        .iter()
        .filter_map(|region| region.bounds())
        .collect();

    if boxes.is_empty() {
        return Err(FrameError::NoRegionsDetected {
            name: decoded.name.clone(),
            stage: DetectionStage::PerforationFilter,
        });
    }

    log::info!(
        "{}: {} frame(s) from {} region candidate(s)",
        decoded.name,
        boxes.len(),
        region_count
    );

    Ok(FrameDetection {
        name: decoded.name.clone(),
        width: decoded.width(),
        height: decoded.height(),
        perforations,
        stats,
        region_count,
        boxes,
        warnings,
    })
}

/// Crop `boxes` out of the image using the extraction settings of `config`.
pub fn extract_boxes(
    decoded: &DecodedImage,
    boxes: &[Rect],
    config: &DetectionConfig,
    sink: &mut dyn CropSink,
) -> ExtractionReport {
    let naming = CropNaming::from_params(decoded.name.clone(), &config.extract);
    let report = extract_frames(&decoded.image, boxes, &naming, config.extract.margin, sink);
    log::info!(
        "{}: saved {} of {} frame(s)",
        decoded.name,
        report.saved.len(),
        boxes.len()
    );
    report
}

/// Detect and extract without human review.
pub fn process_image(
    decoded: &DecodedImage,
    config: &DetectionConfig,
    calibration: &CalibrationSource,
    sink: &mut dyn CropSink,
) -> Result<ProcessedImage, FrameError> {
    let detection = detect_frames(decoded, config, calibration)?;
    let report = extract_boxes(decoded, &detection.boxes, config, sink);
    Ok(ProcessedImage { detection, report })
}
