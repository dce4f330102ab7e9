use super::PerforationCandidate;
use crate::error::FrameError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative slack on the outlier bound so identical samples are never
/// rejected because their mean picked up rounding error.
const OUTLIER_EPSILON: f64 = 1e-9;

/// Outlier-filtered perforation measurements.
///
/// `valid_count == 0` means no calibration is available; consumers must
/// skip perforation-based filtering rather than treat it as "no frames".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerforationStats {
    pub average_width: f64,
    pub std_width: f64,
    pub average_height: f64,
    pub std_height: f64,
    pub average_aspect_ratio: f64,
    pub std_aspect_ratio: f64,
    pub average_area: f64,
    pub std_area: f64,
    pub valid_count: usize,
}

impl PerforationStats {
    /// The "no calibration" sentinel.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_calibrated(&self) -> bool {
        self.valid_count > 0
    }

    pub fn to_json(&self) -> Result<String, FrameError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FrameError::Config(format!("Failed to serialize perforation stats: {}", e)))
    }

    /// Parse stats produced by another process. `name` identifies the source
    /// in the error.
    pub fn from_json(text: &str, name: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(|e| FrameError::collaborator(name, e))
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, FrameError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| FrameError::collaborator(&name, e))?;
        Self::from_json(&text, &name)
    }
}

type Sample = [f64; 4];

fn sample(candidate: &PerforationCandidate) -> Sample {
    [
        candidate.width as f64,
        candidate.height as f64,
        candidate.aspect_ratio as f64,
        candidate.area as f64,
    ]
}

/// Per-dimension mean and population standard deviation.
fn summarize(samples: &[Sample]) -> (Sample, Sample) {
    let n = samples.len() as f64;
    let mut mean = [0.0; 4];
    for s in samples {
        for (m, v) in mean.iter_mut().zip(s) {
            *m += v;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    let mut std = [0.0; 4];
    for s in samples {
        for i in 0..4 {
            std[i] += (s[i] - mean[i]).powi(2);
        }
    }
    std.iter_mut().for_each(|v| *v = (*v / n).sqrt());
    (mean, std)
}

/// Mean and spread of the candidates after one outlier pass.
///
/// A sample survives when every dimension lies within `std_threshold`
/// standard deviations of the first-pass mean (bound inclusive). Statistics
/// are recomputed on the survivors; no survivors yields the sentinel.
pub fn aggregate_statistics(
    candidates: &[PerforationCandidate],
    std_threshold: f64,
) -> PerforationStats {
    let samples: Vec<Sample> = candidates.iter().map(sample).collect();
    if samples.is_empty() {
        return PerforationStats::unavailable();
    }

    let (mean, std) = summarize(&samples);
    let survivors: Vec<Sample> = samples
        .into_iter()
        .filter(|s| {
            (0..4).all(|i| {
                let slack = OUTLIER_EPSILON * (1.0 + mean[i].abs());
                (s[i] - mean[i]).abs() <= std_threshold * std[i] + slack
            })
        })
        .collect();

    if survivors.is_empty() {
        return PerforationStats::unavailable();
    }
    if survivors.len() < candidates.len() {
        log::debug!(
            "Perforation stats: dropped {} outlier(s) of {}",
            candidates.len() - survivors.len(),
            candidates.len()
        );
    }

    let (mean, std) = summarize(&survivors);
    PerforationStats {
        average_width: mean[0],
        std_width: std[0],
        average_height: mean[1],
        std_height: std[1],
        average_aspect_ratio: mean[2],
        std_aspect_ratio: std[2],
        average_area: mean[3],
        std_area: std[3],
        valid_count: survivors.len(),
    }
}
