//! Cepstral analysis of token segments and expansion into frame rows.

mod frames;
mod mfcc;

pub use frames::build_frame_rows;
pub use mfcc::MEL_BANDS;

use ndarray::Array2;
use tracing::debug;

use crate::audio::resample;
use crate::config::{ExtractionConfig, ShortSegmentPolicy};
use crate::error::ExtractionError;

/// MFCC matrix of one segment plus the segment's duration.
#[derive(Debug, Clone, PartialEq)]
pub struct CepstralAnalysis {
    /// Shape `(coefficient_count, frame_count)`
    pub coefficients: Array2<f64>,
    /// Seconds, measured on the source segment
    pub duration: f64,
}

impl CepstralAnalysis {
    pub fn coefficient_count(&self) -> usize {
        self.coefficients.nrows()
    }

    pub fn frame_count(&self) -> usize {
        self.coefficients.ncols()
    }
}

/// Computes MFCCs with fixed windowing and a configurable coefficient count.
#[derive(Debug, Clone)]
pub struct CepstralAnalyzer {
    coefficients: usize,
    short_segments: ShortSegmentPolicy,
}

impl CepstralAnalyzer {
    pub fn new(coefficients: usize, short_segments: ShortSegmentPolicy) -> Self {
        Self {
            coefficients,
            short_segments,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.coefficients, config.short_segments)
    }

    pub fn coefficients(&self) -> usize {
        self.coefficients
    }

    pub fn analyze(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<CepstralAnalysis, ExtractionError> {
        if samples.is_empty() {
            return Err(ExtractionError::EmptyAnalysisInput);
        }
        if sample_rate == 0 {
            return Err(ExtractionError::Analysis("sample rate is zero".into()));
        }
        let duration = samples.len() as f64 / sample_rate as f64;

        let resampled = resample::linear_resample(samples, sample_rate, mfcc::TARGET_SAMPLE_RATE)
            .map_err(|err| ExtractionError::Analysis(err.to_string()))?;
        let mut audio: Vec<f64> = resampled.iter().map(|&s| s as f64).collect();

        let window = mfcc::window_samples();
        if audio.len() < window {
            match self.short_segments {
                ShortSegmentPolicy::Drop => {
                    return Err(ExtractionError::ShortSegmentDropped {
                        samples: audio.len(),
                        window,
                    });
                }
                ShortSegmentPolicy::Pad => {
                    debug!(samples = audio.len(), window, "zero-padding short segment");
                    audio.resize(window, 0.0);
                }
            }
        }

        let frames = mfcc::mfcc_frames(audio, self.coefficients);
        let coefficients = coefficient_matrix(&frames, self.coefficients)?;

        Ok(CepstralAnalysis {
            coefficients,
            duration,
        })
    }
}

/// Transpose frame-major output into a `K × T` matrix, keeping the first `K` values per frame.
fn coefficient_matrix(frames: &[Vec<f64>], k: usize) -> Result<Array2<f64>, ExtractionError> {
    if frames.is_empty() {
        return Err(ExtractionError::Analysis("windowing produced no frames".into()));
    }
    if let Some(short) = frames.iter().find(|frame| frame.len() < k) {
        return Err(ExtractionError::Analysis(format!(
            "expected {} coefficients per frame, got {}",
            k,
            short.len()
        )));
    }
    Ok(Array2::from_shape_fn((k, frames.len()), |(c, t)| frames[t][c]))
}
