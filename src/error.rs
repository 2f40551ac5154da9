//! Error types for corpus extraction.
//!
//! `ExtractionError` values are recovered where they occur: they skip a
//! recording or a token and are counted in the run summary. `TableError`
//! is fatal and aborts the run before any audio is touched.

use std::path::PathBuf;

use thiserror::Error;

/// Recoverable per-recording or per-token failure.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No waveform file exists for the recording.
    #[error("no audio resource for {talk_id} at {path:?}")]
    MissingAudioResource { talk_id: String, path: PathBuf },

    /// The waveform file exists but could not be decoded.
    #[error("failed to decode audio for {talk_id}: {message}")]
    AudioDecode { talk_id: String, message: String },

    /// The token's time bounds fall outside the waveform.
    #[error("segment {start:.3}s-{end:.3}s is outside recording of {duration:.3}s")]
    SegmentOutOfRange { start: f64, end: f64, duration: f64 },

    /// A zero-sample segment reached the analyzer.
    #[error("analysis input contains no samples")]
    EmptyAnalysisInput,

    /// The segment is shorter than one analysis window and the drop policy is active.
    #[error("segment of {samples} samples is shorter than the {window}-sample window")]
    ShortSegmentDropped { samples: usize, window: usize },

    /// The cepstral backend returned an unexpected shape.
    #[error("cepstral analysis failed: {0}")]
    Analysis(String),
}

impl ExtractionError {
    /// True when the failure disqualifies the whole recording.
    pub fn is_recording_level(&self) -> bool {
        matches!(
            self,
            ExtractionError::MissingAudioResource { .. } | ExtractionError::AudioDecode { .. }
        )
    }
}

/// Fatal structural problem with the token table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("token table is not valid text: {0}")]
    Encoding(String),

    #[error("token table is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("duplicate ObsID {obs_id} (rows {first} and {second})")]
    DuplicateObsId {
        obs_id: String,
        first: usize,
        second: usize,
    },
}

pub type TableResult<T> = std::result::Result<T, TableError>;
