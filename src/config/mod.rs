use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::warn;

use crate::features::MEL_BANDS;

pub const DEFAULT_COEFFICIENTS: usize = 12;

/// What to do with a segment shorter than one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShortSegmentPolicy {
    /// Zero-pad to one window so the token still yields a frame
    #[default]
    Pad,
    /// Skip the token and log it
    Drop,
}

/// Text encoding of the output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    #[default]
    Utf8,
    /// UTF-16LE with byte order mark
    Utf16,
}

/// Tunable settings of an extraction run, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    #[serde(alias = "inputDelimiter", alias = "delimiter")]
    pub input_delimiter: char,
    #[serde(alias = "outputDelimiter")]
    pub output_delimiter: char,
    #[serde(alias = "numberOfCoefficients", alias = "nCoefficients")]
    pub coefficients: usize,
    #[serde(alias = "shortSegments")]
    pub short_segments: ShortSegmentPolicy,
    pub encoding: OutputEncoding,
    pub threads: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input_delimiter: '|',
            output_delimiter: ',',
            coefficients: DEFAULT_COEFFICIENTS,
            short_segments: ShortSegmentPolicy::default(),
            encoding: OutputEncoding::default(),
            threads: None,
        }
    }
}

impl ExtractionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json(&data).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse config JSON")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MEL_BANDS).contains(&self.coefficients),
            "coefficient count must be between 1 and {}, got {}",
            MEL_BANDS,
            self.coefficients
        );
        for (label, delimiter) in [
            ("input", self.input_delimiter),
            ("output", self.output_delimiter),
        ] {
            ensure!(
                delimiter.is_ascii() && delimiter != '"' && delimiter != '\n',
                "{} delimiter must be a single ASCII character other than quote or newline, got {:?}",
                label,
                delimiter
            );
        }
        if let Some(threads) = self.threads {
            ensure!(threads > 0, "thread count must be positive");
        }
        Ok(())
    }

    pub fn input_delimiter_byte(&self) -> u8 {
        self.input_delimiter as u8
    }

    pub fn output_delimiter_byte(&self) -> u8 {
        self.output_delimiter as u8
    }
}

/// Filesystem locations of one run.
#[derive(Debug, Clone)]
pub struct CorpusPaths {
    pub token_table: PathBuf,
    pub recordings_dir: PathBuf,
    pub output_table: PathBuf,
}

impl CorpusPaths {
    /// An unusable recordings directory is not fatal: every recording then
    /// resolves as missing and is skipped.
    pub fn new(token_table: PathBuf, recordings_dir: &Path, output_table: PathBuf) -> Self {
        let recordings_dir = canonicalize_dir(recordings_dir).unwrap_or_else(|err| {
            warn!(error = %format!("{:#}", err), "recordings directory is unusable");
            recordings_dir.to_path_buf()
        });
        Self {
            token_table,
            recordings_dir,
            output_table,
        }
    }
}

/// Waveform file of a recording: `<TalkID>.wav` inside the recordings directory.
pub fn recording_path(recordings_dir: &Path, talk_id: &str) -> PathBuf {
    recordings_dir.join(format!("{}.wav", talk_id))
}

fn canonicalize_dir(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve recordings directory at {:?}", path))?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(anyhow!("recordings path {:?} is not a directory", canonical))
    }
}
