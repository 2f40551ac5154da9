use anyhow::{ensure, Context, Result};
use clap::Parser;
use csj_mfcc::config::{CorpusPaths, ExtractionConfig, OutputEncoding, ShortSegmentPolicy};
use csj_mfcc::corpus::{run_corpus, RunSummary};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Extract per-frame MFCCs for every phoneme token of a speech corpus
///
/// Reads a delimited token table, resolves `<TalkID>.wav` for each recording,
/// and writes one output row per analysis frame of each token.
#[derive(Parser, Debug)]
#[command(name = "csj-mfcc")]
#[command(version = "0.1.0")]
#[command(about = "Token-level MFCC extraction for annotated speech corpora", long_about = None)]
struct Args {
    /// Token table with TalkID, PhonemeID, PhonemeStart, PhonemeEnd, PrevPhoneme, FollowingMora
    #[arg(value_name = "INPUT_TABLE")]
    input_table: PathBuf,

    /// Directory containing one <TalkID>.wav per recording
    #[arg(value_name = "RECORDINGS_DIR")]
    recordings_dir: PathBuf,

    /// Where to write the frame table
    #[arg(value_name = "OUTPUT_TABLE")]
    output_table: PathBuf,

    /// JSON file with extraction settings (flags below take precedence)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Field delimiter of the input table [default: |]
    #[arg(long)]
    delimiter: Option<char>,

    /// Field delimiter of the output tables [default: ,]
    #[arg(long)]
    output_delimiter: Option<char>,

    /// Number of cepstral coefficients per frame [default: 12]
    #[arg(long, short = 'k')]
    coefficients: Option<usize>,

    /// Output text encoding [default: utf8]
    #[arg(long, value_enum)]
    encoding: Option<OutputEncoding>,

    /// Handling of tokens shorter than one analysis window [default: pad]
    #[arg(long, value_enum)]
    short_segments: Option<ShortSegmentPolicy>,

    /// Worker threads (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Also write the token table with voicing categories to this path
    #[arg(long, value_name = "PATH")]
    voicing_out: Option<PathBuf>,

    /// Write the run summary as JSON to this path
    #[arg(long, value_name = "PATH")]
    summary_json: Option<PathBuf>,
}

impl Args {
    /// Validate CLI arguments
    fn validate(&self) -> Result<()> {
        ensure!(
            self.input_table.is_file(),
            "Input table does not exist or is not a file: {:?}",
            self.input_table
        );
        ensure!(
            !self.output_table.is_dir(),
            "Output path must be a file, not a directory: {:?}",
            self.output_table
        );
        Ok(())
    }

    fn extraction_config(&self) -> Result<ExtractionConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::load(path)?,
            None => ExtractionConfig::default(),
        };
        if let Some(delimiter) = self.delimiter {
            config.input_delimiter = delimiter;
        }
        if let Some(delimiter) = self.output_delimiter {
            config.output_delimiter = delimiter;
        }
        if let Some(coefficients) = self.coefficients {
            config.coefficients = coefficients;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(policy) = self.short_segments {
            config.short_segments = policy;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    args.validate()
        .context("Failed to validate command-line arguments")?;

    let config = args
        .extraction_config()
        .context("Failed to load extraction settings")?;
    let paths = CorpusPaths::new(
        args.input_table.clone(),
        &args.recordings_dir,
        args.output_table.clone(),
    );

    let summary = run_corpus(&paths, &config, args.voicing_out.as_deref())?;

    if let Some(path) = &args.summary_json {
        write_summary(&summary, path)?;
    }
    println!(
        "Wrote {} frames for {} tokens to {:?} (skipped {} tokens, {} recordings)",
        summary.frames_emitted,
        summary.tokens_emitted,
        paths.output_table,
        summary.tokens_skipped(),
        summary.recordings_missing + summary.recordings_undecodable
    );
    Ok(())
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    fs::write(path, json).with_context(|| format!("Failed to write run summary {:?}", path))
}
