//! Corpus orchestration: one pass per recording, one extraction per token.

pub mod table;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::audio::decoder::decode_audio;
use crate::audio::slicer::extract_segment;
use crate::config::{recording_path, CorpusPaths, ExtractionConfig};
use crate::error::{ExtractionError, TableResult};
use crate::features::{build_frame_rows, CepstralAnalyzer};
use crate::types::{AudioData, CepstralFrame, PhonemeToken, TokenFrames};
use crate::voicing::annotate_voicing;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub recordings_total: usize,
    pub recordings_processed: usize,
    pub recordings_missing: usize,
    pub recordings_undecodable: usize,
    pub tokens_total: usize,
    pub tokens_emitted: usize,
    pub tokens_in_skipped_recordings: usize,
    pub tokens_out_of_range: usize,
    pub tokens_empty: usize,
    pub tokens_short_dropped: usize,
    pub tokens_failed_analysis: usize,
    pub frames_emitted: usize,
}

impl RunSummary {
    pub fn tokens_skipped(&self) -> usize {
        self.tokens_in_skipped_recordings
            + self.tokens_out_of_range
            + self.tokens_empty
            + self.tokens_short_dropped
            + self.tokens_failed_analysis
    }

    pub fn log(&self) {
        info!(
            recordings_processed = self.recordings_processed,
            recordings_missing = self.recordings_missing,
            recordings_undecodable = self.recordings_undecodable,
            tokens_emitted = self.tokens_emitted,
            tokens_skipped = self.tokens_skipped(),
            frames_emitted = self.frames_emitted,
            "extraction finished: {} of {} recordings, {} of {} tokens, {} frames",
            self.recordings_processed,
            self.recordings_total,
            self.tokens_emitted,
            self.tokens_total,
            self.frames_emitted
        );
    }

    fn record_token_failure(&mut self, err: &ExtractionError) {
        match err {
            ExtractionError::SegmentOutOfRange { .. } => self.tokens_out_of_range += 1,
            ExtractionError::EmptyAnalysisInput => self.tokens_empty += 1,
            ExtractionError::ShortSegmentDropped { .. } => self.tokens_short_dropped += 1,
            _ => self.tokens_failed_analysis += 1,
        }
    }

    fn record_recording_failure(&mut self, err: &ExtractionError, token_count: usize) {
        match err {
            ExtractionError::MissingAudioResource { .. } => self.recordings_missing += 1,
            _ => self.recordings_undecodable += 1,
        }
        self.tokens_in_skipped_recordings += token_count;
    }
}

/// Frame rows of a whole corpus, in deterministic order, with the run's counts.
#[derive(Debug, Clone)]
pub struct CorpusExtraction {
    pub frames: Vec<CepstralFrame>,
    pub summary: RunSummary,
}

/// Read the token table and classify voicing context for every token.
pub fn load_tokens(path: &Path, delimiter: u8) -> TableResult<Vec<PhonemeToken>> {
    let mut tokens = table::read_token_table(path, delimiter)?;
    annotate_voicing(&mut tokens);
    Ok(tokens)
}

/// Resolve a recording's waveform; both failure modes skip the recording.
pub fn resolve_recording(talk_id: &str, path: &Path) -> Result<AudioData, ExtractionError> {
    if !path.is_file() {
        return Err(ExtractionError::MissingAudioResource {
            talk_id: talk_id.to_string(),
            path: path.to_path_buf(),
        });
    }
    decode_audio(path).map_err(|err| ExtractionError::AudioDecode {
        talk_id: talk_id.to_string(),
        message: format!("{:#}", err),
    })
}

/// Segment, analyze and expand one token.
pub fn extract_token(
    token: &PhonemeToken,
    audio: &AudioData,
    analyzer: &CepstralAnalyzer,
) -> Result<TokenFrames, ExtractionError> {
    let segment = extract_segment(audio, token.start, token.end)?;
    let analysis = analyzer.analyze(segment.samples, segment.sample_rate)?;
    Ok(TokenFrames {
        talk_id: token.talk_id.clone(),
        phoneme_id: token.phoneme_id.clone(),
        frames: build_frame_rows(&token.obs_id, &analysis),
    })
}

struct RecordingOutcome {
    token_count: usize,
    result: Result<Vec<Result<TokenFrames, ExtractionError>>, ExtractionError>,
}

/// Extract frames for every token whose recording resolves.
///
/// Recordings and the tokens inside them run on the current rayon pool.
/// Failures are logged and counted; none of them abort the run.
pub fn extract_corpus(
    tokens: &[PhonemeToken],
    recordings_dir: &Path,
    analyzer: &CepstralAnalyzer,
) -> CorpusExtraction {
    let recordings = group_by_recording(tokens);
    let total = recordings.len();
    info!("measuring {} tokens across {} recordings", tokens.len(), total);

    let started = AtomicUsize::new(0);
    let outcomes: Vec<RecordingOutcome> = recordings
        .into_par_iter()
        .map(|(talk_id, members)| {
            let position = started.fetch_add(1, AtomicOrdering::Relaxed) + 1;
            process_recording(talk_id, &members, recordings_dir, analyzer, position, total)
        })
        .collect();

    merge_outcomes(outcomes, tokens.len(), total)
}

fn group_by_recording(tokens: &[PhonemeToken]) -> Vec<(&str, Vec<&PhonemeToken>)> {
    let mut groups: BTreeMap<&str, Vec<&PhonemeToken>> = BTreeMap::new();
    for token in tokens {
        groups.entry(token.talk_id.as_str()).or_default().push(token);
    }
    groups.into_iter().collect()
}

fn process_recording(
    talk_id: &str,
    tokens: &[&PhonemeToken],
    recordings_dir: &Path,
    analyzer: &CepstralAnalyzer,
    position: usize,
    total: usize,
) -> RecordingOutcome {
    let path = recording_path(recordings_dir, talk_id);
    let audio = match resolve_recording(talk_id, &path) {
        Ok(audio) => audio,
        Err(err) => {
            warn!(talk_id = %talk_id, error = %err, "skipping recording");
            return RecordingOutcome {
                token_count: tokens.len(),
                result: Err(err),
            };
        }
    };
    info!(
        talk_id = %talk_id,
        tokens = tokens.len(),
        "processing recording {} ({}/{})",
        talk_id,
        position,
        total
    );

    let results: Vec<_> = tokens
        .par_iter()
        .map(|token| {
            extract_token(token, &audio, analyzer).inspect_err(|err| {
                warn!(obs_id = %token.obs_id, error = %err, "skipping token");
            })
        })
        .collect();

    RecordingOutcome {
        token_count: tokens.len(),
        result: Ok(results),
    }
}

fn merge_outcomes(
    outcomes: Vec<RecordingOutcome>,
    tokens_total: usize,
    recordings_total: usize,
) -> CorpusExtraction {
    let mut summary = RunSummary {
        recordings_total,
        tokens_total,
        ..RunSummary::default()
    };
    let mut emitted = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(results) => {
                summary.recordings_processed += 1;
                for result in results {
                    match result {
                        Ok(token_frames) => {
                            summary.tokens_emitted += 1;
                            summary.frames_emitted += token_frames.frames.len();
                            emitted.push(token_frames);
                        }
                        Err(err) => summary.record_token_failure(&err),
                    }
                }
            }
            Err(err) => summary.record_recording_failure(&err, outcome.token_count),
        }
    }

    emitted.sort_by(|a, b| {
        a.talk_id
            .cmp(&b.talk_id)
            .then_with(|| compare_ids(&a.phoneme_id, &b.phoneme_id))
    });
    let frames = emitted
        .into_iter()
        .flat_map(|token_frames| token_frames.frames)
        .collect();

    CorpusExtraction { frames, summary }
}

/// Numeric identifiers compare by value, anything else lexically.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Full pipeline: load, classify, extract, write. Only table and output errors are fatal.
pub fn run_corpus(
    paths: &CorpusPaths,
    config: &ExtractionConfig,
    voicing_out: Option<&Path>,
) -> Result<RunSummary> {
    config.validate()?;
    let tokens = load_tokens(&paths.token_table, config.input_delimiter_byte())
        .with_context(|| format!("Failed to load token table {:?}", paths.token_table))?;

    if let Some(path) = voicing_out {
        table::write_voicing_table(
            path,
            &tokens,
            config.output_delimiter_byte(),
            config.encoding,
        )?;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()
        .context("Failed to build worker pool")?;
    let analyzer = CepstralAnalyzer::from_config(config);
    let extraction = pool.install(|| extract_corpus(&tokens, &paths.recordings_dir, &analyzer));

    table::write_frame_table(
        &paths.output_table,
        &extraction.frames,
        analyzer.coefficients(),
        config.output_delimiter_byte(),
        config.encoding,
    )?;
    extraction.summary.log();
    Ok(extraction.summary)
}
