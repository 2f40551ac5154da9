//! Core types for the token-level MFCC extraction pipeline

use std::fmt;
use std::sync::Arc;

/// Raw audio data representation (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 16000)
    pub sample_rate: u32,
}

impl AudioData {
    /// Total duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Borrowed view of a slice of a recording, never outliving it
#[derive(Debug, Clone, Copy)]
pub struct AudioSegment<'a> {
    pub samples: &'a [f32],
    pub sample_rate: u32,
    pub start_time: f64, // seconds, position in source recording
    pub end_time: f64,
}

/// Phonological voicing class of a neighbouring sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoicingCategory {
    Voiced,
    Voiceless,
    /// Utterance boundary; only produced for the following context
    Pause,
    Unknown,
}

impl VoicingCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            VoicingCategory::Voiced => "voiced",
            VoicingCategory::Voiceless => "voiceless",
            VoicingCategory::Pause => "pause",
            VoicingCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VoicingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One annotated phoneme occurrence, enriched with its voicing context
#[derive(Debug, Clone)]
pub struct PhonemeToken {
    /// `TalkID + "_" + PhonemeID`, shared by every frame of the token
    pub obs_id: Arc<str>,
    pub talk_id: String,
    pub phoneme_id: String,
    pub start: f64, // seconds
    pub end: f64,   // seconds
    pub prev_phoneme: Option<String>,
    pub following_mora: Option<String>,
    pub prev_voicing: VoicingCategory,
    pub following_voicing: VoicingCategory,
}

impl PhonemeToken {
    pub fn obs_id_for(talk_id: &str, phoneme_id: &str) -> String {
        format!("{}_{}", talk_id, phoneme_id)
    }
}

/// One analysis frame of one token, ready for serialization
#[derive(Debug, Clone, PartialEq)]
pub struct CepstralFrame {
    pub obs_id: Arc<str>,
    pub timestep: usize,
    /// Number of frames of the owning token
    pub frame_count: usize,
    /// Segment duration in seconds
    pub duration: f64,
    pub coefficients: Vec<f64>,
}

/// Frames produced for a single token, with the keys used for ordering
#[derive(Debug, Clone)]
pub struct TokenFrames {
    pub talk_id: String,
    pub phoneme_id: String,
    pub frames: Vec<CepstralFrame>,
}
