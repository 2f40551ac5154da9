//! Token-level MFCC extraction for annotated speech corpora.
//!
//! Reads a table of phoneme tokens, classifies each token's voicing context,
//! and computes one row of cepstral coefficients per analysis frame of every
//! token whose recording can be resolved.

pub mod audio;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod types;
pub mod voicing;
