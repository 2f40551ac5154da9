//! Delimited-text I/O for the token table and the frame table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::config::OutputEncoding;
use crate::error::{TableError, TableResult};
use crate::types::{CepstralFrame, PhonemeToken, VoicingCategory};

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "TalkID",
    "PhonemeID",
    "PhonemeStart",
    "PhonemeEnd",
    "PrevPhoneme",
    "FollowingMora",
];

/// Field values treated the same as an empty field.
const NA_MARKERS: &[&str] = &["NA", "N/A", "#N/A", "NaN", "nan", "NULL", "null"];

#[derive(Debug, Deserialize)]
struct TokenRow {
    #[serde(rename = "TalkID")]
    talk_id: String,
    #[serde(rename = "PhonemeID")]
    phoneme_id: String,
    #[serde(rename = "PhonemeStart")]
    start: f64,
    #[serde(rename = "PhonemeEnd")]
    end: f64,
    #[serde(rename = "PrevPhoneme")]
    prev_phoneme: Option<String>,
    #[serde(rename = "FollowingMora")]
    following_mora: Option<String>,
}

/// Read the token table. Voicing fields are left `Unknown` for the classifier to fill.
pub fn read_token_table(path: &Path, delimiter: u8) -> TableResult<Vec<PhonemeToken>> {
    let bytes = fs::read(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(&bytes)?;
    parse_token_table(&text, delimiter)
}

pub fn parse_token_table(text: &str, delimiter: u8) -> TableResult<Vec<PhonemeToken>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(|err| TableError::Parse {
        row: 0,
        message: err.to_string(),
    })?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TableError::MissingColumns(missing));
    }

    let mut tokens = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (idx, result) in reader.deserialize::<TokenRow>().enumerate() {
        let row_number = idx + 1;
        let row = result.map_err(|err| TableError::Parse {
            row: row_number,
            message: err.to_string(),
        })?;

        let obs_id = PhonemeToken::obs_id_for(&row.talk_id, &row.phoneme_id);
        if let Some(&first) = seen.get(&obs_id) {
            return Err(TableError::DuplicateObsId {
                obs_id,
                first,
                second: row_number,
            });
        }
        seen.insert(obs_id.clone(), row_number);

        tokens.push(PhonemeToken {
            obs_id: Arc::from(obs_id),
            talk_id: row.talk_id,
            phoneme_id: row.phoneme_id,
            start: row.start,
            end: row.end,
            prev_phoneme: present(row.prev_phoneme),
            following_mora: present(row.following_mora),
            prev_voicing: VoicingCategory::Unknown,
            following_voicing: VoicingCategory::Unknown,
        });
    }
    Ok(tokens)
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !NA_MARKERS.contains(&v.as_str()))
}

/// Decode UTF-8 (with or without BOM) or BOM-marked UTF-16 text.
fn decode_text(bytes: &[u8]) -> TableResult<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    let rest = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    std::str::from_utf8(rest)
        .map(str::to_owned)
        .map_err(|err| TableError::Encoding(err.to_string()))
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> TableResult<String> {
    if bytes.len() % 2 != 0 {
        return Err(TableError::Encoding(
            "UTF-16 input has an odd number of bytes".into(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|err| TableError::Encoding(err.to_string()))
}

/// Buffers a delimited table in memory and writes it out in the chosen encoding.
pub struct TableWriter {
    inner: csv::Writer<Vec<u8>>,
    encoding: OutputEncoding,
}

impl TableWriter {
    pub fn new(delimiter: u8, encoding: OutputEncoding) -> Self {
        Self {
            inner: csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(Vec::new()),
            encoding,
        }
    }

    pub fn write_row<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner
            .write_record(fields)
            .context("Failed to write table row")
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let utf8 = self
            .inner
            .into_inner()
            .map_err(|err| anyhow!("Failed to flush table: {}", err.error()))?;
        match self.encoding {
            OutputEncoding::Utf8 => Ok(utf8),
            OutputEncoding::Utf16 => {
                let text = String::from_utf8(utf8).context("Table text is not valid UTF-8")?;
                let mut out = Vec::with_capacity(2 + text.len() * 2);
                out.extend_from_slice(&[0xFF, 0xFE]);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(out)
            }
        }
    }

    pub fn finish(self, path: &Path) -> Result<()> {
        let bytes = self.into_bytes()?;
        fs::write(path, bytes).with_context(|| format!("Failed to write table {:?}", path))
    }
}

pub fn frame_table_header(coefficients: usize) -> Vec<String> {
    let mut header: Vec<String> = ["ObsID", "mfcc_timestep", "mfcc_nsteps", "mfcc_dur"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend((0..coefficients).map(|c| format!("coeff_{}", c)));
    header
}

pub fn write_frame_table(
    path: &Path,
    frames: &[CepstralFrame],
    coefficients: usize,
    delimiter: u8,
    encoding: OutputEncoding,
) -> Result<()> {
    let mut writer = TableWriter::new(delimiter, encoding);
    writer.write_row(frame_table_header(coefficients))?;
    for frame in frames {
        let mut fields = Vec::with_capacity(4 + frame.coefficients.len());
        fields.push(frame.obs_id.to_string());
        fields.push(frame.timestep.to_string());
        fields.push(frame.frame_count.to_string());
        fields.push(frame.duration.to_string());
        fields.extend(frame.coefficients.iter().map(|c| c.to_string()));
        writer.write_row(fields)?;
    }
    writer.finish(path)
}

/// Token table enriched with both voicing categories.
pub fn write_voicing_table(
    path: &Path,
    tokens: &[PhonemeToken],
    delimiter: u8,
    encoding: OutputEncoding,
) -> Result<()> {
    let mut writer = TableWriter::new(delimiter, encoding);
    writer.write_row([
        "ObsID",
        "TalkID",
        "PhonemeID",
        "PhonemeStart",
        "PhonemeEnd",
        "PrevPhoneme",
        "FollowingMora",
        "PrevVoicing",
        "FollowingVoicing",
    ])?;
    for token in tokens {
        writer.write_row([
            token.obs_id.to_string(),
            token.talk_id.clone(),
            token.phoneme_id.clone(),
            token.start.to_string(),
            token.end.to_string(),
            token.prev_phoneme.clone().unwrap_or_default(),
            token.following_mora.clone().unwrap_or_default(),
            token.prev_voicing.to_string(),
            token.following_voicing.to_string(),
        ])?;
    }
    writer.finish(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "TalkID|PhonemeID|PhonemeStart|PhonemeEnd|PrevPhoneme|FollowingMora";

    #[test]
    fn parses_tokens_and_builds_obs_ids() {
        let text = format!("{HEADER}\nA01F0055|17|1.0|1.12|k|シャ\nA01F0055|18|1.12|1.2|a|\n");
        let tokens = parse_token_table(&text, b'|').unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(&*tokens[0].obs_id, "A01F0055_17");
        assert_eq!(tokens[0].prev_phoneme.as_deref(), Some("k"));
        assert_eq!(tokens[0].following_mora.as_deref(), Some("シャ"));
        assert_eq!(tokens[1].following_mora, None);
        assert!((tokens[1].end - 1.2).abs() < 1e-12);
    }

    #[test]
    fn ignores_extra_columns_and_reorders() {
        let text = "Extra,FollowingMora,PhonemeEnd,PhonemeStart,PhonemeID,TalkID,PrevPhoneme\n\
                    x,ン,0.5,0.4,3,S01,t\n";
        let tokens = parse_token_table(text, b',').unwrap();
        assert_eq!(&*tokens[0].obs_id, "S01_3");
        assert_eq!(tokens[0].following_mora.as_deref(), Some("ン"));
    }

    #[test]
    fn na_markers_count_as_absent() {
        let text = format!("{HEADER}\nT|1|0.1|0.2|NA|NaN\n");
        let tokens = parse_token_table(&text, b'|').unwrap();
        assert_eq!(tokens[0].prev_phoneme, None);
        assert_eq!(tokens[0].following_mora, None);
    }

    #[test]
    fn reports_missing_columns() {
        let text = "TalkID|PhonemeID|PhonemeStart\nT|1|0.1\n";
        match parse_token_table(text, b'|') {
            Err(TableError::MissingColumns(columns)) => {
                assert_eq!(columns, vec!["PhonemeEnd", "PrevPhoneme", "FollowingMora"]);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn reports_unparsable_times() {
        let text = format!("{HEADER}\nT|1|soon|0.2|k|カ\n");
        assert!(matches!(
            parse_token_table(&text, b'|'),
            Err(TableError::Parse { row: 1, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_obs_ids() {
        let text = format!("{HEADER}\nT|1|0.1|0.2|k|カ\nT|1|0.3|0.4|k|カ\n");
        assert!(matches!(
            parse_token_table(&text, b'|'),
            Err(TableError::DuplicateObsId { first: 1, second: 2, .. })
        ));
    }

    #[test]
    fn decodes_utf16_with_bom() {
        let text = format!("{HEADER}\nT|1|0.1|0.2|k|ジョ\n");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_text(&bytes).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn strips_utf8_bom() {
        let decoded = decode_text(b"\xEF\xBB\xBFTalkID").unwrap();
        assert_eq!(decoded, "TalkID");
    }

    #[test]
    fn utf16_output_starts_with_bom() {
        let mut writer = TableWriter::new(b',', OutputEncoding::Utf16);
        writer.write_row(["ObsID", "ン"]).unwrap();
        let bytes = writer.into_bytes().unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xFE]);
        assert_eq!(decode_text(&bytes).unwrap(), "ObsID,ン\n");
    }

    #[test]
    fn frame_header_lists_every_coefficient() {
        let header = frame_table_header(3);
        assert_eq!(
            header,
            vec!["ObsID", "mfcc_timestep", "mfcc_nsteps", "mfcc_dur", "coeff_0", "coeff_1", "coeff_2"]
        );
    }
}
