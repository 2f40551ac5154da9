#![allow(dead_code)]

use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

pub const SAMPLE_RATE: u32 = 16_000;
pub const TOKEN_HEADER: &str = "TalkID|PhonemeID|PhonemeStart|PhonemeEnd|PrevPhoneme|FollowingMora";

/// Write a mono 16-bit recording made of two alternating tones.
pub fn write_recording(dir: &Path, talk_id: &str, seconds: f32, sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let path = dir.join(format!("{talk_id}.wav"));
    let mut writer = WavWriter::create(&path, spec)
        .unwrap_or_else(|err| panic!("failed to create {:?}: {}", path, err));
    let total = (sample_rate as f32 * seconds) as usize;
    for index in 0..total {
        let t = index as f32 / sample_rate as f32;
        let frequency = if (t * 4.0) as usize % 2 == 0 { 220.0 } else { 660.0 };
        let sample = 0.4 * (2.0 * PI * frequency * t).sin();
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

pub fn write_token_table(path: &Path, rows: &[&str]) {
    let mut text = String::from(TOKEN_HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(path, text).expect("write token table");
}

/// Parsed frame table: (ObsID, timestep, frame_count, duration, coefficients).
pub fn read_frame_table(path: &Path) -> Vec<(String, usize, usize, f64, Vec<f64>)> {
    let mut reader = csv::Reader::from_path(path).expect("open frame table");
    reader
        .records()
        .map(|record| {
            let record = record.expect("valid record");
            let coefficients = record
                .iter()
                .skip(4)
                .map(|v| v.parse().expect("numeric coefficient"))
                .collect();
            (
                record[0].to_string(),
                record[1].parse().expect("timestep"),
                record[2].parse().expect("frame count"),
                record[3].parse().expect("duration"),
                coefficients,
            )
        })
        .collect()
}
