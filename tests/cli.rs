mod support;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

use support::{read_frame_table, write_recording, write_token_table, SAMPLE_RATE};

fn binary() -> Command {
    Command::cargo_bin("csj-mfcc").expect("binary builds")
}

#[test]
fn writes_frame_table_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_recording(dir.path(), "A01F0055", 2.0, SAMPLE_RATE);
    let table = dir.path().join("tokens.psv");
    write_token_table(
        &table,
        &["A01F0055|1|1.000|1.120|k|", "A01M0097|1|0.2|0.3|k|カ"],
    );
    let output = dir.path().join("mfcc.csv");
    let summary_path = dir.path().join("summary.json");

    binary()
        .arg(&table)
        .arg(dir.path())
        .arg(&output)
        .arg("--summary-json")
        .arg(&summary_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let rows = read_frame_table(&output);
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|row| row.0 == "A01F0055_1"));
    assert!(rows.iter().all(|row| row.4.len() == 12));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["recordings_missing"], 1);
    assert_eq!(summary["frames_emitted"], rows.len());
}

#[test]
fn honours_coefficient_count_and_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    write_recording(dir.path(), "T", 1.0, 22_050);
    let table = dir.path().join("tokens.csv");
    fs::write(
        &table,
        "TalkID,PhonemeID,PhonemeStart,PhonemeEnd,PrevPhoneme,FollowingMora\nT,1,0.2,0.35,g,ン\n",
    )
    .unwrap();
    let output = dir.path().join("mfcc.csv");

    binary()
        .arg(&table)
        .arg(dir.path())
        .arg(&output)
        .args(["--delimiter", ",", "-k", "13"])
        .assert()
        .success();

    let header = fs::read_to_string(&output).unwrap();
    let first_line = header.lines().next().unwrap();
    assert!(first_line.starts_with("ObsID,mfcc_timestep,mfcc_nsteps,mfcc_dur,coeff_0,"));
    assert!(first_line.ends_with(",coeff_12"));
    assert!(read_frame_table(&output).iter().all(|row| row.4.len() == 13));
}

#[test]
fn missing_columns_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("tokens.psv");
    fs::write(&table, "TalkID|PhonemeID|PhonemeStart\nT|1|0.1\n").unwrap();

    binary()
        .arg(&table)
        .arg(dir.path())
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required columns"));
}

#[test]
fn missing_input_table_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    binary()
        .arg(dir.path().join("absent.psv"))
        .arg(dir.path())
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure();
}

#[test]
fn all_recordings_missing_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("tokens.psv");
    write_token_table(&table, &["NOPE|1|0.1|0.2|k|カ"]);
    let output = dir.path().join("out.csv");

    binary()
        .arg(&table)
        .arg(dir.path().join("no-such-dir"))
        .arg(&output)
        .assert()
        .success();

    assert!(read_frame_table(&output).is_empty());
}
