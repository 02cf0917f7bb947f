#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;

fn write_target_png(path: &Path) {
    let frame = RgbImage::from_fn(320, 240, |x, y| {
        if (110..210).contains(&x) && (70..170).contains(&y) {
            Rgb([220, 30, 30])
        } else {
            Rgb([20, 20, 20])
        }
    });
    frame.save(path).expect("write test image");
}

fn cli() -> Command {
    Command::cargo_bin("target-practice").expect("binary built")
}

#[test]
fn still_image_writes_annotated_png_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("range.png");
    let out = dir.path().join("out");
    let report = dir.path().join("report.jsonl");
    write_target_png(&input);

    cli()
        .arg("--image")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .arg("--save-raw")
        .arg("--json")
        .arg(&report)
        .args(["--log-level", "off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 presented"))
        .stdout(predicate::str::contains("1 with targets"));

    let annotated = out.join("frame_000000_annotated.png");
    assert!(annotated.is_file());
    assert!(out.join("frame_000000_raw.png").is_file());
    let decoded = image::open(&annotated).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (320, 240));

    let text = fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    let json: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(json["status"], "acquired");
    assert_eq!(json["message"], "Target(s) acquired.");
    assert_eq!(json["num_accepted"], 1);
}

#[test]
fn config_file_changes_the_color_range() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("range.png");
    let config = dir.path().join("green.json");
    let report = dir.path().join("report.jsonl");
    write_target_png(&input);
    fs::write(
        &config,
        r#"{ "color": { "low": [0, 100, 0], "high": [90, 255, 90] } }"#,
    )
    .unwrap();

    cli()
        .arg("--image")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .arg(&report)
        .args(["--log-level", "off"])
        .assert()
        .success();

    let text = fs::read_to_string(&report).unwrap();
    let json: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(json["status"], "no_targets");
    assert_eq!(json["num_contours"], 0);
}

#[test]
fn raw_frames_on_stdin_are_analyzed() {
    let frame = RgbImage::from_fn(64, 48, |x, y| {
        if (10..50).contains(&x) && (5..45).contains(&y) {
            Rgb([220, 30, 30])
        } else {
            Rgb([0, 0, 0])
        }
    });
    let mut bytes = frame.as_raw().clone();
    bytes.extend_from_slice(frame.as_raw());

    cli()
        .args(["--webcam", "--raw-width", "64", "--raw-height", "48"])
        .args(["--log-level", "off"])
        .write_stdin(bytes)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 presented"));
}

#[test]
fn max_frames_stops_early() {
    let bytes = vec![0u8; 8 * 8 * 3 * 5];
    cli()
        .args(["--webcam", "--raw-width", "8", "--raw-height", "8"])
        .args(["--max-frames", "2", "--log-level", "off"])
        .write_stdin(bytes)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 presented"));
}

#[test]
fn input_is_required() {
    cli().assert().failure();
}

#[test]
fn invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("range.png");
    let config = dir.path().join("bad.json");
    write_target_png(&input);
    fs::write(&config, r#"{ "edges": { "blur_kernel_size": 2 } }"#).unwrap();

    cli()
        .arg("--image")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BlurKernel"));
}

#[test]
fn missing_image_fails() {
    cli()
        .args(["--image", "/nonexistent/range.png", "--log-level", "off"])
        .assert()
        .failure();
}
