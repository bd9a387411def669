use assert_cmd::Command;
use image::{Rgb, RgbImage};
use lane_perception::core::Point2;
use lane_perception::detector::{LaneDetectConfig, PerspectiveRectifier};
use lane_perception::LaneDetectorParams;
use predicates::prelude::*;
use std::path::Path;

/// Yellow marking at warped column 0.3 W, white marking at 0.7 W.
fn write_road_png(path: &Path, w: u32, h: u32) {
    let params = LaneDetectorParams::default();
    let r = PerspectiveRectifier::for_frame(&params.rectify, w as usize, h as usize)
        .expect("rectifier");
    let img = RgbImage::from_fn(w, h, |x, y| {
        let p = r.h_warped_from_frame.apply(Point2::new(x as f32, y as f32));
        if p.y < 0.0 || p.y > h as f32 {
            Rgb([60, 60, 60])
        } else if (p.x - 0.3 * w as f32).abs() < 4.0 {
            Rgb([230, 180, 40])
        } else if (p.x - 0.7 * w as f32).abs() < 4.0 {
            Rgb([250, 250, 245])
        } else {
            Rgb([60, 60, 60])
        }
    });
    img.save(path).expect("save png");
}

fn cli() -> Command {
    Command::cargo_bin("lane-perception").expect("binary")
}

#[test]
fn processes_images_and_writes_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let road = dir.path().join("road.png");
    let blank = dir.path().join("blank.png");
    write_road_png(&road, 640, 480);
    RgbImage::new(320, 240).save(&blank).expect("save blank");

    let report = dir.path().join("report.json");
    let warped = dir.path().join("warped");
    let debug = dir.path().join("debug");

    cli()
        .arg(&road)
        .arg(&blank)
        .arg("--output")
        .arg(&report)
        .arg("--warped-dir")
        .arg(&warped)
        .arg("--debug-dir")
        .arg(&debug)
        .arg("--log-level")
        .arg("warn")
        .assert()
        .success()
        .stdout(predicate::str::contains("road.png: offset="))
        .stdout(predicate::str::contains("blank.png: offset=0.000 m heading=0.00 deg no lane"));

    assert!(warped.join("road_warped.png").exists());
    assert!(warped.join("blank_warped.png").exists());
    assert!(debug.join("road_debug.png").exists());

    let raw = std::fs::read_to_string(&report).expect("report");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    let frames = json["frames"].as_array().expect("frames");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["status"]["kind"], "detected");
    assert!(frames[0]["offset_m"].as_f64().expect("offset").abs() < 0.05);
    assert_eq!(frames[1]["status"]["kind"], "insufficient_fit_data");
    assert_eq!(frames[1]["status"]["left_missing"], true);
}

#[test]
fn reads_images_and_params_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let road = dir.path().join("road.png");
    write_road_png(&road, 320, 240);

    let report = dir.path().join("out.json");
    let config = dir.path().join("config.json");
    let mut params = LaneDetectorParams::default();
    params.window.n_windows = 5;
    LaneDetectConfig {
        image_paths: vec![road.to_string_lossy().into_owned()],
        output_path: Some(report.to_string_lossy().into_owned()),
        warped_dir: None,
        params: Some(params),
    }
    .write_json(&config)
    .expect("write config");

    cli().arg("--config").arg(&config).assert().success();

    let raw = std::fs::read_to_string(&report).expect("report");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(json["params"]["window"]["n_windows"], 5);
    assert_eq!(json["frames"].as_array().map(Vec::len), Some(1));
}

#[test]
fn unreadable_image_is_reported_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report = dir.path().join("report.json");

    cli()
        .arg(dir.path().join("missing.png"))
        .arg("--output")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("missing.png: error:"));

    let raw = std::fs::read_to_string(&report).expect("report");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert!(json["frames"][0]["error"].is_string());
}

#[test]
fn fails_without_inputs() {
    cli()
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input images"));
}

#[test]
fn rejects_invalid_params() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("bad.json");
    std::fs::write(
        &config,
        r#"{ "image_paths": ["x.png"], "params": { "window": { "n_windows": 0, "margin": 100, "min_pixels": 50 } } }"#,
    )
    .expect("write");

    cli()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("NoWindows"));
}
