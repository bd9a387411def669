//! JSON configuration and report helpers for lane detection runs.

use crate::{LaneDetector, LaneDetectorParams, LaneEstimate, LaneParamsError, LaneStatus};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum LaneIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for a batch of still frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaneDetectConfig {
    pub image_paths: Vec<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    /// Directory receiving one bird's-eye PNG per frame.
    #[serde(default)]
    pub warped_dir: Option<String>,
    #[serde(default)]
    pub params: Option<LaneDetectorParams>,
}

impl LaneDetectConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LaneIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LaneIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("lane_detect_report.json"))
    }

    pub fn build_params(&self) -> LaneDetectorParams {
        self.params.clone().unwrap_or_default()
    }

    pub fn build_detector(&self) -> Result<LaneDetector, LaneParamsError> {
        LaneDetector::new(self.build_params())
    }
}

/// Outcome for one frame of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub image_path: String,
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    #[serde(default)]
    pub offset_m: Option<f64>,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub status: Option<LaneStatus>,
    #[serde(default)]
    pub warped_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FrameReport {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            width: 0,
            height: 0,
            offset_m: None,
            heading_deg: None,
            status: None,
            warped_path: None,
            error: None,
        }
    }

    /// Populate report fields from a processed frame.
    pub fn set_detection(&mut self, est: &LaneEstimate) {
        self.width = est.warped.width;
        self.height = est.warped.height;
        self.offset_m = Some(est.offset_m);
        self.heading_deg = Some(est.heading_deg);
        self.status = Some(est.status);
        self.error = None;
    }

    /// Record a failure to load or convert the frame.
    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }
}

/// Report of a whole run, one entry per input frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneDetectReport {
    #[serde(default)]
    pub config_path: Option<String>,
    pub params: LaneDetectorParams,
    pub frames: Vec<FrameReport>,
}

impl LaneDetectReport {
    pub fn new(params: LaneDetectorParams, config_path: Option<&Path>) -> Self {
        Self {
            config_path: config_path.map(|p| p.to_string_lossy().into_owned()),
            params,
            frames: Vec::new(),
        }
    }

    /// Frames whose estimate is backed by both boundary fits.
    pub fn detected_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.status == Some(LaneStatus::Detected))
            .count()
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LaneIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LaneIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlidingWindowParams;
    use lane_perception_core::Grid;

    #[test]
    fn config_defaults_and_partial_params() {
        let raw = r#"{
            "image_paths": ["a.png", "b.png"],
            "params": { "window": { "n_windows": 12, "margin": 80, "min_pixels": 30 } }
        }"#;
        let cfg: LaneDetectConfig = serde_json::from_str(raw).expect("parse");
        assert_eq!(cfg.output_path(), PathBuf::from("lane_detect_report.json"));
        assert!(cfg.warped_dir.is_none());

        let params = cfg.build_params();
        assert_eq!(
            params.window,
            SlidingWindowParams {
                n_windows: 12,
                margin: 80,
                min_pixels: 30
            }
        );
        assert_eq!(params.scale, LaneDetectorParams::default().scale);
        assert!(cfg.build_detector().is_ok());
    }

    #[test]
    fn report_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");

        let mut report = LaneDetectReport::new(LaneDetectorParams::default(), None);
        let mut ok = FrameReport::new("ok.png");
        ok.set_detection(&LaneEstimate {
            offset_m: 0.25,
            heading_deg: -1.5,
            warped: Grid::new_fill(4, 3, false),
            status: LaneStatus::Detected,
        });
        let mut bad = FrameReport::new("missing.png");
        bad.set_error("file not found");
        report.frames.push(ok);
        report.frames.push(bad);
        report.write_json(&path).expect("write");

        let loaded = LaneDetectReport::load_json(&path).expect("load");
        assert_eq!(loaded.frames, report.frames);
        assert_eq!(loaded.detected_count(), 1);
        assert_eq!(loaded.frames[0].width, 4);
        assert_eq!(loaded.frames[1].error.as_deref(), Some("file not found"));
    }

    #[test]
    fn missing_config_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = LaneDetectConfig::load_json(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LaneIoError::Io(_)));
    }
}
