use crate::fit::LaneFit;
use crate::locate::LaneSearch;
use lane_perception_core::{BinaryImage, Homography, Point2};
use serde::{Deserialize, Serialize};

/// Whether a frame produced a usable estimate.
///
/// Offset and heading fall back to zero whenever a boundary fit is missing,
/// so callers must consult this status to tell "centered" from "no lane".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaneStatus {
    Detected,
    InsufficientFitData {
        left_missing: bool,
        right_missing: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSide {
    Left,
    Right,
}

/// Output of one `process` call.
#[derive(Clone, Debug)]
pub struct LaneEstimate {
    pub offset_m: f64,
    pub heading_deg: f64,
    /// Bird's-eye edge map, returned even when detection fails.
    pub warped: BinaryImage,
    pub status: LaneStatus,
}

impl LaneEstimate {
    pub(crate) fn fallback(warped: BinaryImage, left_missing: bool, right_missing: bool) -> Self {
        Self {
            offset_m: 0.0,
            heading_deg: 0.0,
            warped,
            status: LaneStatus::InsufficientFitData {
                left_missing,
                right_missing,
            },
        }
    }

    #[inline]
    pub fn is_confident(&self) -> bool {
        self.status == LaneStatus::Detected
    }

    /// `(offset_m, heading_deg, warped)`.
    pub fn into_parts(self) -> (f64, f64, BinaryImage) {
        (self.offset_m, self.heading_deg, self.warped)
    }
}

/// Every intermediate product of one frame, for diagnostics.
#[derive(Clone, Debug)]
pub struct LaneDebug {
    pub estimate: LaneEstimate,
    pub edges: BinaryImage,
    pub search: LaneSearch,
    pub left_fit: Option<LaneFit>,
    pub right_fit: Option<LaneFit>,
    /// Maps warped coordinates back into the frame; `None` when the frame
    /// geometry could not be rectified.
    pub h_frame_from_warped: Option<Homography>,
}

impl LaneDebug {
    pub fn fit(&self, side: LaneSide) -> Option<&LaneFit> {
        match side {
            LaneSide::Left => self.left_fit.as_ref(),
            LaneSide::Right => self.right_fit.as_ref(),
        }
    }

    /// Back-project warped-space points into frame coordinates.
    pub fn project_to_frame(&self, points: &[Point2<f32>]) -> Option<Vec<Point2<f32>>> {
        let h = self.h_frame_from_warped.as_ref()?;
        points.iter().map(|&p| h.try_apply(p)).collect()
    }

    /// The fitted boundary of `side`, sampled every `step` rows and drawn
    /// in frame coordinates.
    pub fn boundary_in_frame(&self, side: LaneSide, step: usize) -> Option<Vec<Point2<f32>>> {
        let fit = self.fit(side)?;
        let samples = fit.sample(self.estimate.warped.height, step);
        self.project_to_frame(&samples)
    }
}
