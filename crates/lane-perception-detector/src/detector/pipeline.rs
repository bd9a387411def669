use super::result::{LaneDebug, LaneEstimate, LaneStatus};
use super::{LaneDetectorParams, LaneParamsError};
use crate::fit::{fit, LaneFit};
use crate::locate::{search, LaneSearch};
use crate::metrics::compute;
use crate::rectify::rectify;
use crate::segment::segment;
use lane_perception_core::{BinaryImage, ColorImageView, Grid, Homography};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Single-frame lane detector.
///
/// Holds only validated parameters, so one instance can serve many frames
/// (and many threads) with no coordination.
#[derive(Clone, Debug)]
pub struct LaneDetector {
    params: LaneDetectorParams,
}

struct Stages {
    edges: BinaryImage,
    search: LaneSearch,
    left_fit: Option<LaneFit>,
    right_fit: Option<LaneFit>,
    h_frame_from_warped: Option<Homography>,
    estimate: LaneEstimate,
}

impl LaneDetector {
    pub fn new(params: LaneDetectorParams) -> Result<Self, LaneParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &LaneDetectorParams {
        &self.params
    }

    /// Lateral offset, heading and bird's-eye edge map for one frame.
    ///
    /// Never fails: when either boundary cannot be fitted the offset and
    /// heading are `0.0` and `status` says which side was missing.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn process(&self, frame: &ColorImageView<'_>) -> LaneEstimate {
        self.run(frame).estimate
    }

    /// Same as [`LaneDetector::process`] but keeps every intermediate product.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn process_with_debug(&self, frame: &ColorImageView<'_>) -> LaneDebug {
        let stages = self.run(frame);
        LaneDebug {
            estimate: stages.estimate,
            edges: stages.edges,
            search: stages.search,
            left_fit: stages.left_fit,
            right_fit: stages.right_fit,
            h_frame_from_warped: stages.h_frame_from_warped,
        }
    }

    /// Run the locate, fit and metrics stages on an already rectified map.
    pub fn estimate_from_warped(&self, warped: BinaryImage) -> LaneEstimate {
        let search = search(&warped.view(), &self.params.window);
        let (left, right) = fit(&search.pixels);
        self.finish(warped, left.as_ref(), right.as_ref())
    }

    fn run(&self, frame: &ColorImageView<'_>) -> Stages {
        let edges = segment(frame, &self.params.segment);

        let (warped, h_frame_from_warped) = match rectify(&edges.view(), &self.params.rectify) {
            Ok(r) => (r.warped, Some(r.h_frame_from_warped)),
            Err(err) => {
                log::warn!("lane detector: {err}");
                (Grid::new_fill(frame.width, frame.height, false), None)
            }
        };

        let search = search(&warped.view(), &self.params.window);
        let (left_fit, right_fit) = fit(&search.pixels);
        let estimate = self.finish(warped, left_fit.as_ref(), right_fit.as_ref());

        Stages {
            edges,
            search,
            left_fit,
            right_fit,
            h_frame_from_warped,
            estimate,
        }
    }

    fn finish(
        &self,
        warped: BinaryImage,
        left: Option<&LaneFit>,
        right: Option<&LaneFit>,
    ) -> LaneEstimate {
        let (Some(left), Some(right)) = (left, right) else {
            log::debug!(
                "lane detector: fallback, left fit {} right fit {}",
                if left.is_some() { "ok" } else { "missing" },
                if right.is_some() { "ok" } else { "missing" },
            );
            return LaneEstimate::fallback(warped, left.is_none(), right.is_none());
        };

        let m = compute(warped.height, warped.width, left, right, &self.params.scale);
        if !(m.lateral_offset_m.is_finite() && m.heading_deg.is_finite()) {
            log::warn!("lane detector: non-finite metrics, reporting fallback");
            return LaneEstimate::fallback(warped, false, false);
        }

        log::debug!(
            "lane detector: offset={:.3} m heading={:.2} deg",
            m.lateral_offset_m,
            m.heading_deg
        );
        LaneEstimate {
            offset_m: m.lateral_offset_m,
            heading_deg: m.heading_deg,
            warped,
            status: LaneStatus::Detected,
        }
    }
}
