//! Single-frame lane boundary detection.
//!
//! ## Quickstart
//!
//! ```
//! use lane_perception_detector::{LaneDetector, LaneDetectorParams};
//! use lane_perception_core::Grid;
//!
//! let detector = LaneDetector::new(LaneDetectorParams::default()).unwrap();
//! let frame = Grid::new_fill(64, 48, [0u8, 0, 0]);
//! let estimate = detector.process(&frame.view());
//! assert!(!estimate.is_confident());
//! assert_eq!(estimate.offset_m, 0.0);
//! ```
//!
//! Pipeline:
//! 1. Threshold yellow and white markings in HSV and run Canny on the mask.
//! 2. Warp the edge map from the road trapezoid to a bird's-eye rectangle.
//! 3. Seed both boundaries from the bottom-half column histogram and trace
//!    them upward with sliding windows.
//! 4. Fit `x = a*y^2 + b*y + c` to each boundary.
//! 5. Evaluate both fits at the bottom row for lateral offset and heading.
//!
//! When either boundary has no pixels the offset and heading are `0.0` and
//! the returned [`LaneStatus`] reports the missing side.

mod canny;
mod detector;
mod fit;
mod io;
mod locate;
mod metrics;
mod rectify;
mod segment;

pub use canny::canny;
pub use detector::{
    CannyParams, HsvRange, LaneDebug, LaneDetector, LaneDetectorParams, LaneEstimate,
    LaneParamsError, LaneSide, LaneStatus, PixelScale, RectifyParams, SegmentParams,
    SlidingWindowParams,
};
pub use fit::{fit, fit_lane, LaneFit};
pub use io::{FrameReport, LaneDetectConfig, LaneDetectReport, LaneIoError};
pub use locate::{
    column_histogram, histogram_bases, locate, search, LanePixel, LaneSearch, PixelSet,
    SearchWindow,
};
pub use metrics::{compute as compute_metrics, LaneMetrics};
pub use rectify::{rectify, PerspectiveRectifier, Rectified, RectifyError};
pub use segment::{color_mask, rgb_to_hsv, segment};
