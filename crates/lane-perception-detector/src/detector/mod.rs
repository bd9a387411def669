//! Lane detection pipeline.
//!
//! This module wires together color/edge segmentation, bird's-eye
//! rectification, sliding-window pixel search, curve fitting and the
//! offset/heading computation.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::LaneParamsError;
pub use params::{
    CannyParams, HsvRange, LaneDetectorParams, PixelScale, RectifyParams, SegmentParams,
    SlidingWindowParams,
};
pub use pipeline::LaneDetector;
pub use result::{LaneDebug, LaneEstimate, LaneSide, LaneStatus};
