//! High-level facade crate for the `lane-perception-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying crates
//! - (feature-gated) helpers that run the detector on `image` crate buffers
//!   and render its intermediate products back into images.
//!
//! ## Quickstart
//!
//! ```no_run
//! use lane_perception::detect;
//! use lane_perception::LaneDetectorParams;
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("road.png")?.decode()?.to_rgb8();
//! let estimate = detect::detect_lanes(&img, LaneDetectorParams::default())?;
//! if estimate.is_confident() {
//!     println!("offset {:.3} m, heading {:.2} deg", estimate.offset_m, estimate.heading_deg);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `lane_perception::core`: grids, homographies and perspective warping.
//! - `lane_perception::detector`: the pipeline stages, parameters and JSON I/O.
//! - `lane_perception::detect` (feature `image`): helpers for `image::RgbImage`.

pub use lane_perception_core as core;
pub use lane_perception_detector as detector;

pub use lane_perception_core::{BinaryImage, ColorImage, ColorImageView, Grid, GridError};
pub use lane_perception_detector::{
    LaneDebug, LaneDetector, LaneDetectorParams, LaneEstimate, LaneParamsError, LaneSide,
    LaneStatus,
};

#[cfg(feature = "image")]
pub mod detect;
