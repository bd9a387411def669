//! Core raster and geometry types for monocular lane perception.
//!
//! This crate is intentionally small and knows nothing about lanes. It
//! provides the generic [`Grid`] container (color frames, gray images and
//! binary masks share one type), bilinear sampling, the projective
//! [`Homography`] and perspective warping used to build bird's-eye views.

mod homography;
mod image;
mod logger;

pub use homography::{
    homography_from_4pt, warp_perspective_binary, warp_perspective_gray, Homography,
};
pub use image::{
    sample_bilinear, BinaryImage, BinaryImageView, ColorImage, ColorImageView, GrayImage,
    GrayImageView, Grid, GridError, GridView, Intensity, Rgb8,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_spec, LogSpec};

pub use nalgebra::Point2;
