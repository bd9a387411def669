//! Color segmentation of lane markings.
//!
//! Frames are converted to 8-bit HSV (H halved into `0..180`, S and V in
//! `0..=255`), masked against the yellow and white ranges, and the union
//! of both masks is reduced to an edge map.

use crate::canny::canny;
use crate::detector::SegmentParams;
use lane_perception_core::{BinaryImage, ColorImageView, Grid, Rgb8};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Convert one RGB sample to 8-bit HSV.
pub fn rgb_to_hsv([r, g, b]: Rgb8) -> [u8; 3] {
    let (ri, gi, bi) = (r as i32, g as i32, b as i32);
    let v = ri.max(gi).max(bi);
    let min = ri.min(gi).min(bi);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        (diff as f64 * 255.0 / v as f64 + 0.5).floor() as i32
    };

    let h = if diff == 0 {
        0
    } else {
        // Hue in sixths of the color wheel, red first, then green.
        let sixths = if v == ri {
            gi - bi
        } else if v == gi {
            bi - ri + 2 * diff
        } else {
            ri - gi + 4 * diff
        };
        let h = (sixths as f64 * 30.0 / diff as f64 + 0.5).floor() as i32;
        if h < 0 {
            h + 180
        } else {
            h
        }
    };

    [h.clamp(0, 179) as u8, s.clamp(0, 255) as u8, v as u8]
}

/// Union of the yellow and white masks.
pub fn color_mask(frame: &ColorImageView<'_>, params: &SegmentParams) -> BinaryImage {
    let data = frame
        .data
        .iter()
        .map(|&rgb| {
            let hsv = rgb_to_hsv(rgb);
            params.yellow.contains(hsv) || params.white.contains(hsv)
        })
        .collect();
    Grid {
        width: frame.width,
        height: frame.height,
        data,
    }
}

/// Candidate lane-marking edges for one frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, params), fields(width = frame.width, height = frame.height))
)]
pub fn segment(frame: &ColorImageView<'_>, params: &SegmentParams) -> BinaryImage {
    let mask = color_mask(frame, params);
    let edges = canny(&mask.view(), &params.canny);
    log::debug!(
        "segment: {} mask pixels, {} edge pixels",
        mask.count_set(),
        edges.count_set()
    );
    edges
}
