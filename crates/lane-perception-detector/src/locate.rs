//! Histogram-seeded sliding-window search for lane boundary pixels.
//!
//! Algorithm:
//! 1. Count set pixels per column over the bottom half of the warped map.
//! 2. The peak of the left half seeds the left boundary, the peak of the
//!    right half seeds the right boundary (first maximum wins).
//! 3. Split the height into `n_windows` equal bands and scan them bottom to
//!    top. Each side collects the set pixels in `[x - margin, x + margin)`
//!    within the band.
//! 4. A side recenters on the mean x of its collected pixels only when it
//!    collected more than `min_pixels`; otherwise its estimate carries over.
//!
//! Rows above `n_windows * (height / n_windows)` are never scanned.

use crate::detector::SlidingWindowParams;
use lane_perception_core::BinaryImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One pixel in warped coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanePixel {
    pub x: u32,
    pub y: u32,
}

/// Pixels attributed to each lane boundary, in scan order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSet {
    pub left: Vec<LanePixel>,
    pub right: Vec<LanePixel>,
}

/// Trace of one band of the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    /// Band index, 0 at the bottom of the image.
    pub band: usize,
    pub y_low: usize,
    pub y_high: usize,
    /// Window centers used for this band.
    pub left_center: i64,
    pub right_center: i64,
    pub left_count: usize,
    pub right_count: usize,
}

/// Full result of a sliding-window search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSearch {
    pub pixels: PixelSet,
    pub left_base: usize,
    pub right_base: usize,
    pub windows: Vec<SearchWindow>,
}

/// Set-pixel count per column over rows `height / 2 .. height`.
pub fn column_histogram(warped: &BinaryImageView<'_>) -> Vec<u32> {
    let mut hist = vec![0u32; warped.width];
    for y in warped.height / 2..warped.height {
        for (bin, &v) in hist.iter_mut().zip(warped.row(y)) {
            *bin += v as u32;
        }
    }
    hist
}

// First index of the maximum; 0 for an empty slice.
fn argmax_first(values: &[u32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Seed columns `(left, right)` from the column histogram.
pub fn histogram_bases(hist: &[u32]) -> (usize, usize) {
    let midpoint = hist.len() / 2;
    let left = argmax_first(&hist[..midpoint]);
    let right = argmax_first(&hist[midpoint..]) + midpoint;
    (left, right)
}

struct SideScan {
    center: i64,
    pixels: Vec<LanePixel>,
}

impl SideScan {
    // Collect band pixels inside the window; returns how many were added.
    fn collect(&mut self, rows: &[Vec<u32>], y_low: usize, y_high: usize, margin: i64) -> usize {
        let lo = self.center - margin;
        let hi = self.center + margin;
        let start = self.pixels.len();
        for (y, row) in rows.iter().enumerate().take(y_high).skip(y_low) {
            self.pixels.extend(
                row.iter()
                    .filter(|&&x| (x as i64) >= lo && (x as i64) < hi)
                    .map(|&x| LanePixel { x, y: y as u32 }),
            );
        }
        self.pixels.len() - start
    }

    fn recenter(&mut self, added: usize, min_pixels: usize) {
        if added > min_pixels {
            let new = &self.pixels[self.pixels.len() - added..];
            let sum: u64 = new.iter().map(|p| p.x as u64).sum();
            self.center = (sum / added as u64) as i64;
        }
    }
}

/// Run the search and keep the per-band trace.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(warped, params), fields(width = warped.width, height = warped.height))
)]
pub fn search(warped: &BinaryImageView<'_>, params: &SlidingWindowParams) -> LaneSearch {
    let (w, h) = (warped.width, warped.height);
    let hist = column_histogram(warped);
    let (left_base, right_base) = histogram_bases(&hist);

    let rows: Vec<Vec<u32>> = (0..h)
        .map(|y| {
            warped
                .row(y)
                .iter()
                .enumerate()
                .filter_map(|(x, &v)| v.then_some(x as u32))
                .collect()
        })
        .collect();

    let n_windows = params.n_windows.max(1);
    let window_height = h / n_windows;
    // Past `h` bands every window is the empty row range at the top.
    let n_bands = n_windows.min(h.max(1));
    let margin = params.margin as i64;

    let mut left = SideScan {
        center: left_base as i64,
        pixels: Vec::new(),
    };
    let mut right = SideScan {
        center: right_base as i64,
        pixels: Vec::new(),
    };
    let mut windows = Vec::with_capacity(n_bands);

    for band in 0..n_bands {
        let y_low = h - (band + 1) * window_height;
        let y_high = h - band * window_height;

        let (left_center, right_center) = (left.center, right.center);
        let left_count = left.collect(&rows, y_low, y_high, margin);
        let right_count = right.collect(&rows, y_low, y_high, margin);

        windows.push(SearchWindow {
            band,
            y_low,
            y_high,
            left_center,
            right_center,
            left_count,
            right_count,
        });

        left.recenter(left_count, params.min_pixels);
        right.recenter(right_count, params.min_pixels);
    }

    log::debug!(
        "locate: {}x{} bases=({left_base}, {right_base}) left={} right={}",
        w,
        h,
        left.pixels.len(),
        right.pixels.len()
    );

    LaneSearch {
        pixels: PixelSet {
            left: left.pixels,
            right: right.pixels,
        },
        left_base,
        right_base,
        windows,
    }
}

/// Pixels belonging to the left and right lane boundaries.
pub fn locate(warped: &BinaryImageView<'_>, params: &SlidingWindowParams) -> PixelSet {
    search(warped, params).pixels
}
