use super::LaneParamsError;
use lane_perception_core::{homography_from_4pt, Point2};
use serde::{Deserialize, Serialize};

/// Inclusive range in 8-bit HSV space (H in `0..=179`, S and V in `0..=255`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }

    /// Yellow markings: hue 15..=30, moderately saturated and bright.
    pub const fn yellow() -> Self {
        Self::new([15, 100, 100], [30, 255, 255])
    }

    /// White markings: any hue, low saturation, high brightness.
    pub const fn white() -> Self {
        Self::new([0, 0, 200], [180, 30, 255])
    }
}

/// Hysteresis thresholds on the L1 Sobel gradient magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CannyParams {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
        }
    }
}

/// Color segmentation and edge extraction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    #[serde(default = "HsvRange::yellow")]
    pub yellow: HsvRange,
    #[serde(default = "HsvRange::white")]
    pub white: HsvRange,
    #[serde(default)]
    pub canny: CannyParams,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            yellow: HsvRange::yellow(),
            white: HsvRange::white(),
            canny: CannyParams::default(),
        }
    }
}

/// Bird's-eye geometry as fractions of frame width/height.
///
/// Both quads are ordered top-left, top-right, bottom-left, bottom-right.
/// The source trapezoid must match how the camera is mounted; it is not
/// derived from any calibration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectifyParams {
    pub src: [[f32; 2]; 4],
    pub dst: [[f32; 2]; 4],
}

impl Default for RectifyParams {
    fn default() -> Self {
        Self {
            src: [[0.45, 0.65], [0.55, 0.65], [0.10, 1.0], [0.90, 1.0]],
            dst: [[0.20, 0.0], [0.80, 0.0], [0.20, 1.0], [0.80, 1.0]],
        }
    }
}

impl RectifyParams {
    /// Source and destination quads in pixel coordinates for a `width x height` frame.
    pub fn frame_points(&self, width: usize, height: usize) -> ([Point2<f32>; 4], [Point2<f32>; 4]) {
        let (w, h) = (width as f32, height as f32);
        let scale = |q: &[[f32; 2]; 4]| q.map(|[fx, fy]| Point2::new(fx * w, fy * h));
        (scale(&self.src), scale(&self.dst))
    }
}

/// Sliding-window search settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidingWindowParams {
    /// Number of horizontal bands scanned bottom to top.
    pub n_windows: usize,
    /// Half-width of each search window, in pixels.
    pub margin: u32,
    /// A window recenters only when it collects strictly more pixels than this.
    pub min_pixels: usize,
}

impl SlidingWindowParams {
    /// Upper bound on `n_windows` accepted by validation.
    pub const MAX_WINDOWS: usize = 1024;
}

impl Default for SlidingWindowParams {
    fn default() -> Self {
        Self {
            n_windows: 9,
            margin: 100,
            min_pixels: 50,
        }
    }
}

/// Meters per warped pixel along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelScale {
    pub ym_per_pix: f64,
    pub xm_per_pix: f64,
}

impl Default for PixelScale {
    fn default() -> Self {
        Self {
            ym_per_pix: 30.0 / 720.0,
            xm_per_pix: 3.7 / 700.0,
        }
    }
}

/// Configuration for the lane detector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneDetectorParams {
    #[serde(default)]
    pub segment: SegmentParams,
    #[serde(default)]
    pub rectify: RectifyParams,
    #[serde(default)]
    pub window: SlidingWindowParams,
    #[serde(default)]
    pub scale: PixelScale,
}

impl LaneDetectorParams {
    pub fn validate(&self) -> Result<(), LaneParamsError> {
        for (name, range) in [("yellow", &self.segment.yellow), ("white", &self.segment.white)] {
            if (0..3).any(|c| range.lower[c] > range.upper[c]) {
                return Err(LaneParamsError::InvertedHsvRange { name });
            }
        }

        let canny = &self.segment.canny;
        if !(canny.low_threshold.is_finite()
            && canny.high_threshold.is_finite()
            && canny.low_threshold >= 0.0
            && canny.low_threshold <= canny.high_threshold)
        {
            return Err(LaneParamsError::InvalidCannyThresholds {
                low: canny.low_threshold,
                high: canny.high_threshold,
            });
        }

        if self.window.n_windows == 0 {
            return Err(LaneParamsError::NoWindows);
        }
        if self.window.n_windows > SlidingWindowParams::MAX_WINDOWS {
            return Err(LaneParamsError::TooManyWindows {
                n_windows: self.window.n_windows,
                max: SlidingWindowParams::MAX_WINDOWS,
            });
        }

        for (name, value) in [
            ("ym_per_pix", self.scale.ym_per_pix),
            ("xm_per_pix", self.scale.xm_per_pix),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LaneParamsError::InvalidScale { name, value });
            }
        }

        // Collinearity is invariant under the per-axis scaling applied per
        // frame, so checking the unit square is enough.
        let (src, dst) = self.rectify.frame_points(1, 1);
        let to_frame = homography_from_4pt(&src, &dst);
        let to_warped = homography_from_4pt(&dst, &src);
        if to_frame.is_none() || to_warped.is_none() {
            return Err(LaneParamsError::DegenerateGeometry);
        }

        Ok(())
    }
}
