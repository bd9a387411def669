//! Vehicle pose relative to the lane, from the two boundary fits.

use crate::detector::PixelScale;
use crate::fit::LaneFit;
use serde::{Deserialize, Serialize};

/// Lateral offset and heading at the vehicle's position (bottom row).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneMetrics {
    /// Positive when the lane center lies right of the image center.
    pub lateral_offset_m: f64,
    /// Angle of the mean boundary direction `atan(dx/dy)`, in degrees.
    pub heading_deg: f64,
}

/// Evaluate both fits at `y = warped_height`.
pub fn compute(
    warped_height: usize,
    warped_width: usize,
    left: &LaneFit,
    right: &LaneFit,
    scale: &PixelScale,
) -> LaneMetrics {
    let y = warped_height as f64;

    let lane_center = (left.eval(y) + right.eval(y)) / 2.0;
    let image_center = warped_width as f64 / 2.0;
    let lateral_offset_m = (lane_center - image_center) * scale.xm_per_pix;

    let mean_slope = (left.slope(y) + right.slope(y)) / 2.0;
    let heading_deg = mean_slope.atan().to_degrees();

    LaneMetrics {
        lateral_offset_m,
        heading_deg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line(b: f64, c: f64) -> LaneFit {
        LaneFit { a: 0.0, b, c }
    }

    #[test]
    fn centered_parallel_lines_give_zero() {
        let m = compute(720, 1280, &line(0.0, 340.0), &line(0.0, 940.0), &PixelScale::default());
        assert_abs_diff_eq!(m.lateral_offset_m, 0.0);
        assert_abs_diff_eq!(m.heading_deg, 0.0);
    }

    #[test]
    fn offset_follows_lane_center() {
        let scale = PixelScale::default();
        let m = compute(720, 1280, &line(0.0, 300.0), &line(0.0, 900.0), &scale);
        assert_abs_diff_eq!(m.lateral_offset_m, -40.0 * scale.xm_per_pix, epsilon = 1e-12);

        let shifted = compute(720, 1280, &line(0.0, 350.0), &line(0.0, 950.0), &scale);
        assert_abs_diff_eq!(
            shifted.lateral_offset_m - m.lateral_offset_m,
            50.0 * scale.xm_per_pix,
            epsilon = 1e-12
        );
    }

    #[test]
    fn heading_uses_mean_slope_at_bottom() {
        let left = LaneFit {
            a: 0.0001,
            b: 0.1,
            c: 200.0,
        };
        let right = LaneFit {
            a: -0.0001,
            b: 0.3,
            c: 900.0,
        };
        // Slopes at y=500: 0.2 and 0.2.
        let m = compute(500, 1280, &left, &right, &PixelScale::default());
        assert_abs_diff_eq!(m.heading_deg, 0.2_f64.atan().to_degrees(), epsilon = 1e-12);
    }
}
