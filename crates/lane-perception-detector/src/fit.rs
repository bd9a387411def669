//! Second-degree polynomial fits `x = a*y^2 + b*y + c` of lane boundaries.

use crate::locate::{LanePixel, PixelSet};
use lane_perception_core::Point2;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Boundary curve in warped pixel coordinates, `x = a*y^2 + b*y + c`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LaneFit {
    #[inline]
    pub fn eval(&self, y: f64) -> f64 {
        (self.a * y + self.b) * y + self.c
    }

    /// First derivative `dx/dy`.
    #[inline]
    pub fn slope(&self, y: f64) -> f64 {
        2.0 * self.a * y + self.b
    }

    /// Points along the curve every `step` rows from the top to `height`.
    pub fn sample(&self, height: usize, step: usize) -> Vec<Point2<f32>> {
        (0..=height)
            .step_by(step.max(1))
            .map(|y| Point2::new(self.eval(y as f64) as f32, y as f32))
            .collect()
    }
}

/// Least-squares fit of x as a function of y.
///
/// Returns `None` for an empty pixel set. Rank-deficient inputs (fewer than
/// three distinct rows) get the minimum-norm solution.
pub fn fit_lane(pixels: &[LanePixel]) -> Option<LaneFit> {
    if pixels.is_empty() {
        return None;
    }

    let n = pixels.len();
    let mut vander = DMatrix::<f64>::zeros(n, 3);
    let mut rhs = DVector::<f64>::zeros(n);
    for (i, p) in pixels.iter().enumerate() {
        let y = p.y as f64;
        vander[(i, 0)] = y * y;
        vander[(i, 1)] = y;
        vander[(i, 2)] = 1.0;
        rhs[i] = p.x as f64;
    }

    // Column scaling keeps the y^2 column from dominating the conditioning.
    let mut scale = [1.0_f64; 3];
    for (j, s) in scale.iter_mut().enumerate() {
        let norm = vander.column(j).norm();
        if norm > 0.0 {
            *s = norm;
            vander.column_mut(j).unscale_mut(norm);
        }
    }

    let svd = vander.svd(true, true);
    let rcond = n as f64 * f64::EPSILON;
    let eps = rcond * svd.singular_values.max();
    let solution = match svd.solve(&rhs, eps) {
        Ok(s) => s,
        Err(msg) => {
            log::warn!("fit: least-squares solve failed: {msg}");
            return None;
        }
    };

    let fit = LaneFit {
        a: solution[0] / scale[0],
        b: solution[1] / scale[1],
        c: solution[2] / scale[2],
    };
    if !(fit.a.is_finite() && fit.b.is_finite() && fit.c.is_finite()) {
        log::warn!("fit: non-finite coefficients for {n} pixels");
        return None;
    }
    Some(fit)
}

/// Fit both boundaries; an empty side yields `None` for that side.
pub fn fit(pixels: &PixelSet) -> (Option<LaneFit>, Option<LaneFit>) {
    (fit_lane(&pixels.left), fit_lane(&pixels.right))
}
