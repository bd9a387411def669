//! Two-threshold gradient edge extraction (Canny) on binary masks.
//!
//! Gradients use 3x3 Sobel kernels with replicated borders and the L1
//! magnitude `|gx| + |gy|` (mask pixels count as 0/255). Non-maximum
//! suppression quantizes the gradient direction into four sectors; a pixel
//! survives when it beats its predecessor strictly and its successor
//! non-strictly, which keeps exactly one pixel across a step edge.
//! Hysteresis then keeps weak pixels 8-connected to a strong one.

use crate::detector::CannyParams;
use lane_perception_core::{BinaryImage, BinaryImageView, Grid};

const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_7;

struct Gradients {
    gx: Vec<f32>,
    gy: Vec<f32>,
    mag: Vec<f32>,
}

fn sobel(src: &BinaryImageView<'_>) -> Gradients {
    let (w, h) = (src.width, src.height);
    let px = |x: usize, y: usize| if src.data[y * w + x] { 255.0_f32 } else { 0.0 };

    let mut gx = vec![0.0; w * h];
    let mut gy = vec![0.0; w * h];
    let mut mag = vec![0.0; w * h];

    for y in 0..h {
        let ym1 = y.saturating_sub(1);
        let yp1 = (y + 1).min(h - 1);
        for x in 0..w {
            let xm1 = x.saturating_sub(1);
            let xp1 = (x + 1).min(w - 1);

            let p00 = px(xm1, ym1);
            let p01 = px(x, ym1);
            let p02 = px(xp1, ym1);
            let p10 = px(xm1, y);
            let p12 = px(xp1, y);
            let p20 = px(xm1, yp1);
            let p21 = px(x, yp1);
            let p22 = px(xp1, yp1);

            let dx = (p02 + 2.0 * p12 + p22) - (p00 + 2.0 * p10 + p20);
            let dy = (p20 + 2.0 * p21 + p22) - (p00 + 2.0 * p01 + p02);

            let idx = y * w + x;
            gx[idx] = dx;
            gy[idx] = dy;
            mag[idx] = dx.abs() + dy.abs();
        }
    }

    Gradients { gx, gy, mag }
}

/// Extract a binary edge map from a binary mask.
pub fn canny(src: &BinaryImageView<'_>, params: &CannyParams) -> BinaryImage {
    let (w, h) = (src.width, src.height);
    if w == 0 || h == 0 {
        return Grid::new_fill(w, h, false);
    }

    let mut low = params.low_threshold;
    let mut high = params.high_threshold;
    if high < low {
        core::mem::swap(&mut low, &mut high);
    }

    let grad = sobel(src);
    let mag_at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0.0
        } else {
            grad.mag[y as usize * w + x as usize]
        }
    };

    // 0 = none, 1 = weak candidate, 2 = strong.
    let mut class = vec![0u8; w * h];
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let m = grad.mag[idx];
            if m <= low {
                continue;
            }

            let (xi, yi) = (x as isize, y as isize);
            let ax = grad.gx[idx].abs();
            let ay = grad.gy[idx].abs();

            let is_max = if ay < ax * TAN_22_5 {
                m > mag_at(xi - 1, yi) && m >= mag_at(xi + 1, yi)
            } else if ay > ax * TAN_67_5 {
                m > mag_at(xi, yi - 1) && m >= mag_at(xi, yi + 1)
            } else {
                let s: isize = if (grad.gx[idx] < 0.0) != (grad.gy[idx] < 0.0) {
                    -1
                } else {
                    1
                };
                m > mag_at(xi - s, yi - 1) && m > mag_at(xi + s, yi + 1)
            };
            if !is_max {
                continue;
            }

            if m > high {
                class[idx] = 2;
                stack.push(idx);
            } else {
                class[idx] = 1;
            }
        }
    }

    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % w, idx / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let nidx = ny * w + nx;
                if class[nidx] == 1 {
                    class[nidx] = 2;
                    stack.push(nidx);
                }
            }
        }
    }

    Grid {
        width: w,
        height: h,
        data: class.into_iter().map(|c| c == 2).collect(),
    }
}
