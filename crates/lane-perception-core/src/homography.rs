use crate::image::{
    sample_bilinear, BinaryImage, BinaryImageView, GrayImage, GrayImageView, Grid, GridView,
    Intensity,
};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Projective transform of the plane, `dst ~ H * src`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self {
            h: Matrix3::identity(),
        }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    /// Map a point, returning `None` when it lands on the line at infinity.
    #[inline]
    pub fn try_apply(&self, p: Point2<f32>) -> Option<Point2<f32>> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        if v[2].abs() < 1e-12 {
            return None;
        }
        Some(Point2::new((v[0] / v[2]) as f32, (v[1] / v[2]) as f32))
    }

    pub fn inverse(&self) -> Option<Self> {
        let inv = self.h.try_inverse()?;
        normalize_homography(inv).map(Self::new)
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

// Translate to centroid, scale so mean distance = sqrt(2).
fn normalize_quad(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let (cx, cy) = pts.iter().fold((0.0_f64, 0.0_f64), |(sx, sy), p| {
        (sx + p.x as f64, sy + p.y as f64)
    });
    let (cx, cy) = (cx / 4.0, cy / 4.0);

    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / 4.0;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(h / s)
}

/// Compute H such that `dst ~ H * src` from exactly four correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when three of the points are collinear on either side.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    if quad_is_degenerate(src) || quad_is_degenerate(dst) {
        return None;
    }

    let (src_n, t_src) = normalize_quad(src);
    let (dst_n, t_dst) = normalize_quad(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    // H = T_dst^{-1} * Hn * T_src
    let h = t_dst.try_inverse()? * hn * t_src;
    normalize_homography(h).map(Homography::new)
}

// Any three of the four points (nearly) collinear.
fn quad_is_degenerate(pts: &[Point2<f32>; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    let scale = pts
        .iter()
        .flat_map(|p| [p.x.abs() as f64, p.y.abs() as f64])
        .fold(1.0_f64, f64::max);
    TRIPLES.iter().any(|&[i, j, k]| {
        let (a, b, c) = (pts[i], pts[j], pts[k]);
        let cross = (b.x as f64 - a.x as f64) * (c.y as f64 - a.y as f64)
            - (b.y as f64 - a.y as f64) * (c.x as f64 - a.x as f64);
        cross.abs() <= 1e-9 * scale * scale
    })
}

fn warp_with<T: Intensity, U>(
    src: &GridView<'_, T>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
    mut convert: impl FnMut(f32) -> U,
) -> Grid<U> {
    let mut data = Vec::with_capacity(out_w * out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let v = match h_src_from_dst.try_apply(Point2::new(x as f32, y as f32)) {
                Some(p) => sample_bilinear(src, p.x, p.y),
                None => 0.0,
            };
            data.push(convert(v));
        }
    }
    Grid {
        width: out_w,
        height: out_h,
        data,
    }
}

/// Inverse-map warp: each destination pixel is mapped into `src` through
/// `h_src_from_dst` and sampled bilinearly (zero outside `src`).
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    warp_with(src, h_src_from_dst, out_w, out_h, |v| {
        v.round().clamp(0.0, 255.0) as u8
    })
}

/// Binary variant of [`warp_perspective_gray`].
///
/// A destination pixel is set when its interpolated 0/255 intensity would
/// round to a nonzero 8-bit value.
pub fn warp_perspective_binary(
    src: &BinaryImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
) -> BinaryImage {
    warp_with(src, h_src_from_dst, out_w, out_h, |v| v >= 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    fn trapezoid(w: f32, h: f32) -> ([Point2<f32>; 4], [Point2<f32>; 4]) {
        let src = [
            Point2::new(0.45 * w, 0.65 * h),
            Point2::new(0.55 * w, 0.65 * h),
            Point2::new(0.10 * w, h),
            Point2::new(0.90 * w, h),
        ];
        let dst = [
            Point2::new(0.2 * w, 0.0),
            Point2::new(0.8 * w, 0.0),
            Point2::new(0.2 * w, h),
            Point2::new(0.8 * w, h),
        ];
        (src, dst)
    }

    #[test]
    fn four_points_map_onto_their_targets() {
        let (src, dst) = trapezoid(1280.0, 720.0);
        let h = homography_from_4pt(&src, &dst).expect("solvable");
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(h.apply(*s), *d, 1e-2);
        }
    }

    #[test]
    fn inverse_round_trips_points() {
        let (src, dst) = trapezoid(640.0, 480.0);
        let h = homography_from_4pt(&src, &dst).expect("solvable");
        let inv = h.inverse().expect("invertible");
        let direct = homography_from_4pt(&dst, &src).expect("solvable");

        for p in [
            Point2::new(320.0_f32, 470.0),
            Point2::new(150.0, 400.0),
            Point2::new(500.0, 330.0),
        ] {
            assert_close(inv.apply(h.apply(p)), p, 1e-2);
            assert_close(direct.apply(h.apply(p)), p, 1e-2);
        }
    }

    #[test]
    fn four_point_solve_recovers_known_h() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));
        let rect = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(180.0_f32, 0.0),
            Point2::new(180.0_f32, 130.0),
            Point2::new(0.0_f32, 130.0),
        ];
        let dst = rect.map(|p| ground_truth.apply(p));
        let recovered = homography_from_4pt(&rect, &dst).expect("recoverable");

        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply(p), ground_truth.apply(p), 1e-3);
        }
    }

    #[test]
    fn collinear_points_are_rejected() {
        let line = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 5.0),
        ];
        let square = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(homography_from_4pt(&line, &square).is_none());
        assert!(homography_from_4pt(&square, &line).is_none());
    }

    #[test]
    fn identity_warp_preserves_binary_grid() {
        let mut mask = Grid::new_fill(8, 6, false);
        for y in 0..6 {
            mask.data[y * 8 + 3] = true;
        }
        let out = warp_perspective_binary(&mask.view(), &Homography::identity(), 8, 6);
        assert_eq!(out, mask);
    }

    #[test]
    fn translation_warp_shifts_gray_content() {
        let mut img = Grid::new_fill(6, 4, 0u8);
        img.data[2 * 6 + 2] = 200;
        // dst(x, y) samples src(x - 1, y).
        let h = Homography::from_array([[1.0, 0.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let out = warp_perspective_gray(&img.view(), &h, 6, 4);
        assert_eq!(out.get(3, 2), Some(&200));
        assert_eq!(out.get(2, 2), Some(&0));
        assert_eq!(out.get(0, 0), Some(&0));
    }
}
