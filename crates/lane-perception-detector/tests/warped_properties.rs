use approx::assert_abs_diff_eq;
use lane_perception_core::{BinaryImage, Grid};
use lane_perception_detector::{
    fit, search, LaneDetector, LaneDetectorParams, LaneStatus, SlidingWindowParams,
};

const W: usize = 1280;
const H: usize = 720;

fn detector() -> LaneDetector {
    LaneDetector::new(LaneDetectorParams::default()).expect("default params")
}

fn blank() -> BinaryImage {
    Grid::new_fill(W, H, false)
}

fn paint(img: &mut BinaryImage, x: usize, y: usize) {
    img.data[y * img.width + x] = true;
}

fn vertical_lines(cols: &[usize]) -> BinaryImage {
    let mut img = blank();
    for &x in cols {
        for y in 0..H {
            paint(&mut img, x, y);
        }
    }
    img
}

// Boundaries following x = c + y / 4, one pixel every fourth row so the
// samples lie exactly on the line.
fn slanted_lines(cs: &[usize]) -> BinaryImage {
    let mut img = blank();
    for &c in cs {
        for y in (0..H).step_by(4) {
            paint(&mut img, c + y / 4, y);
        }
    }
    img
}

#[test]
fn vertical_boundaries_fit_constant_curves() {
    let res = search(&vertical_lines(&[320, 960]).view(), &SlidingWindowParams::default());
    let (left, right) = fit(&res.pixels);
    let (left, right) = (left.expect("left fit"), right.expect("right fit"));

    assert_abs_diff_eq!(left.a, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(left.b, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(left.c, 320.0, epsilon = 1e-5);
    assert_abs_diff_eq!(right.c, 960.0, epsilon = 1e-5);
}

#[test]
fn centered_vertical_boundaries_report_zero_offset_and_heading() {
    let est = detector().estimate_from_warped(vertical_lines(&[320, 960]));
    assert_eq!(est.status, LaneStatus::Detected);
    assert_abs_diff_eq!(est.offset_m, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(est.heading_deg, 0.0, epsilon = 1e-6);
}

#[test]
fn offset_scales_linearly_with_shift() {
    let d = detector();
    let xm = d.params().scale.xm_per_pix;
    let base = d.estimate_from_warped(vertical_lines(&[300, 900]));
    let shifted = d.estimate_from_warped(vertical_lines(&[340, 940]));

    assert_abs_diff_eq!(base.offset_m, -40.0 * xm, epsilon = 1e-6);
    assert_abs_diff_eq!(shifted.offset_m - base.offset_m, 40.0 * xm, epsilon = 1e-6);
}

#[test]
fn heading_depends_on_slope_not_position() {
    let d = detector();
    let expected = 0.25_f64.atan().to_degrees();

    let a = d.estimate_from_warped(slanted_lines(&[200, 800]));
    let b = d.estimate_from_warped(slanted_lines(&[300, 900]));

    assert!(a.is_confident() && b.is_confident());
    assert_abs_diff_eq!(a.heading_deg, expected, epsilon = 1e-6);
    assert_abs_diff_eq!(b.heading_deg, expected, epsilon = 1e-6);
    assert!((a.offset_m - b.offset_m).abs() > 0.1);
}

#[test]
fn single_boundary_returns_fallback() {
    let est = detector().estimate_from_warped(vertical_lines(&[300]));
    assert_eq!((est.offset_m, est.heading_deg), (0.0, 0.0));
    assert_eq!(
        est.status,
        LaneStatus::InsufficientFitData {
            left_missing: false,
            right_missing: true,
        }
    );
    // The warped map is handed back untouched.
    assert_eq!(est.warped.count_set(), H);
}

#[test]
fn empty_map_returns_fallback_for_both_sides() {
    let est = detector().estimate_from_warped(blank());
    assert_eq!((est.offset_m, est.heading_deg), (0.0, 0.0));
    assert_eq!(
        est.status,
        LaneStatus::InsufficientFitData {
            left_missing: true,
            right_missing: true,
        }
    );
}

#[test]
fn window_follows_a_drifting_boundary() {
    // Left boundary drifts right by 30 px per band; a fixed window would
    // lose it after four bands.
    let mut img = blank();
    let band = H / 9;
    for y in 0..H {
        let k = (H - 1 - y) / band;
        paint(&mut img, 150 + 30 * k, y);
    }
    let res = search(&img.view(), &SlidingWindowParams::default());
    assert_eq!(res.pixels.left.len(), H);
    let centers: Vec<i64> = res.windows.iter().map(|w| w.left_center).collect();
    assert_eq!(centers, vec![150, 150, 180, 210, 240, 270, 300, 330, 360]);
}

#[test]
fn detector_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LaneDetector>();

    let d = detector();
    let maps = [vertical_lines(&[300, 900]), vertical_lines(&[340, 940])];
    let offsets: Vec<f64> = std::thread::scope(|s| {
        let d = &d;
        let handles: Vec<_> = maps
            .iter()
            .map(|m| s.spawn(move || d.estimate_from_warped(m.clone()).offset_m))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker"))
            .collect()
    });
    assert_eq!(offsets[0], d.estimate_from_warped(maps[0].clone()).offset_m);
    assert_eq!(offsets[1], d.estimate_from_warped(maps[1].clone()).offset_m);
}
