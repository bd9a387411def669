use crate::{core, detector};
use ::image::{DynamicImage, GrayImage, Rgb, RgbImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Grid(#[from] core::GridError),

    #[error(transparent)]
    Params(#[from] detector::LaneParamsError),
}

const EDGE: Rgb<u8> = Rgb([255, 255, 255]);
const LEFT: Rgb<u8> = Rgb([0, 0, 255]);
const RIGHT: Rgb<u8> = Rgb([255, 0, 0]);
const WINDOW: Rgb<u8> = Rgb([0, 255, 0]);
const CURVE: Rgb<u8> = Rgb([255, 255, 0]);

/// Convert an `image::RgbImage` into the lightweight color view type.
pub fn frame_view(img: &RgbImage) -> Result<core::ColorImageView<'_>, core::GridError> {
    core::ColorImageView::from_interleaved(img.width() as usize, img.height() as usize, img.as_raw())
}

/// Run the detector once on an RGB image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_lanes(
    img: &RgbImage,
    params: detector::LaneDetectorParams,
) -> Result<detector::LaneEstimate, DetectError> {
    let detector = detector::LaneDetector::new(params)?;
    Ok(detector.process(&frame_view(img)?))
}

/// Run the detector once on any decoded image, converting it to RGB first.
pub fn detect_lanes_dynamic(
    img: &DynamicImage,
    params: detector::LaneDetectorParams,
) -> Result<detector::LaneEstimate, DetectError> {
    match img {
        DynamicImage::ImageRgb8(rgb) => detect_lanes(rgb, params),
        other => detect_lanes(&other.to_rgb8(), params),
    }
}

/// Run the detector on a raw interleaved BGR buffer (the usual camera layout).
pub fn detect_lanes_bgr(
    width: usize,
    height: usize,
    bytes: &[u8],
    params: detector::LaneDetectorParams,
) -> Result<detector::LaneEstimate, DetectError> {
    let frame = core::ColorImage::from_bgr(width, height, bytes)?;
    let detector = detector::LaneDetector::new(params)?;
    Ok(detector.process(&frame.view()))
}

/// Run an existing detector on an RGB image, keeping every intermediate product.
pub fn detect_lanes_with_debug(
    detector: &detector::LaneDetector,
    img: &RgbImage,
) -> Result<detector::LaneDebug, DetectError> {
    Ok(detector.process_with_debug(&frame_view(img)?))
}

/// Render a binary map as a black/white image.
///
/// Returns `None` if the map's buffer does not match its dimensions.
pub fn binary_to_gray_image(map: &core::BinaryImage) -> Option<GrayImage> {
    GrayImage::from_raw(map.width as u32, map.height as u32, map.to_gray().data)
}

/// Bird's-eye view of the detection: edges in white, left pixels in blue,
/// right pixels in red, search windows in green and fitted curves in yellow.
pub fn render_debug_view(
    debug: &detector::LaneDebug,
    window: &detector::SlidingWindowParams,
) -> RgbImage {
    let warped = &debug.estimate.warped;
    let (w, h) = (warped.width as u32, warped.height as u32);
    let mut out = RgbImage::from_fn(w, h, |x, y| {
        if warped.data[y as usize * warped.width + x as usize] {
            EDGE
        } else {
            Rgb([0, 0, 0])
        }
    });

    for (pixels, color) in [
        (&debug.search.pixels.left, LEFT),
        (&debug.search.pixels.right, RIGHT),
    ] {
        for p in pixels {
            out.put_pixel(p.x, p.y, color);
        }
    }

    let margin = window.margin as i64;
    for win in &debug.search.windows {
        for center in [win.left_center, win.right_center] {
            draw_rect(
                &mut out,
                center - margin,
                win.y_low as i64,
                center + margin,
                win.y_high as i64 - 1,
                WINDOW,
            );
        }
    }

    for side in [detector::LaneSide::Left, detector::LaneSide::Right] {
        let Some(fit) = debug.fit(side) else {
            continue;
        };
        for y in 0..h {
            let x = fit.eval(y as f64).round();
            if x >= 0.0 && x < w as f64 {
                out.put_pixel(x as u32, y, CURVE);
            }
        }
    }

    out
}

// Outline clipped to the image.
fn draw_rect(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let mut put = |x: i64, y: i64| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            img.put_pixel(x as u32, y as u32, color);
        }
    };
    for x in x0..=x1 {
        put(x, y0);
        put(x, y1);
    }
    for y in y0..=y1 {
        put(x0, y);
        put(x1, y);
    }
}
