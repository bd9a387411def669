/// Errors returned when building a [`LaneDetector`](super::LaneDetector).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LaneParamsError {
    #[error("sliding-window search needs at least one window")]
    NoWindows,
    #[error("sliding-window search allows at most {max} windows (got {n_windows})")]
    TooManyWindows { n_windows: usize, max: usize },
    #[error("{name} must be finite and positive (got {value})")]
    InvalidScale { name: &'static str, value: f64 },
    #[error("canny thresholds must satisfy 0 <= low <= high (low={low}, high={high})")]
    InvalidCannyThresholds { low: f32, high: f32 },
    #[error("{name} HSV range has lower bound above upper bound")]
    InvertedHsvRange { name: &'static str },
    #[error("rectification quads are degenerate (three or more points collinear)")]
    DegenerateGeometry,
}
