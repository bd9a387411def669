//! Bird's-eye rectification of edge maps.

use crate::detector::RectifyParams;
use lane_perception_core::{
    homography_from_4pt, warp_perspective_binary, BinaryImage, BinaryImageView, Homography,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RectifyError {
    #[error("cannot rectify an empty {width}x{height} frame")]
    EmptyFrame { width: usize, height: usize },
    #[error("perspective transform is not solvable for a {width}x{height} frame")]
    Unsolvable { width: usize, height: usize },
}

/// Both directions of the frame <-> bird's-eye mapping for one frame size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveRectifier {
    pub width: usize,
    pub height: usize,
    pub h_warped_from_frame: Homography,
    pub h_frame_from_warped: Homography,
}

impl PerspectiveRectifier {
    pub fn for_frame(
        params: &RectifyParams,
        width: usize,
        height: usize,
    ) -> Result<Self, RectifyError> {
        if width == 0 || height == 0 {
            return Err(RectifyError::EmptyFrame { width, height });
        }
        let (src, dst) = params.frame_points(width, height);
        let unsolvable = RectifyError::Unsolvable { width, height };
        let h_warped_from_frame = homography_from_4pt(&src, &dst).ok_or(unsolvable.clone())?;
        let h_frame_from_warped = homography_from_4pt(&dst, &src).ok_or(unsolvable)?;
        Ok(Self {
            width,
            height,
            h_warped_from_frame,
            h_frame_from_warped,
        })
    }

    /// Resample `edges` into the bird's-eye view (same size as the frame).
    pub fn warp(&self, edges: &BinaryImageView<'_>) -> BinaryImage {
        warp_perspective_binary(edges, &self.h_frame_from_warped, self.width, self.height)
    }
}

/// Edge map in bird's-eye space plus the mapping back into the frame.
#[derive(Clone, Debug)]
pub struct Rectified {
    pub warped: BinaryImage,
    pub h_frame_from_warped: Homography,
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(edges, params), fields(width = edges.width, height = edges.height))
)]
pub fn rectify(
    edges: &BinaryImageView<'_>,
    params: &RectifyParams,
) -> Result<Rectified, RectifyError> {
    let rectifier = PerspectiveRectifier::for_frame(params, edges.width, edges.height)?;
    let warped = rectifier.warp(edges);
    log::debug!(
        "rectify: {} -> {} set pixels",
        edges.data.iter().filter(|&&v| v).count(),
        warped.count_set()
    );
    Ok(Rectified {
        warped,
        h_frame_from_warped: rectifier.h_frame_from_warped,
    })
}
