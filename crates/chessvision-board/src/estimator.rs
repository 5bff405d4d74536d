//! Seam between the board aggregate and homography fitting.

use chessvision_core::{estimate_homography, Homography, HomographyError};
use nalgebra::Point2;

/// Fits a board→image transform from point correspondences.
///
/// Implementations must be deterministic: boards are restored by re-running
/// the estimator on saved points, and the rebuilt grid is expected to match.
pub trait HomographyEstimator {
    fn estimate(
        &self,
        board_points: &[Point2<f32>],
        image_points: &[Point2<f32>],
    ) -> Result<Homography, HomographyError>;
}

/// Normalized DLT (minimal four-point solve when exactly four pairs are given).
#[derive(Clone, Copy, Debug, Default)]
pub struct DltEstimator;

impl HomographyEstimator for DltEstimator {
    fn estimate(
        &self,
        board_points: &[Point2<f32>],
        image_points: &[Point2<f32>],
    ) -> Result<Homography, HomographyError> {
        estimate_homography(board_points, image_points)
    }
}

impl<F> HomographyEstimator for F
where
    F: Fn(&[Point2<f32>], &[Point2<f32>]) -> Result<Homography, HomographyError>,
{
    fn estimate(
        &self,
        board_points: &[Point2<f32>],
        image_points: &[Point2<f32>],
    ) -> Result<Homography, HomographyError> {
        self(board_points, image_points)
    }
}
