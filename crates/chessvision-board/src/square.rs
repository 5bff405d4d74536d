//! One board square: its cell, its image-space quad and its region features.

use crate::coords::BoardCoordinate;
use crate::grid::SquareConstructionError;
use crate::notation::AlgebraicSquare;
use chessvision_core::{warp_perspective_gray, GrayImage, GrayImageView, Homography};
use nalgebra::{Matrix3, Point2};
use serde::{Deserialize, Serialize};

/// How a square's image region is turned into a feature vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareFeatureParams {
    /// Side of the square patch the cell is warped into, in pixels.
    pub patch_px: usize,
    /// Number of intensity histogram bins.
    pub histogram_bins: usize,
}

impl Default for SquareFeatureParams {
    fn default() -> Self {
        Self {
            patch_px: 16,
            histogram_bins: 8,
        }
    }
}

impl SquareFeatureParams {
    pub fn validate(&self) -> Result<(), SquareConstructionError> {
        if self.patch_px < 2 {
            return Err(SquareConstructionError::InvalidFeatureParams(
                "patch_px must be >= 2",
            ));
        }
        if self.histogram_bins == 0 || self.histogram_bins > 256 {
            return Err(SquareConstructionError::InvalidFeatureParams(
                "histogram_bins must be in 1..=256",
            ));
        }
        Ok(())
    }

    /// Length of every feature vector produced with these parameters.
    #[inline]
    pub fn feature_len(&self) -> usize {
        self.histogram_bins + 3
    }
}

/// Image-plane quadrilateral of a square, vertices in TL, TR, BR, BL order
/// (board-frame order, not necessarily clockwise in the image).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePolygon {
    pub vertices: [Point2<f32>; 4],
}

impl ImagePolygon {
    /// Vertex mean.
    pub fn centroid(&self) -> Point2<f32> {
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / 4.0, sy / 4.0)
    }

    /// Signed shoelace area.
    pub fn signed_area(&self) -> f32 {
        let v = &self.vertices;
        let mut acc = 0.0;
        for k in 0..4 {
            let a = v[k];
            let b = v[(k + 1) % 4];
            acc += a.x * b.y - b.x * a.y;
        }
        0.5 * acc
    }

    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

/// A board square derived from a transform and an image.
#[derive(Clone, Debug)]
pub struct Square {
    coordinate: BoardCoordinate,
    algebraic: AlgebraicSquare,
    polygon: ImagePolygon,
    features: Vec<f32>,
}

impl Square {
    /// Build the square named `label`; deterministic in its inputs.
    pub fn create(
        image: &GrayImage,
        transform: &Homography,
        label: AlgebraicSquare,
        params: &SquareFeatureParams,
    ) -> Result<Self, SquareConstructionError> {
        let coordinate = label.coordinate();
        if !cell_in_front(transform, coordinate) {
            return Err(SquareConstructionError::DegeneratePolygon { square: label });
        }
        let polygon = ImagePolygon {
            vertices: coordinate.corners().map(|p| transform.apply(p)),
        };
        if !polygon.is_finite() || polygon.signed_area().abs() < f32::EPSILON {
            return Err(SquareConstructionError::DegeneratePolygon { square: label });
        }

        let h_img_from_patch = transform.compose(&patch_to_board(coordinate, params.patch_px));
        let patch = warp_perspective_gray(
            &image.view(),
            &h_img_from_patch,
            params.patch_px,
            params.patch_px,
        );
        let features = patch_features(&patch.view(), params.histogram_bins);

        Ok(Self {
            coordinate,
            algebraic: label,
            polygon,
            features,
        })
    }

    #[inline]
    pub fn coordinate(&self) -> BoardCoordinate {
        self.coordinate
    }

    #[inline]
    pub fn algebraic(&self) -> AlgebraicSquare {
        self.algebraic
    }

    #[inline]
    pub fn image_polygon(&self) -> &ImagePolygon {
        &self.polygon
    }

    /// Histogram, mean, standard deviation and mean gradient magnitude of the
    /// warped patch, all scaled to roughly `[0, 1]`.
    #[inline]
    pub fn feature_vector(&self) -> &[f32] {
        &self.features
    }
}

/// Whether the projective scale `w` keeps one strict sign over the cell.
///
/// `w` is affine in the board frame, so checking the four corners covers the
/// whole cell; a sign change means the horizon crosses it.
fn cell_in_front(transform: &Homography, cell: BoardCoordinate) -> bool {
    let h = &transform.h;
    let (a, b, c) = (h[(2, 0)], h[(2, 1)], h[(2, 2)]);
    let eps = 1e-9 * (a.abs() + b.abs() + c.abs());
    let w = cell
        .corners()
        .map(|p| a * p.x as f64 + b * p.y as f64 + c);
    w.iter().all(|&w| w > eps) || w.iter().all(|&w| w < -eps)
}

/// Patch pixel `(u, v)` → board point `(col + u/p, row + v/p)`.
fn patch_to_board(cell: BoardCoordinate, patch_px: usize) -> Homography {
    let s = 1.0 / patch_px as f64;
    Homography::new(Matrix3::new(
        s,
        0.0,
        cell.col() as f64,
        0.0,
        s,
        cell.row() as f64,
        0.0,
        0.0,
        1.0,
    ))
}

fn patch_features(patch: &GrayImageView<'_>, bins: usize) -> Vec<f32> {
    let n = patch.data.len().max(1) as f32;
    let mut out = vec![0.0_f32; bins];
    for &v in patch.data {
        let bin = (v as usize * bins) / 256;
        out[bin] += 1.0 / n;
    }

    let mean = patch.data.iter().map(|&v| v as f32).sum::<f32>() / n;
    let var = patch
        .data
        .iter()
        .map(|&v| {
            let d = v as f32 - mean;
            d * d
        })
        .sum::<f32>()
        / n;

    let w = patch.width;
    let h = patch.height;
    let px = |x: usize, y: usize| patch.data[y * w + x] as f32;
    let mut grad = 0.0_f32;
    let mut count = 0usize;
    for y in 0..h.saturating_sub(1) {
        for x in 0..w.saturating_sub(1) {
            let gx = px(x + 1, y) - px(x, y);
            let gy = px(x, y + 1) - px(x, y);
            grad += (gx * gx + gy * gy).sqrt();
            count += 1;
        }
    }
    let grad = if count > 0 { grad / count as f32 } else { 0.0 };

    out.extend([mean / 255.0, var.sqrt() / 255.0, grad / 255.0]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scale(px: f64, offset: f64) -> Homography {
        Homography::new(Matrix3::new(
            px, 0.0, offset, //
            0.0, px, offset, //
            0.0, 0.0, 1.0,
        ))
    }

    #[test]
    fn polygon_follows_transform() {
        let img = GrayImage::from_fn(100, 100, |_, _| 0);
        let sq = Square::create(
            &img,
            &scale(10.0, 5.0),
            "b8".parse().unwrap(),
            &SquareFeatureParams::default(),
        )
        .unwrap();
        assert_eq!(sq.coordinate(), BoardCoordinate::new(0, 1).unwrap());
        let v = sq.image_polygon().vertices;
        assert_eq!(v[0], Point2::new(15.0, 5.0));
        assert_eq!(v[2], Point2::new(25.0, 15.0));
        assert_relative_eq!(sq.image_polygon().centroid().x, 20.0);
        assert_relative_eq!(sq.image_polygon().signed_area(), 100.0);
    }

    #[test]
    fn uniform_square_has_flat_features() {
        let img = GrayImage::from_fn(100, 100, |_, _| 255);
        let params = SquareFeatureParams::default();
        // Cell d5 = (3, 3) spans pixels 30..40, far from the border.
        let sq = Square::create(&img, &scale(10.0, 0.0), "d5".parse().unwrap(), &params).unwrap();
        let f = sq.feature_vector();
        assert_eq!(f.len(), params.feature_len());
        assert_relative_eq!(f[params.histogram_bins - 1], 1.0, epsilon = 1e-5);
        assert_relative_eq!(f[params.histogram_bins], 1.0, epsilon = 1e-5);
        assert_relative_eq!(f[params.histogram_bins + 1], 0.0, epsilon = 1e-5);
        assert_relative_eq!(f[params.histogram_bins + 2], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_transform_is_rejected() {
        let img = GrayImage::from_fn(10, 10, |_, _| 0);
        let flat = Homography::new(Matrix3::zeros());
        let err = Square::create(
            &img,
            &flat,
            "a1".parse().unwrap(),
            &SquareFeatureParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SquareConstructionError::DegeneratePolygon { .. }));
    }

    #[test]
    fn horizon_through_cell_is_rejected() {
        let img = GrayImage::from_fn(200, 200, |_, _| 128);
        // w = 1 - x / 3.46875 changes sign inside column 3.
        let h = Homography::new(Matrix3::new(
            20.0,
            0.0,
            0.0,
            0.0,
            20.0,
            0.0,
            -1.0 / 3.46875 + 1e-15,
            0.0,
            1.0,
        ));
        let params = SquareFeatureParams::default();
        let err = Square::create(&img, &h, "d4".parse().unwrap(), &params).unwrap_err();
        assert!(matches!(err, SquareConstructionError::DegeneratePolygon { .. }));
        assert!(Square::create(&img, &h, "a4".parse().unwrap(), &params).is_ok());
    }

    #[test]
    fn invalid_params_are_reported() {
        let params = SquareFeatureParams {
            patch_px: 1,
            histogram_bins: 8,
        };
        assert!(params.validate().is_err());
    }
}
