//! Projective transforms between the board plane and the image plane.

use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{DMatrix, Matrix2, Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smallest-to-largest spread ratio below which a point cloud counts as collinear.
const COLLINEAR_RATIO: f64 = 1e-8;
/// Relative determinant below which an estimated homography counts as singular.
const SINGULAR_RATIO: f64 = 1e-12;

/// Errors from homography estimation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HomographyError {
    #[error("point sequences differ in length ({src} source vs {dst} destination)")]
    LengthMismatch { src: usize, dst: usize },
    #[error("too few correspondences: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("degenerate point configuration ({which} points are collinear or coincident)")]
    DegenerateConfiguration { which: &'static str },
    #[error("numerical failure: {0}")]
    NumericalFailure(&'static str),
}

/// A 3×3 projective map `p_dst ~ H * p_src`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Map a point. Points on the line at infinity come back non-finite.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    /// `self ∘ inner`: first apply `inner`, then `self`.
    #[inline]
    pub fn compose(&self, inner: &Homography) -> Homography {
        Homography::new(self.h * inner.h)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    pub fn is_finite(&self) -> bool {
        self.h.iter().all(|v| v.is_finite())
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

fn centroid(pts: &[Point2<f32>]) -> (f64, f64) {
    let n = pts.len() as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    (sx / n, sy / n)
}

fn normalize_points(pts: &[Point2<f32>]) -> (Vec<Point2<f64>>, Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance = sqrt(2)
    let (cx, cy) = centroid(pts);
    let mean_dist = pts
        .iter()
        .map(|p| {
            let dx = p.x as f64 - cx;
            let dy = p.y as f64 - cy;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f64>()
        / pts.len() as f64;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts
        .iter()
        .map(|p| {
            let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
            Point2::new(v[0], v[1])
        })
        .collect();
    (out, t)
}

/// True when the points span (numerically) less than a 2D region.
fn is_collinear(pts: &[Point2<f32>]) -> bool {
    let (cx, cy) = centroid(pts);
    let mut cov = Matrix2::<f64>::zeros();
    for p in pts {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        cov[(0, 0)] += dx * dx;
        cov[(0, 1)] += dx * dy;
        cov[(1, 1)] += dy * dy;
    }
    cov[(1, 0)] = cov[(0, 1)];

    let eig = cov.symmetric_eigenvalues();
    let (lo, hi) = (eig[0].min(eig[1]), eig[0].max(eig[1]));
    hi <= f64::EPSILON || lo / hi < COLLINEAR_RATIO
}

fn check_configuration(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Result<(), HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    if src.len() < 4 {
        return Err(HomographyError::TooFewPoints {
            needed: 4,
            got: src.len(),
        });
    }
    if src.iter().chain(dst).any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(HomographyError::NumericalFailure("non-finite input point"));
    }
    if is_collinear(src) {
        return Err(HomographyError::DegenerateConfiguration { which: "source" });
    }
    if is_collinear(dst) {
        return Err(HomographyError::DegenerateConfiguration {
            which: "destination",
        });
    }
    Ok(())
}

fn normalize_homography(h: Matrix3<f64>) -> Result<Matrix3<f64>, HomographyError> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return Err(HomographyError::NumericalFailure("h33 vanishes"));
    }
    Ok(h / s)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Result<Matrix3<f64>, HomographyError> {
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(HomographyError::NumericalFailure("normalization not invertible"))?;
    Ok(t_dst_inv * hn * t_src)
}

fn finish(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Result<Homography, HomographyError> {
    let h = normalize_homography(denormalize_homography(hn, t_src, t_dst)?)?;
    let h = Homography::new(h);
    if !h.is_finite() {
        return Err(HomographyError::NumericalFailure("non-finite homography"));
    }
    let scale = h.h.norm();
    if h.h.determinant().abs() <= SINGULAR_RATIO * scale * scale * scale {
        return Err(HomographyError::DegenerateConfiguration {
            which: "estimated (singular homography)",
        });
    }
    Ok(h)
}

/// Estimate H such that `dst ~ H * src` from at least four correspondences.
///
/// Exactly four points use the minimal solver; more use the normalized DLT.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, dst), fields(points = src.len()))
)]
pub fn estimate_homography(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
) -> Result<Homography, HomographyError> {
    check_configuration(src, dst)?;

    if src.len() == 4 {
        let s: &[Point2<f32>; 4] = src
            .try_into()
            .map_err(|_| HomographyError::NumericalFailure("4-point slice"))?;
        let d: &[Point2<f32>; 4] = dst
            .try_into()
            .map_err(|_| HomographyError::NumericalFailure("4-point slice"))?;
        return homography_from_4pt(s, d);
    }

    let (r, tr) = normalize_points(src);
    let (i, ti) = normalize_points(dst);

    // Build A (2N x 9)
    let n = src.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 9);

    for k in 0..n {
        let x = r[k].x;
        let y = r[k].y;
        let u = i[k].x;
        let v = i[k].y;

        // [ -x -y -1   0  0  0   u*x u*y u ]
        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        // [ 0  0  0  -x -y -1   v*x v*y v ]
        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    // Ah = 0: h is the right singular vector of the smallest singular value.
    let svd = a.svd(false, true);
    let vt = svd
        .v_t
        .ok_or(HomographyError::NumericalFailure("SVD did not produce V^T"))?;
    let (min_idx, _) = svd.singular_values.argmin();
    let h = vt.row(min_idx);

    let hn =
        Matrix3::<f64>::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);

    // Denormalize: H = Ti^{-1} * Hn * Tr
    let out = finish(hn, tr, ti)?;
    log::debug!("estimated homography from {n} correspondences");
    Ok(out)
}

/// Compute H such that `dst ~ H * src` from exactly four correspondences.
///
/// Corner order must be consistent between `src` and `dst`.
pub fn homography_from_4pt(
    src: &[Point2<f32>; 4],
    dst: &[Point2<f32>; 4],
) -> Result<Homography, HomographyError> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points(src);
    let (dst_n, t_dst) = normalize_points(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

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

    let x = a
        .lu()
        .solve(&b)
        .ok_or(HomographyError::DegenerateConfiguration {
            which: "four-point (singular system)",
        })?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    finish(hn, t_src, t_dst)
}

/// Warp into a rectified raster: for each output pixel, map to the source via
/// `h_img_from_rect` and sample bilinearly.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_img_from_rect: &Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    GrayImage::from_fn(out_w, out_h, |x, y| {
        // sample at pixel center
        let pr = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
        let pi = h_img_from_rect.apply(pr);
        sample_bilinear_u8(src, pi.x, pi.y)
    })
}
