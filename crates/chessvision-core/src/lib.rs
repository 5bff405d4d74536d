//! Geometry and image primitives for mapping a photographed chessboard.
//!
//! This crate is intentionally small and purely geometric: a board-to-image
//! [`Homography`] with its DLT estimator, a grayscale raster type with
//! bilinear sampling, and the workspace logger. It knows nothing about chess
//! squares or occlusion labels; those live in `chessvision-board`.

mod homography;
mod image;
mod logger;

pub use homography::{
    estimate_homography, homography_from_4pt, warp_perspective_gray, Homography, HomographyError,
};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, ImageError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity, tracing_directive};
