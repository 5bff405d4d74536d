//! High-level facade crate for the `chessvision-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometry core and the board model
//! - (feature-gated) helpers that decode images with the `image` crate and
//!   build boards from JSON configs
//!
//! ## Quickstart
//!
//! ```no_run
//! use chessvision::board::{BoardCreateConfig, OcclusionDatasetReport};
//! use chessvision::image_io;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = BoardCreateConfig::load_json("frame_001.json")?;
//! let mut board = image_io::board_from_config(&cfg)?;
//! board.add_occlusions_from_file("frame_001.oc")?;
//! let report = OcclusionDatasetReport::from_board(&board)?;
//! println!("{} labeled squares", report.labels.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `chessvision::core`: homography estimation, grayscale images, logging.
//! - `chessvision::board`: squares, grid, occlusion labels, persistence.
//! - `chessvision::image_io` (feature `image`): `image::GrayImage` adapters.

pub use chessvision_board as board;
pub use chessvision_core as core;

pub use chessvision_board::{
    Board, BoardCoordinate, BoardError, BoardSource, OcclusionGrid, OcclusionLabel,
    SquareFeatureParams,
};

#[cfg(feature = "image")]
pub mod image_io;
