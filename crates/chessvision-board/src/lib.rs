//! Photographed 8×8 chessboard mapped onto its squares.
//!
//! Current focus:
//! - fitting a board-to-image homography from point correspondences,
//! - deriving the 64 squares (image polygon and region features),
//! - per-square occlusion labels and feature/label assembly for training,
//! - JSON persistence of boards, configs and dataset reports.
//!
//! Cells are addressed by [`BoardCoordinate`] (row 0 is rank 8, column 0 is
//! file `a`) and named by [`AlgebraicSquare`]. Geometry comes from
//! `chessvision-core`.

mod board;
mod coords;
mod correspondence;
mod error;
mod estimator;
mod grid;
mod io;
mod notation;
mod occlusion;
mod square;

pub use board::{Board, BoardBuilder, BoardSource, OcclusionSamples};
pub use coords::{BoardCoordinate, CoordinateOutOfRange, BOARD_SIZE, CELL_COUNT};
pub use correspondence::{Descriptor, PointCorrespondence, PointCorrespondenceSet};
pub use error::BoardError;
pub use estimator::{DltEstimator, HomographyEstimator};
pub use grid::{SquareConstructionError, SquareGrid};
pub use io::{BoardCreateConfig, BoardIoError, OcclusionDatasetReport, SavedBoard};
pub use notation::{algebraic_squares, AlgebraicSquare, InvalidAlgebraic};
pub use occlusion::{OcclusionGrid, OcclusionLabel, OcclusionMap};
pub use square::{ImagePolygon, Square, SquareFeatureParams};

pub use chessvision_core::{GrayImage, Homography, HomographyError};
