use crate::coords::{BoardCoordinate, CoordinateOutOfRange};
use crate::grid::SquareConstructionError;
use crate::notation::{AlgebraicSquare, InvalidAlgebraic};
use chessvision_core::{HomographyError, ImageError};

/// Errors returned while building or querying a [`crate::Board`].
#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error(
        "missing construction arguments: supply a saved board, a full point-correspondence set, \
         or an image together with a transform"
    )]
    MissingConstructionArguments,
    #[error(
        "correspondence sequences differ in length (board_points={board_points}, \
         image_points={image_points}, descriptors={descriptors})"
    )]
    InvalidCorrespondence {
        board_points: usize,
        image_points: usize,
        descriptors: usize,
    },
    #[error("board-image homography estimation failed: {0}")]
    Estimation(#[from] HomographyError),
    #[error(transparent)]
    SquareConstruction(#[from] SquareConstructionError),
    #[error("occlusion grid must be 8x8, got {rows} rows (first bad row: {bad_row:?})")]
    OcclusionShape {
        rows: usize,
        /// `(row index, token count)` of the first row without exactly 8 labels.
        bad_row: Option<(usize, usize)>,
    },
    #[error("square {square} at {coordinate} has no occlusion label")]
    UnlabeledSquare {
        coordinate: BoardCoordinate,
        square: AlgebraicSquare,
    },
    #[error("cannot serialize board {name:?}: {reason}")]
    Serialization { name: String, reason: &'static str },
    #[error(transparent)]
    InvalidImage(#[from] ImageError),
    #[error(transparent)]
    InvalidLabel(#[from] InvalidAlgebraic),
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateOutOfRange),
}
