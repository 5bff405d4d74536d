//! The 8×8 grid of squares derived from one board→image transform.

use crate::coords::{BoardCoordinate, BOARD_SIZE, CELL_COUNT};
use crate::notation::{algebraic_squares, AlgebraicSquare};
use crate::square::{Square, SquareFeatureParams};
use chessvision_core::{GrayImage, Homography};
use std::fmt;
use std::ops::Index;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Grid construction failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SquareConstructionError {
    #[error("square {square} maps to a degenerate image polygon")]
    DegeneratePolygon { square: AlgebraicSquare },
    #[error("squares {existing} and {incoming} both derive cell {coordinate}")]
    Collision {
        coordinate: BoardCoordinate,
        existing: AlgebraicSquare,
        incoming: AlgebraicSquare,
    },
    #[error("no square was derived for cell {coordinate}")]
    MissingCell { coordinate: BoardCoordinate },
    #[error("invalid square feature parameters: {0}")]
    InvalidFeatureParams(&'static str),
}

/// Fully populated 8×8 grid; `grid[c].coordinate() == c` for every cell.
///
/// Geometry is fixed at construction. Per-square occlusion labels are kept
/// elsewhere (see [`crate::OcclusionMap`]).
#[derive(Clone, Debug)]
pub struct SquareGrid {
    // row-major, len = CELL_COUNT
    cells: Vec<Square>,
}

impl SquareGrid {
    /// Build the grid from the canonical label enumeration.
    pub fn build(
        image: &GrayImage,
        transform: &Homography,
        params: &SquareFeatureParams,
    ) -> Result<Self, SquareConstructionError> {
        Self::from_labels(image, transform, algebraic_squares(), params)
    }

    /// Build the grid from an explicit label enumeration.
    ///
    /// Each square is placed at the cell derived from its own label. Two
    /// labels deriving the same cell, or a cell left empty, fail the build.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(patch_px = params.patch_px))
    )]
    pub fn from_labels(
        image: &GrayImage,
        transform: &Homography,
        labels: impl IntoIterator<Item = AlgebraicSquare>,
        params: &SquareFeatureParams,
    ) -> Result<Self, SquareConstructionError> {
        params.validate()?;

        let mut slots: Vec<Option<Square>> = vec![None; CELL_COUNT];
        for label in labels {
            let square = Square::create(image, transform, label, params)?;
            let coordinate = square.coordinate();
            let slot = &mut slots[coordinate.index()];
            if let Some(existing) = slot {
                return Err(SquareConstructionError::Collision {
                    coordinate,
                    existing: existing.algebraic(),
                    incoming: label,
                });
            }
            *slot = Some(square);
        }

        let cells = BoardCoordinate::all()
            .zip(slots)
            .map(|(coordinate, slot)| {
                slot.ok_or(SquareConstructionError::MissingCell { coordinate })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("built square grid ({} cells)", cells.len());
        Ok(Self { cells })
    }

    #[inline]
    pub fn get(&self, coordinate: BoardCoordinate) -> &Square {
        &self.cells[coordinate.index()]
    }

    /// Squares in row-major order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Square> + '_ {
        self.cells.iter()
    }

    /// Squares of one row, left to right.
    pub fn row(&self, row: usize) -> Option<&[Square]> {
        (row < BOARD_SIZE).then(|| &self.cells[row * BOARD_SIZE..(row + 1) * BOARD_SIZE])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Index<BoardCoordinate> for SquareGrid {
    type Output = Square;

    fn index(&self, coordinate: BoardCoordinate) -> &Square {
        self.get(coordinate)
    }
}

impl fmt::Display for SquareGrid {
    /// One line of algebraic names per row, top row first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(BOARD_SIZE) {
            let names: Vec<String> = row.iter().map(|s| s.algebraic().to_string()).collect();
            writeln!(f, "{}", names.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    fn image() -> GrayImage {
        GrayImage::from_fn(200, 200, |x, y| ((x / 20 + y / 20) % 2 * 255) as u8)
    }

    fn transform() -> Homography {
        Homography::new(Matrix3::new(
            20.0, 0.0, 20.0, //
            0.0, 20.0, 20.0, //
            0.0, 0.0, 1.0,
        ))
    }

    #[test]
    fn every_cell_holds_its_own_square() {
        let grid = SquareGrid::build(&image(), &transform(), &SquareFeatureParams::default())
            .expect("grid");
        assert_eq!(grid.len(), CELL_COUNT);
        for coordinate in BoardCoordinate::all() {
            assert_eq!(grid[coordinate].coordinate(), coordinate);
        }
    }

    #[test]
    fn placement_ignores_enumeration_order() {
        let params = SquareFeatureParams::default();
        let forward = SquareGrid::build(&image(), &transform(), &params).expect("grid");
        let mut labels: Vec<_> = algebraic_squares().collect();
        labels.reverse();
        let reversed =
            SquareGrid::from_labels(&image(), &transform(), labels, &params).expect("grid");
        for (a, b) in forward.iter().zip(reversed.iter()) {
            assert_eq!(a.coordinate(), b.coordinate());
            assert_eq!(a.image_polygon(), b.image_polygon());
            assert_eq!(a.feature_vector(), b.feature_vector());
        }
    }

    #[test]
    fn duplicate_label_is_a_collision() {
        let mut labels: Vec<_> = algebraic_squares().collect();
        labels[5] = labels[4];
        let err = SquareGrid::from_labels(
            &image(),
            &transform(),
            labels,
            &SquareFeatureParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SquareConstructionError::Collision { .. }));
    }

    #[test]
    fn short_enumeration_leaves_missing_cell() {
        let labels: Vec<_> = algebraic_squares().skip(1).collect();
        let err = SquareGrid::from_labels(
            &image(),
            &transform(),
            labels,
            &SquareFeatureParams::default(),
        )
        .unwrap_err();
        // The first canonical label is a1 = (7, 0).
        assert_eq!(
            err,
            SquareConstructionError::MissingCell {
                coordinate: BoardCoordinate::new(7, 0).unwrap()
            }
        );
    }

    #[test]
    fn display_lists_rows_top_down() {
        let grid = SquareGrid::build(&image(), &transform(), &SquareFeatureParams::default())
            .expect("grid");
        let text = grid.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), BOARD_SIZE);
        assert_eq!(lines[0], "a8 b8 c8 d8 e8 f8 g8 h8");
        assert_eq!(lines[7], "a1 b1 c1 d1 e1 f1 g1 h1");
    }
}
