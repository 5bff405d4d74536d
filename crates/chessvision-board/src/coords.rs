//! Integer cell coordinates in the board frame.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Squares per board side.
pub const BOARD_SIZE: usize = 8;
/// Squares per board.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Raised when raw integers do not name a board cell.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("board coordinate ({row}, {col}) is outside [0, 8) x [0, 8)")]
pub struct CoordinateOutOfRange {
    pub row: i32,
    pub col: i32,
}

/// One of the 64 cells, `(row, col)` with both components in `[0, 8)`.
///
/// In the continuous board frame the cell occupies `x ∈ [col, col + 1]`,
/// `y ∈ [row, row + 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[i32; 2]", into = "[i32; 2]")]
pub struct BoardCoordinate {
    row: u8,
    col: u8,
}

impl BoardCoordinate {
    /// Validate raw integers.
    pub fn new(row: i32, col: i32) -> Result<Self, CoordinateOutOfRange> {
        let range = 0..BOARD_SIZE as i32;
        if !range.contains(&row) || !range.contains(&col) {
            return Err(CoordinateOutOfRange { row, col });
        }
        Ok(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    /// Caller guarantees both components are below [`BOARD_SIZE`].
    #[inline]
    pub(crate) const fn from_valid(row: u8, col: u8) -> Self {
        debug_assert!((row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE);
        Self { row, col }
    }

    /// Cell at a row-major index in `[0, 64)`.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < CELL_COUNT).then(|| Self {
            row: (index / BOARD_SIZE) as u8,
            col: (index % BOARD_SIZE) as u8,
        })
    }

    #[inline]
    pub fn row(self) -> usize {
        self.row as usize
    }

    #[inline]
    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Row-major index in `[0, 64)`.
    #[inline]
    pub fn index(self) -> usize {
        self.row() * BOARD_SIZE + self.col()
    }

    /// All 64 cells in row-major order.
    pub fn all() -> impl Iterator<Item = BoardCoordinate> {
        (0..CELL_COUNT).filter_map(Self::from_index)
    }

    /// Board-frame corners of this cell in TL, TR, BR, BL order.
    pub fn corners(self) -> [Point2<f32>; 4] {
        let x = self.col as f32;
        let y = self.row as f32;
        [
            Point2::new(x, y),
            Point2::new(x + 1.0, y),
            Point2::new(x + 1.0, y + 1.0),
            Point2::new(x, y + 1.0),
        ]
    }
}

impl TryFrom<[i32; 2]> for BoardCoordinate {
    type Error = CoordinateOutOfRange;

    fn try_from([row, col]: [i32; 2]) -> Result<Self, Self::Error> {
        Self::new(row, col)
    }
}

impl From<BoardCoordinate> for [i32; 2] {
    fn from(c: BoardCoordinate) -> Self {
        [c.row as i32, c.col as i32]
    }
}

impl fmt::Display for BoardCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            BoardCoordinate::new(8, 0),
            Err(CoordinateOutOfRange { row: 8, col: 0 })
        );
        assert!(BoardCoordinate::new(0, -1).is_err());
        assert!(BoardCoordinate::new(7, 7).is_ok());
    }

    #[test]
    fn index_is_row_major() {
        let cells: Vec<_> = BoardCoordinate::all().collect();
        assert_eq!(cells.len(), CELL_COUNT);
        for (k, c) in cells.iter().enumerate() {
            assert_eq!(c.index(), k);
        }
        assert_eq!(cells[9], BoardCoordinate::new(1, 1).unwrap());
    }

    #[test]
    fn corners_span_unit_cell() {
        let c = BoardCoordinate::new(2, 5).unwrap();
        let [tl, tr, br, bl] = c.corners();
        assert_eq!(tl, Point2::new(5.0, 2.0));
        assert_eq!(tr, Point2::new(6.0, 2.0));
        assert_eq!(br, Point2::new(6.0, 3.0));
        assert_eq!(bl, Point2::new(5.0, 3.0));
    }

    #[test]
    fn serializes_as_pair() {
        let c = BoardCoordinate::new(3, 4).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "[3,4]");
        assert!(serde_json::from_str::<BoardCoordinate>("[9,0]").is_err());
    }
}
