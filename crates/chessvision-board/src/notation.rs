//! Algebraic square names and their bijection with board coordinates.
//!
//! Files `a..h` run along columns `0..8`. Ranks run against rows: rank 8 is
//! row 0 and rank 1 is row 7, so row-major iteration over the grid visits
//! squares in FEN order (a8, b8, ..., h1).

use crate::coords::{BoardCoordinate, BOARD_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid algebraic square {0:?} (expected a file a-h followed by a rank 1-8)")]
pub struct InvalidAlgebraic(pub String);

/// A square name such as `e4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlgebraicSquare {
    /// 0 for `a` through 7 for `h`.
    file: u8,
    /// 1 through 8.
    rank: u8,
}

impl AlgebraicSquare {
    /// `file` in `0..8`, `rank` in `1..=8`.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        ((file as usize) < BOARD_SIZE && (1..=BOARD_SIZE as u8).contains(&rank))
            .then_some(Self { file, rank })
    }

    #[inline]
    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.rank
    }

    /// The cell this square names.
    #[inline]
    pub fn coordinate(self) -> BoardCoordinate {
        BoardCoordinate::from_valid(BOARD_SIZE as u8 - self.rank, self.file)
    }

    /// Inverse of [`AlgebraicSquare::coordinate`].
    #[inline]
    pub fn from_coordinate(c: BoardCoordinate) -> Self {
        Self {
            file: c.col() as u8,
            rank: (BOARD_SIZE - c.row()) as u8,
        }
    }
}

impl From<BoardCoordinate> for AlgebraicSquare {
    fn from(c: BoardCoordinate) -> Self {
        Self::from_coordinate(c)
    }
}

impl From<AlgebraicSquare> for BoardCoordinate {
    fn from(sq: AlgebraicSquare) -> Self {
        sq.coordinate()
    }
}

impl FromStr for AlgebraicSquare {
    type Err = InvalidAlgebraic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAlgebraic(s.to_string());
        let bytes = s.trim().as_bytes();
        let [f, r] = bytes else {
            return Err(invalid());
        };
        let file = f.to_ascii_lowercase().checked_sub(b'a').ok_or_else(invalid)?;
        let rank = r.checked_sub(b'0').ok_or_else(invalid)?;
        Self::new(file, rank).ok_or_else(invalid)
    }
}

impl TryFrom<String> for AlgebraicSquare {
    type Error = InvalidAlgebraic;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AlgebraicSquare> for String {
    fn from(sq: AlgebraicSquare) -> Self {
        sq.to_string()
    }
}

impl fmt::Display for AlgebraicSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank)
    }
}

/// The canonical enumeration of all 64 squares: file-major, `a1, a2, ..., a8,
/// b1, ..., h8`.
///
/// Grid construction places squares by their derived coordinate, so this
/// order does not have to agree with the grid's row-major layout.
pub fn algebraic_squares() -> impl Iterator<Item = AlgebraicSquare> + Clone {
    (0..BOARD_SIZE as u8).flat_map(|file| {
        (1..=BOARD_SIZE as u8).map(move |rank| AlgebraicSquare { file, rank })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CELL_COUNT;
    use std::collections::HashSet;

    #[test]
    fn corner_squares_map_to_expected_cells() {
        let a8: AlgebraicSquare = "a8".parse().unwrap();
        assert_eq!(a8.coordinate(), BoardCoordinate::new(0, 0).unwrap());
        let h1: AlgebraicSquare = "h1".parse().unwrap();
        assert_eq!(h1.coordinate(), BoardCoordinate::new(7, 7).unwrap());
        let e4: AlgebraicSquare = "E4".parse().unwrap();
        assert_eq!(e4.coordinate(), BoardCoordinate::new(4, 4).unwrap());
        assert_eq!(e4.to_string(), "e4");
    }

    #[test]
    fn enumeration_is_a_bijection() {
        let squares: Vec<_> = algebraic_squares().collect();
        assert_eq!(squares.len(), CELL_COUNT);
        let cells: HashSet<_> = squares.iter().map(|s| s.coordinate()).collect();
        assert_eq!(cells.len(), CELL_COUNT);
        for sq in squares {
            assert_eq!(AlgebraicSquare::from_coordinate(sq.coordinate()), sq);
        }
    }

    #[test]
    fn enumeration_is_file_major() {
        let first: Vec<String> = algebraic_squares().take(3).map(String::from).collect();
        assert_eq!(first, ["a1", "a2", "a3"]);
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", "i1", "a0", "a9", "a10", "1a", "zz"] {
            assert!(bad.parse::<AlgebraicSquare>().is_err(), "{bad}");
        }
    }
}
