//! Occlusion labels: the 8×8 annotation grid and the per-board label map.

use crate::coords::{BoardCoordinate, BOARD_SIZE, CELL_COUNT};
use crate::error::BoardError;
use crate::io::BoardIoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Classification tag for one square, e.g. `clear` or `occluded`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OcclusionLabel(pub String);

impl OcclusionLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OcclusionLabel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for OcclusionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An annotation for all 64 squares, row-major (row 0 is rank 8).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcclusionGrid {
    // row-major, len = CELL_COUNT
    labels: Vec<OcclusionLabel>,
}

impl OcclusionGrid {
    /// Fails with [`BoardError::OcclusionShape`] unless `rows` is exactly 8×8.
    pub fn new(rows: Vec<Vec<OcclusionLabel>>) -> Result<Self, BoardError> {
        let bad_row = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != BOARD_SIZE)
            .map(|(i, row)| (i, row.len()));
        if rows.len() != BOARD_SIZE || bad_row.is_some() {
            return Err(BoardError::OcclusionShape {
                rows: rows.len(),
                bad_row,
            });
        }
        Ok(Self {
            labels: rows.into_iter().flatten().collect(),
        })
    }

    /// Parse whitespace-delimited tokens, one board row per line.
    ///
    /// Blank lines are skipped; the remaining lines must form an 8×8 grid.
    pub fn parse(text: &str) -> Result<Self, BoardError> {
        let rows = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split_whitespace().map(OcclusionLabel::from).collect())
            .collect();
        Self::new(rows)
    }

    /// Read and parse an occlusion annotation file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BoardIoError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::parse(&raw)?)
    }

    /// A grid with the same label everywhere.
    pub fn uniform(label: impl Into<OcclusionLabel>) -> Self {
        Self {
            labels: vec![label.into(); CELL_COUNT],
        }
    }

    #[inline]
    pub fn get(&self, coordinate: BoardCoordinate) -> &OcclusionLabel {
        &self.labels[coordinate.index()]
    }

    /// `(cell, label)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (BoardCoordinate, &OcclusionLabel)> + '_ {
        BoardCoordinate::all().zip(&self.labels)
    }
}

/// Occlusion label per cell; cells start unlabeled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcclusionMap {
    // row-major, len = CELL_COUNT
    labels: Vec<Option<OcclusionLabel>>,
}

impl Default for OcclusionMap {
    fn default() -> Self {
        Self {
            labels: vec![None; CELL_COUNT],
        }
    }
}

impl OcclusionMap {
    #[inline]
    pub fn get(&self, coordinate: BoardCoordinate) -> Option<&OcclusionLabel> {
        self.labels[coordinate.index()].as_ref()
    }

    /// Assign one cell, returning the previous label.
    pub fn set(
        &mut self,
        coordinate: BoardCoordinate,
        label: OcclusionLabel,
    ) -> Option<OcclusionLabel> {
        self.labels[coordinate.index()].replace(label)
    }

    pub fn clear(&mut self, coordinate: BoardCoordinate) -> Option<OcclusionLabel> {
        self.labels[coordinate.index()].take()
    }

    /// Copy every label of `grid` into the matching cell.
    pub fn apply(&mut self, grid: &OcclusionGrid) {
        for (coordinate, label) in grid.iter() {
            self.labels[coordinate.index()] = Some(label.clone());
        }
    }

    /// First unlabeled cell in row-major order.
    pub fn first_unlabeled(&self) -> Option<BoardCoordinate> {
        BoardCoordinate::all().find(|c| self.labels[c.index()].is_none())
    }

    pub fn labeled_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }
}
