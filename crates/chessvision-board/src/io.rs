//! JSON persistence, configuration and dataset reports.

use crate::board::{Board, BoardSource, OcclusionSamples};
use crate::coords::BoardCoordinate;
use crate::correspondence::{Descriptor, PointCorrespondenceSet};
use crate::error::BoardError;
use crate::estimator::{DltEstimator, HomographyEstimator};
use crate::notation::AlgebraicSquare;
use crate::occlusion::{OcclusionGrid, OcclusionLabel};
use crate::square::SquareFeatureParams;
use chessvision_core::GrayImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum BoardIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Durable state of a board. The transform and the grid are not stored;
/// they are recomputed from the points on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedBoard {
    pub name: String,
    pub image: GrayImage,
    pub board_points: Vec<Point2<f32>>,
    pub image_points: Vec<Point2<f32>>,
    pub descriptors: Vec<Descriptor>,
}

impl SavedBoard {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, BoardIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), BoardIoError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Board {
    /// Write the board's durable state to `path`.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), BoardIoError> {
        let path = path.as_ref();
        self.to_saved()?.write_json(path)?;
        log::debug!("saved board {:?} to {}", self.name(), path.display());
        Ok(())
    }

    /// Restore a board saved with [`Board::save_json`], using the DLT
    /// estimator and default square features.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, BoardIoError> {
        Self::load_json_with(path, &DltEstimator, &SquareFeatureParams::default())
    }

    /// Restore a saved board with an explicit estimator and feature
    /// parameters. Feature parameters are not part of the saved record.
    pub fn load_json_with(
        path: impl AsRef<Path>,
        estimator: &dyn HomographyEstimator,
        params: &SquareFeatureParams,
    ) -> Result<Self, BoardIoError> {
        let path = path.as_ref();
        let saved = SavedBoard::load_json(path)?;
        log::debug!("loading board {:?} from {}", saved.name, path.display());
        Ok(Board::with_options(
            BoardSource::FromSaved(saved),
            estimator,
            params,
        )?)
    }

    /// Read an occlusion annotation file and label every square from it.
    pub fn add_occlusions_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), BoardIoError> {
        let grid = OcclusionGrid::from_file(path)?;
        self.add_occlusions(&grid);
        Ok(())
    }
}

/// Configuration for building a board from an image and hand-picked points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardCreateConfig {
    pub image_path: String,
    #[serde(default)]
    pub name: Option<String>,
    pub board_points: Vec<Point2<f32>>,
    pub image_points: Vec<Point2<f32>>,
    #[serde(default)]
    pub descriptors: Option<Vec<Descriptor>>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub features: SquareFeatureParams,
}

impl BoardCreateConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, BoardIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), BoardIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the saved-board path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("board.json"))
    }

    /// Validated correspondences; descriptors default to empty ones.
    pub fn correspondences(&self) -> Result<PointCorrespondenceSet, BoardError> {
        let board = self.board_points.clone();
        let image = self.image_points.clone();
        match &self.descriptors {
            Some(d) => PointCorrespondenceSet::new(board, image, d.clone()),
            None => PointCorrespondenceSet::without_descriptors(board, image),
        }
    }

    /// Assemble the construction source around an already decoded image.
    pub fn board_source(&self, image: GrayImage) -> Result<BoardSource, BoardError> {
        Ok(BoardSource::FromPoints {
            name: self.name.clone(),
            image,
            correspondences: self.correspondences()?,
        })
    }
}

/// One row per square: where it is, what it looks like, how it is labeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcclusionDatasetReport {
    pub board_name: String,
    pub feature_len: usize,
    pub coordinates: Vec<BoardCoordinate>,
    pub squares: Vec<AlgebraicSquare>,
    pub labels: Vec<OcclusionLabel>,
    pub features: Vec<Vec<f32>>,
}

impl OcclusionDatasetReport {
    pub fn new(board_name: impl Into<String>, samples: &OcclusionSamples) -> Self {
        let features: Vec<Vec<f32>> = samples
            .features
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        Self {
            board_name: board_name.into(),
            feature_len: samples.features.ncols(),
            coordinates: samples.coordinates.clone(),
            squares: samples
                .coordinates
                .iter()
                .map(|&c| AlgebraicSquare::from_coordinate(c))
                .collect(),
            labels: samples.labels.clone(),
            features,
        }
    }

    /// Collect the samples of a fully labeled board.
    pub fn from_board(board: &Board) -> Result<Self, BoardError> {
        Ok(Self::new(board.name(), &board.occlusion_samples()?))
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, BoardIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), BoardIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
