//! The board aggregate: image, transform, square grid and occlusion labels.

use crate::coords::{BoardCoordinate, CELL_COUNT};
use crate::correspondence::{Descriptor, PointCorrespondenceSet};
use crate::error::BoardError;
use crate::estimator::{DltEstimator, HomographyEstimator};
use crate::grid::SquareGrid;
use crate::io::SavedBoard;
use crate::occlusion::{OcclusionGrid, OcclusionLabel, OcclusionMap};
use crate::square::{Square, SquareFeatureParams};
use chessvision_core::{GrayImage, Homography};
use nalgebra::{DMatrix, Point2};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Where a board's transform comes from.
#[derive(Clone, Debug)]
pub enum BoardSource {
    /// Estimate the transform from point correspondences.
    FromPoints {
        name: Option<String>,
        image: GrayImage,
        correspondences: PointCorrespondenceSet,
    },
    /// Reuse a transform computed elsewhere (same board and pose, new frame).
    FromTransform {
        name: Option<String>,
        image: GrayImage,
        transform: Homography,
    },
    /// Restore a saved record; the transform is re-estimated from its points.
    FromSaved(SavedBoard),
}

/// Row-major per-square training data.
#[derive(Clone, Debug, PartialEq)]
pub struct OcclusionSamples {
    pub coordinates: Vec<BoardCoordinate>,
    /// One row per square, in `coordinates` order.
    pub features: DMatrix<f32>,
    pub labels: Vec<OcclusionLabel>,
}

/// A photographed chessboard mapped onto its 64 squares.
///
/// Geometry (image, transform, grid) is fixed once constructed; only the
/// occlusion labels change afterwards.
#[derive(Clone, Debug)]
pub struct Board {
    name: String,
    image: GrayImage,
    transform: Homography,
    grid: SquareGrid,
    correspondences: Option<PointCorrespondenceSet>,
    occlusions: OcclusionMap,
    params: SquareFeatureParams,
}

impl Board {
    /// Build with the DLT estimator and default square features.
    pub fn new(source: BoardSource) -> Result<Self, BoardError> {
        Self::with_options(source, &DltEstimator, &SquareFeatureParams::default())
    }

    /// Build with an explicit estimator and feature parameters.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn with_options(
        source: BoardSource,
        estimator: &dyn HomographyEstimator,
        params: &SquareFeatureParams,
    ) -> Result<Self, BoardError> {
        let (name, image, transform, correspondences) = match source {
            BoardSource::FromPoints {
                name,
                image,
                correspondences,
            } => {
                let transform = estimate(estimator, &correspondences)?;
                (name, image, transform, Some(correspondences))
            }
            BoardSource::FromTransform {
                name,
                image,
                transform,
            } => (name, image, transform, None),
            BoardSource::FromSaved(saved) => {
                let SavedBoard {
                    name,
                    image,
                    board_points,
                    image_points,
                    descriptors,
                } = saved;
                let correspondences =
                    PointCorrespondenceSet::new(board_points, image_points, descriptors)?;
                let transform = estimate(estimator, &correspondences)?;
                (Some(name), image, transform, Some(correspondences))
            }
        };

        image.validate()?;
        let name = name.unwrap_or_else(timestamp_name);
        let grid = SquareGrid::build(&image, &transform, params)?;
        log::info!(
            "board {name:?}: {} squares over a {}x{} image ({} correspondences)",
            grid.len(),
            image.width,
            image.height,
            correspondences.as_ref().map_or(0, |c| c.len())
        );

        Ok(Self {
            name,
            image,
            transform,
            grid,
            correspondences,
            occlusions: OcclusionMap::default(),
            params: *params,
        })
    }

    /// Start a builder that selects the construction path from whichever
    /// inputs are supplied.
    pub fn builder<'a>() -> BoardBuilder<'a> {
        BoardBuilder::default()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Board→image transform every square was derived from.
    #[inline]
    pub fn transform(&self) -> &Homography {
        &self.transform
    }

    #[inline]
    pub fn grid(&self) -> &SquareGrid {
        &self.grid
    }

    #[inline]
    pub fn square(&self, coordinate: BoardCoordinate) -> &Square {
        self.grid.get(coordinate)
    }

    /// Correspondences the transform was estimated from; `None` for boards
    /// built from a transform.
    #[inline]
    pub fn correspondences(&self) -> Option<&PointCorrespondenceSet> {
        self.correspondences.as_ref()
    }

    #[inline]
    pub fn feature_params(&self) -> &SquareFeatureParams {
        &self.params
    }

    #[inline]
    pub fn occlusions(&self) -> &OcclusionMap {
        &self.occlusions
    }

    #[inline]
    pub fn occlusion_label(&self, coordinate: BoardCoordinate) -> Option<&OcclusionLabel> {
        self.occlusions.get(coordinate)
    }

    /// Label one square. Re-assigning the same label is a no-op.
    pub fn set_occlusion(&mut self, coordinate: BoardCoordinate, label: OcclusionLabel) {
        self.occlusions.set(coordinate, label);
    }

    pub fn clear_occlusion(&mut self, coordinate: BoardCoordinate) -> Option<OcclusionLabel> {
        self.occlusions.clear(coordinate)
    }

    /// Label every square from an annotation grid.
    pub fn add_occlusions(&mut self, grid: &OcclusionGrid) {
        self.occlusions.apply(grid);
        log::debug!("board {:?}: applied occlusion grid", self.name);
    }

    /// Label every square from raw rows; nothing is assigned unless the
    /// rows form an 8×8 grid.
    pub fn add_occlusion_rows(&mut self, rows: Vec<Vec<OcclusionLabel>>) -> Result<(), BoardError> {
        let grid = OcclusionGrid::new(rows)?;
        self.add_occlusions(&grid);
        Ok(())
    }

    /// Feature vectors of all squares, one row each, row-major over cells.
    pub fn feature_matrix(&self) -> DMatrix<f32> {
        let cols = self.params.feature_len();
        DMatrix::from_row_iterator(
            CELL_COUNT,
            cols,
            self.grid
                .iter()
                .flat_map(|s| s.feature_vector().iter().copied()),
        )
    }

    /// Features and labels for every square, row-major.
    ///
    /// Fails with [`BoardError::UnlabeledSquare`] naming the first square
    /// (row-major) that has no occlusion label.
    pub fn occlusion_samples(&self) -> Result<OcclusionSamples, BoardError> {
        let mut coordinates = Vec::with_capacity(CELL_COUNT);
        let mut labels = Vec::with_capacity(CELL_COUNT);
        for square in self.grid.iter() {
            let coordinate = square.coordinate();
            let label = self
                .occlusions
                .get(coordinate)
                .ok_or(BoardError::UnlabeledSquare {
                    coordinate,
                    square: square.algebraic(),
                })?;
            coordinates.push(coordinate);
            labels.push(label.clone());
        }

        Ok(OcclusionSamples {
            coordinates,
            features: self.feature_matrix(),
            labels,
        })
    }

    /// `board -> image` listing of the retained correspondences.
    pub fn correspondence_summary(&self) -> Option<String> {
        self.correspondences
            .as_ref()
            .map(|c| c.summary(&self.name))
    }

    /// The durable part of this board: name, image and correspondences.
    ///
    /// Fails with [`BoardError::Serialization`] for boards built from a
    /// transform, which have no points to re-estimate from.
    pub fn to_saved(&self) -> Result<SavedBoard, BoardError> {
        let correspondences =
            self.correspondences
                .as_ref()
                .ok_or_else(|| BoardError::Serialization {
                    name: self.name.clone(),
                    reason: "board was built from a transform and retains no correspondences",
                })?;
        Ok(SavedBoard {
            name: self.name.clone(),
            image: self.image.clone(),
            board_points: correspondences.board_points().to_vec(),
            image_points: correspondences.image_points().to_vec(),
            descriptors: correspondences.descriptors().to_vec(),
        })
    }
}

fn estimate(
    estimator: &dyn HomographyEstimator,
    correspondences: &PointCorrespondenceSet,
) -> Result<Homography, BoardError> {
    let h = estimator.estimate(
        correspondences.board_points(),
        correspondences.image_points(),
    )?;
    log::debug!(
        "estimated board-image homography from {} correspondences",
        correspondences.len()
    );
    Ok(h)
}

/// Seconds since the Unix epoch with microsecond precision, e.g. `1760000000.123456`.
fn timestamp_name() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Optional-argument front end for [`Board`] construction.
///
/// Resolution order: a saved record, then image + transform, then image +
/// board points + image points (descriptors default to empty ones).
#[derive(Default)]
pub struct BoardBuilder<'a> {
    name: Option<String>,
    image: Option<GrayImage>,
    transform: Option<Homography>,
    board_points: Option<Vec<Point2<f32>>>,
    image_points: Option<Vec<Point2<f32>>>,
    descriptors: Option<Vec<Descriptor>>,
    saved: Option<SavedBoard>,
    estimator: Option<&'a dyn HomographyEstimator>,
    params: SquareFeatureParams,
}

impl<'a> BoardBuilder<'a> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn image(mut self, image: GrayImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn transform(mut self, transform: Homography) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn board_points(mut self, points: Vec<Point2<f32>>) -> Self {
        self.board_points = Some(points);
        self
    }

    pub fn image_points(mut self, points: Vec<Point2<f32>>) -> Self {
        self.image_points = Some(points);
        self
    }

    pub fn descriptors(mut self, descriptors: Vec<Descriptor>) -> Self {
        self.descriptors = Some(descriptors);
        self
    }

    pub fn saved(mut self, saved: SavedBoard) -> Self {
        self.saved = Some(saved);
        self
    }

    pub fn estimator(mut self, estimator: &'a dyn HomographyEstimator) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn feature_params(mut self, params: SquareFeatureParams) -> Self {
        self.params = params;
        self
    }

    /// Resolve the construction path without building.
    pub fn into_source(self) -> Result<BoardSource, BoardError> {
        let Self {
            name,
            image,
            transform,
            board_points,
            image_points,
            descriptors,
            saved,
            ..
        } = self;

        if let Some(saved) = saved {
            return Ok(BoardSource::FromSaved(saved));
        }
        let image = match (image, transform) {
            (Some(image), Some(transform)) => {
                return Ok(BoardSource::FromTransform {
                    name,
                    image,
                    transform,
                })
            }
            (image, _) => image,
        };
        let (Some(image), Some(board_points), Some(image_points)) =
            (image, board_points, image_points)
        else {
            return Err(BoardError::MissingConstructionArguments);
        };
        let correspondences = match descriptors {
            Some(descriptors) => {
                PointCorrespondenceSet::new(board_points, image_points, descriptors)?
            }
            None => PointCorrespondenceSet::without_descriptors(board_points, image_points)?,
        };
        Ok(BoardSource::FromPoints {
            name,
            image,
            correspondences,
        })
    }

    pub fn build(self) -> Result<Board, BoardError> {
        let estimator = self.estimator.unwrap_or(&DltEstimator);
        let params = self.params;
        Board::with_options(self.into_source()?, estimator, &params)
    }
}
