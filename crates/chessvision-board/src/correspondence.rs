//! Board-point / image-point / descriptor triples used to fit the board transform.

use crate::error::BoardError;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Opaque feature descriptor attached to a correspondence (e.g. a SIFT vector).
///
/// Only carried for matching provenance; geometry never reads it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(pub Vec<f32>);

/// One borrowed correspondence from a [`PointCorrespondenceSet`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointCorrespondence<'a> {
    pub board_point: Point2<f32>,
    pub image_point: Point2<f32>,
    pub descriptor: &'a Descriptor,
}

/// Three equal-length parallel sequences. Read-only after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCorrespondences", into = "RawCorrespondences")]
pub struct PointCorrespondenceSet {
    board_points: Vec<Point2<f32>>,
    image_points: Vec<Point2<f32>>,
    descriptors: Vec<Descriptor>,
}

#[derive(Serialize, Deserialize)]
struct RawCorrespondences {
    board_points: Vec<Point2<f32>>,
    image_points: Vec<Point2<f32>>,
    descriptors: Vec<Descriptor>,
}

impl PointCorrespondenceSet {
    /// Fails with [`BoardError::InvalidCorrespondence`] when the lengths differ.
    pub fn new(
        board_points: Vec<Point2<f32>>,
        image_points: Vec<Point2<f32>>,
        descriptors: Vec<Descriptor>,
    ) -> Result<Self, BoardError> {
        if board_points.len() != image_points.len() || board_points.len() != descriptors.len() {
            return Err(BoardError::InvalidCorrespondence {
                board_points: board_points.len(),
                image_points: image_points.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            board_points,
            image_points,
            descriptors,
        })
    }

    /// Pairs without descriptors; every entry gets an empty [`Descriptor`].
    pub fn without_descriptors(
        board_points: Vec<Point2<f32>>,
        image_points: Vec<Point2<f32>>,
    ) -> Result<Self, BoardError> {
        let descriptors = vec![Descriptor::default(); board_points.len()];
        Self::new(board_points, image_points, descriptors)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.board_points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.board_points.is_empty()
    }

    #[inline]
    pub fn board_points(&self) -> &[Point2<f32>] {
        &self.board_points
    }

    #[inline]
    pub fn image_points(&self) -> &[Point2<f32>] {
        &self.image_points
    }

    #[inline]
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Zipped iteration over the three sequences.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = PointCorrespondence<'_>> + '_ {
        self.board_points
            .iter()
            .zip(&self.image_points)
            .zip(&self.descriptors)
            .map(|((&board_point, &image_point), descriptor)| PointCorrespondence {
                board_point,
                image_point,
                descriptor,
            })
    }

    /// Human-readable listing of every `board -> image` pair.
    pub fn summary(&self, name: &str) -> String {
        let mut lines = vec![
            format!("==========[ Board: {name} ]=========="),
            format!("##### {} point correspondences: #####", self.len()),
        ];
        lines.extend(self.iter().map(|c| {
            format!(
                "\t({:.3}, {:.3}) -> ({:.3}, {:.3})",
                c.board_point.x, c.board_point.y, c.image_point.x, c.image_point.y
            )
        }));
        lines.join("\n")
    }

    /// Split back into the three owned sequences.
    pub fn into_parts(self) -> (Vec<Point2<f32>>, Vec<Point2<f32>>, Vec<Descriptor>) {
        (self.board_points, self.image_points, self.descriptors)
    }
}

impl TryFrom<RawCorrespondences> for PointCorrespondenceSet {
    type Error = BoardError;

    fn try_from(raw: RawCorrespondences) -> Result<Self, Self::Error> {
        Self::new(raw.board_points, raw.image_points, raw.descriptors)
    }
}

impl From<PointCorrespondenceSet> for RawCorrespondences {
    fn from(set: PointCorrespondenceSet) -> Self {
        let (board_points, image_points, descriptors) = set.into_parts();
        Self {
            board_points,
            image_points,
            descriptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(n: usize) -> Vec<Point2<f32>> {
        (0..n).map(|k| Point2::new(k as f32, 2.0 * k as f32)).collect()
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = PointCorrespondenceSet::new(pts(63), pts(64), vec![Descriptor::default(); 64])
            .unwrap_err();
        assert!(matches!(
            err,
            BoardError::InvalidCorrespondence {
                board_points: 63,
                image_points: 64,
                descriptors: 64
            }
        ));

        let err = PointCorrespondenceSet::new(pts(4), pts(4), Vec::new()).unwrap_err();
        assert!(matches!(err, BoardError::InvalidCorrespondence { .. }));
    }

    #[test]
    fn iterates_in_lockstep() {
        let descriptors = (0..3).map(|k| Descriptor(vec![k as f32])).collect();
        let set = PointCorrespondenceSet::new(pts(3), pts(3), descriptors).unwrap();
        let items: Vec<_> = set.iter().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].board_point, Point2::new(2.0, 4.0));
        assert_eq!(items[2].descriptor, &Descriptor(vec![2.0]));
    }

    #[test]
    fn summary_lists_each_pair() {
        let set = PointCorrespondenceSet::without_descriptors(pts(2), pts(2)).unwrap();
        let text = set.summary("B1");
        assert!(text.starts_with("==========[ Board: B1 ]"));
        assert!(text.contains("2 point correspondences"));
        assert!(text.contains("(1.000, 2.000) -> (1.000, 2.000)"));
    }

    #[test]
    fn deserialization_checks_lengths() {
        let json = r#"{"board_points":[[0,0]],"image_points":[],"descriptors":[[]]}"#;
        assert!(serde_json::from_str::<PointCorrespondenceSet>(json).is_err());
    }
}
