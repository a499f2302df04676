use geo::{BoundingRect, Centroid, Coord, MultiPolygon, Point, Rect};
use rstar::{RTree, AABB};

use crate::geom::BoundingBox;

/// A collection of MultiPolygons indexed by an R-tree over their bounding boxes.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes are kept but never indexed, so queries never return them.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| Some(BoundingBox::new(i, shape.bounding_rect()?)))
                    .collect()
            ),
            shapes,
        }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Indices of shapes whose bounding boxes intersect `rect`.
    #[inline]
    pub(crate) fn candidates(&self, rect: &Rect<f64>) -> impl Iterator<Item = usize> + '_ {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        self.rtree.locate_in_envelope_intersecting(&envelope).map(|bbox| bbox.idx())
    }

    /// Compute the bounding rectangle of all MultiPolygons.
    pub(crate) fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|shape| shape.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Area-weighted centroid of the shapes at `indices`, treated as one MultiPolygon.
    pub(crate) fn centroid_of(&self, indices: &[usize]) -> Option<Point<f64>> {
        MultiPolygon(
            indices.iter()
                .flat_map(|&i| self.shapes[i].0.iter().cloned())
                .collect()
        ).centroid()
    }
}
