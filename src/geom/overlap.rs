use geo::{Area, BooleanOps, BoundingRect, MultiPolygon};
use tracing::{debug, info, warn};

use crate::{Assignment, Error, GeoTable, Result, geom::Geometries};

impl Geometries {
    /// Index of the shape with the largest planar overlap area with `shape`.
    ///
    /// Returns `None` when nothing overlaps with positive area. Among equal areas the
    /// lowest index wins, so the result does not depend on R-tree traversal order.
    pub(crate) fn best_overlap(&self, shape: &MultiPolygon<f64>) -> Option<usize> {
        let rect = shape.bounding_rect()?;

        let mut best: Option<(usize, f64)> = None;
        for idx in self.candidates(&rect) {
            let area = shape.intersection(&self.shapes()[idx]).unsigned_area();
            if area.is_nan() || area <= 0.0 { continue }

            best = match best {
                Some((b, a)) if a > area || (a == area && b < idx) => Some((b, a)),
                _ => Some((idx, area)),
            };
        }

        best.map(|(idx, _)| idx)
    }
}

/// Map every unit of `source` to the unit of `target` it overlaps most by area.
///
/// Source units without any positive-area overlap are left unassigned. Both tables must
/// declare the same coordinate reference system; nothing is reprojected.
pub fn assign(source: &GeoTable, target: &GeoTable) -> Result<Assignment> {
    if source.crs() != target.crs() {
        return Err(Error::CrsMismatch {
            source_crs: GeoTable::describe_crs(source.crs()),
            target_crs: GeoTable::describe_crs(target.crs()),
        });
    }

    let targets = target.geometries();
    let mapping = source.geometries().shapes().iter()
        .map(|shape| targets.best_overlap(shape).map(|idx| idx as u32))
        .collect::<Vec<_>>();

    let assignment = Assignment::new(mapping, target.len())?;
    info!(
        target: "popmap::assign",
        sources = source.len(),
        targets = target.len(),
        unassigned = assignment.num_unassigned(),
        "computed overlap assignment"
    );
    if assignment.num_unassigned() > 0 {
        warn!(target: "popmap::assign", count = assignment.num_unassigned(), "source units overlap no target unit");
    }
    for unit in assignment.unassigned().take(10) {
        debug!(target: "popmap::assign", unit = source.id(unit), "no overlapping target unit");
    }

    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use geo::{Area, BooleanOps, MultiPolygon, Rect};
    use proptest::prelude::*;

    use crate::{Crs, GeoTable, geom::Geometries};
    use super::assign;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Rect::new((x0, y0), (x1, y1)).to_polygon()])
    }

    fn table(shapes: Vec<MultiPolygon<f64>>, crs: Option<Crs>) -> GeoTable {
        let ids = (0..shapes.len()).map(|i| format!("u{i}")).collect();
        GeoTable::new(ids, shapes, crs).unwrap()
    }

    #[test]
    fn picks_largest_overlap() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 2.0, 2.0), square(2.0, 0.0, 4.0, 2.0)]);
        // 0.5 of the unit lies in target 0, 1.5 in target 1
        assert_eq!(targets.best_overlap(&square(1.5, 0.0, 3.5, 1.0)), Some(1));
        assert_eq!(targets.best_overlap(&square(0.5, 0.0, 2.5, 1.0)), Some(0));
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let targets = Geometries::new(vec![
            square(2.0, 0.0, 4.0, 2.0),
            square(0.0, 0.0, 2.0, 2.0),
        ]);
        assert_eq!(targets.best_overlap(&square(1.0, 0.0, 3.0, 1.0)), Some(0));
    }

    #[test]
    fn touching_only_is_unassigned() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(targets.best_overlap(&square(1.0, 0.0, 2.0, 1.0)), None);
        assert_eq!(targets.best_overlap(&square(5.0, 5.0, 6.0, 6.0)), None);
        assert_eq!(targets.best_overlap(&MultiPolygon(vec![])), None);
    }

    #[test]
    fn assigns_blocks_to_precincts() {
        let blocks = table(vec![
            square(0.0, 0.0, 1.0, 1.0),
            square(1.0, 0.0, 2.0, 1.0),
            square(2.0, 0.0, 3.0, 1.0),
            square(9.0, 9.0, 10.0, 10.0),
        ], Some(Crs::Epsg(4269)));
        let precincts = table(vec![
            square(0.0, 0.0, 2.0, 1.0),
            square(2.0, 0.0, 3.0, 1.0),
        ], Some(Crs::Epsg(4269)));

        let assignment = assign(&blocks, &precincts).unwrap();
        assert_eq!(assignment.targets(), &[Some(0), Some(0), Some(1), None]);
        assert_eq!(assignment.num_unassigned(), 1);
        assert_eq!(assign(&blocks, &precincts).unwrap(), assignment);
    }

    #[test]
    fn rejects_mismatched_crs() {
        let blocks = table(vec![square(0.0, 0.0, 1.0, 1.0)], Some(Crs::Epsg(4269)));
        let precincts = table(vec![square(0.0, 0.0, 1.0, 1.0)], Some(Crs::Epsg(3857)));
        let err = assign(&blocks, &precincts).unwrap_err();
        assert!(matches!(err, crate::Error::CrsMismatch { .. }), "{err}");

        let unknown = table(vec![square(0.0, 0.0, 1.0, 1.0)], None);
        assert!(assign(&blocks, &unknown).is_err());
    }

    fn rects(max: usize) -> impl Strategy<Value = Vec<MultiPolygon<f64>>> {
        prop::collection::vec((0u8..16, 0u8..16, 1u8..6, 1u8..6), 1..max).prop_map(|cells| {
            cells.into_iter()
                .map(|(x, y, w, h)| {
                    let (x, y) = (f64::from(x) / 2.0, f64::from(y) / 2.0);
                    square(x, y, x + f64::from(w), y + f64::from(h))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn matches_exhaustive_scan(blocks in rects(12), precincts in rects(10)) {
            let source = table(blocks.clone(), None);
            let target = table(precincts.clone(), None);

            let assignment = assign(&source, &target).unwrap();
            prop_assert_eq!(&assign(&source, &target).unwrap(), &assignment);

            for (unit, block) in blocks.iter().enumerate() {
                let mut best: Option<(usize, f64)> = None;
                for (idx, precinct) in precincts.iter().enumerate() {
                    let area = block.intersection(precinct).unsigned_area();
                    if area > 0.0 && best.is_none_or(|(_, a)| area > a) {
                        best = Some((idx, area));
                    }
                }
                prop_assert_eq!(assignment.targets()[unit], best.map(|(idx, _)| idx as u32));
            }
        }
    }
}
