use std::{io::Write, path::{Path, PathBuf}};

use anyhow::{Context, Result, anyhow};
use polars::prelude::DataType;
use tracing::info;

use crate::{GeoTable, Partition, common};
use super::{Projection, SvgWriter, UNASSIGNED_FILL, escape_xml, multipolygon_to_path, spaced_hues};

const WIDTH: f64 = 1200.0;
const MARGIN: f64 = 40.0;
const CENTROID_RADIUS: f64 = 4.0;

/// Draw `table` colored by the labels in `group_column` and write `out_dir/map_{title}.svg`.
///
/// Each distinct label gets its own evenly spaced hue and a white dot at the centroid of
/// its units. Rows with a null label are drawn gray. Returns the written path.
pub fn render_groups(table: &GeoTable, group_column: &str, title: &str, out_dir: &Path) -> Result<PathBuf> {
    let column = table.data().column(group_column)
        .with_context(|| format!("[io::svg] missing column {:?}", group_column))?
        .cast(&DataType::String)?;
    let labels = column.str()
        .with_context(|| format!("[io::svg] column {:?} cannot be read as text", group_column))?
        .into_iter()
        .collect::<Vec<_>>();

    render(table, &labels, title, out_dir)
}

/// Draw `table` colored by the groups of `partition`; see [`render_groups`].
pub fn render_partition(table: &GeoTable, partition: &Partition, title: &str, out_dir: &Path) -> Result<PathBuf> {
    let labels = table.ids().iter()
        .map(|id| partition.group_of(id))
        .collect::<Vec<_>>();

    render(table, &labels, title, out_dir)
}

fn render(table: &GeoTable, labels: &[Option<&str>], title: &str, out_dir: &Path) -> Result<PathBuf> {
    let geoms = table.geometries();
    let bounds = geoms.bounds()
        .ok_or_else(|| anyhow!("[io::svg] Could not determine bounds; nothing to draw."))?;

    // Stable group order: sorted labels.
    let mut groups = labels.iter().flatten().copied().collect::<Vec<_>>();
    groups.sort_unstable();
    groups.dedup();
    let colors = spaced_hues(groups.len());
    let group_index = |label: &str| groups.binary_search_by(|g| (*g).cmp(label)).ok();

    common::ensure_dir_exists(out_dir)?;
    let path = out_dir.join(format!("{}.svg", common::safe_stem(&format!("map_{title}"))));

    let projection = Projection::fit(bounds, WIDTH, MARGIN);
    let mut writer = SvgWriter::new(&path)?;
    writer.write_header(projection.width(), projection.height())?;

    for (shape, label) in geoms.shapes().iter().zip(labels) {
        let fill = match label.and_then(group_index) {
            Some(g) => colors[g].to_string(),
            None => UNASSIGNED_FILL.to_string(),
        };
        writeln!(writer, r#"<path class="unit" d="{}" style="fill:{}"/>"#, multipolygon_to_path(shape, &projection), fill)?;
    }

    let mut members = vec![Vec::new(); groups.len()];
    for (row, label) in labels.iter().enumerate() {
        if let Some(g) = label.and_then(group_index) {
            members[g].push(row);
        }
    }
    for (group, rows) in groups.iter().zip(&members) {
        let Some(centroid) = geoms.centroid_of(rows) else { continue };
        let (cx, cy) = projection.project(centroid.0);
        writeln!(writer, r#"<circle class="centroid" cx="{cx:.3}" cy="{cy:.3}" r="{CENTROID_RADIUS}"><title>{}</title></circle>"#, escape_xml(group))?;
    }

    writeln!(writer, r#"<text class="title" x="{}" y="{}" text-anchor="middle">{}</text>"#, projection.width() / 2.0, MARGIN * 0.6, escape_xml(title))?;
    writer.finish()?;

    info!(target: "popmap::io", path = %path.display(), groups = groups.len(), "rendered group map");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use geo::{MultiPolygon, Rect};
    use polars::prelude::*;

    use crate::{GeoTable, GroupAssignment, Partition};
    use super::{render_groups, render_partition};

    fn precincts() -> GeoTable {
        let shapes = (0..3)
            .map(|i| MultiPolygon(vec![Rect::new((i as f64, 0.0), (i as f64 + 1.0, 1.0)).to_polygon()]))
            .collect();
        GeoTable::new(vec!["1".into(), "2".into(), "3".into()], shapes, None).unwrap()
            .with_data(DataFrame::new(vec![
                Column::new("district".into(), [Some(2i64), Some(2), None]),
            ]).unwrap())
            .unwrap()
    }

    #[test]
    fn writes_one_hue_and_dot_per_group() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("maps");
        let groups: GroupAssignment = [("1", "A"), ("2", "B"), ("3", "B")].into_iter().collect();

        let path = render_partition(&precincts(), &Partition::from_assignment(groups), "Plan & Test", &out_dir).unwrap();
        let svg = fs::read_to_string(&path).unwrap();

        assert!(path.starts_with(&out_dir));
        assert_eq!(svg.matches(r#"class="unit""#).count(), 3);
        assert_eq!(svg.matches(r#"class="centroid""#).count(), 2);
        assert!(svg.contains("hsl(0.0,70%,55%)") && svg.contains("hsl(180.0,70%,55%)"));
        assert!(svg.contains("Plan &amp; Test"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn numeric_group_column_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = render_groups(&precincts(), "district", "oregon", dir.path()).unwrap();
        let svg = fs::read_to_string(&path).unwrap();

        assert_eq!(path.file_name().unwrap(), "map_oregon.svg");
        assert_eq!(svg.matches(r#"class="centroid""#).count(), 1);
        assert!(svg.contains(super::UNASSIGNED_FILL));
    }

    #[test]
    fn missing_group_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render_groups(&precincts(), "nope", "x", dir.path()).is_err());
    }
}
