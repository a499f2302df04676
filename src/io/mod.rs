//! File formats at the edges of the pipeline.
//!
//! - `shp` - shapefile loading into a [`GeoTable`](crate::GeoTable)
//! - `csv` - attribute tables and partition assignments
//! - `svg` - group maps for visual inspection

pub(crate) mod csv;
mod shp;
mod svg;

pub use shp::{ShapefileOptions, read_shapefile};
pub use svg::{render_groups, render_partition};
