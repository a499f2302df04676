//! End-to-end population assignment with checkpointed stages.

use std::path::Path;

use tracing::info;

use crate::{
    Checkpointer, GeoTable, Result,
    aggregate::aggregate_into,
    geom::assign,
    io::{ShapefileOptions, read_shapefile},
};

/// A source table whose columns are summed onto the target units.
#[derive(Clone, Copy, Debug)]
pub struct PopulationSource<'a, S: AsRef<str> = &'a str> {
    /// Names the checkpoint of this source's assignment (`assign_{key}`).
    pub key: &'a str,
    pub table: &'a GeoTable,
    pub columns: &'a [S],
}

/// Checkpoint key under which the assignment of `source_key` is stored.
pub fn assignment_key(source_key: &str) -> String {
    format!("assign_{source_key}")
}

/// Assign each source's units to `target` and sum its columns onto `target`.
///
/// Each assignment is checkpointed under [`assignment_key`], so a rerun with the same
/// cache skips the overlap computation. Sources are processed in order; on error the
/// columns of earlier sources have already been written.
pub fn assign_population_data<S: AsRef<str>>(
    checkpointer: &Checkpointer,
    target: &mut GeoTable,
    sources: &[PopulationSource<'_, S>],
) -> Result<()> {
    for source in sources {
        let key = assignment_key(source.key);
        let assignment = checkpointer
            .checkpoint(&key, || assign(source.table, &*target))?
            .into_inner();

        aggregate_into(target, &assignment, source.table, source.columns)?;
        info!(
            target: "popmap::pipeline",
            source = source.key,
            columns = source.columns.len(),
            unassigned = assignment.num_unassigned(),
            "aggregated source onto target"
        );
    }
    Ok(())
}

/// Read a shapefile through the checkpoint cache, keyed by its path.
pub fn load_geotable_cached(
    checkpointer: &Checkpointer,
    path: &Path,
    options: &ShapefileOptions,
) -> anyhow::Result<GeoTable> {
    let key = format!("geotable_{}", path.display());
    Ok(checkpointer
        .checkpoint::<GeoTable, anyhow::Error, _>(&key, || read_shapefile(path, options))?
        .into_inner())
}
