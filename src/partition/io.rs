use std::path::Path;

use anyhow::{Context, Result, ensure};
use polars::{frame::DataFrame, prelude::Column};

use crate::{io::csv, partition::{GroupAssignment, Partition}};

impl Partition {
    /// Load a partition from a `geo_id,group` CSV file.
    pub fn read_from_csv(path: &Path) -> Result<Self> {
        let df = csv::read_csv_strings(path)?;
        ensure!(df.width() >= 2, "[partition::io] CSV must have two columns: geo_id,group");

        let names = df.get_column_names();
        let units = df.column(names[0])?.str()?;
        let groups = df.column(names[1])?.str()?;

        let mut assignment = GroupAssignment::new();
        for (row, (unit, group)) in units.into_iter().zip(groups).enumerate() {
            let unit = unit.with_context(|| format!("[partition::io] empty geo_id on row {row}"))?;
            let Some(group) = group else { continue };
            let previous = assignment.insert(unit, group);
            ensure!(previous.is_none(), "[partition::io] geo_id {unit:?} appears more than once in {}", path.display());
        }

        Ok(Self::from_assignment(assignment))
    }

    /// Write the assignment as a `geo_id,group` CSV file in unit order.
    pub fn write_to_csv(&self, path: &Path) -> Result<()> {
        let (units, groups) = self.assignment().iter().unzip::<_, _, Vec<_>, Vec<_>>();

        let mut df = DataFrame::new(vec![
            Column::new("geo_id".into(), units),
            Column::new("group".into(), groups),
        ])?;

        csv::write_csv(&mut df, path)
    }
}
