use std::collections::BTreeMap;

use polars::prelude::{Column, DataType};

use crate::{Error, GeoTable, Result, partition::GroupAssignment};

/// A grouping of units (e.g. precincts into districts) with derived state.
///
/// Only the unit → group assignment is persisted; members and totals are rebuilt
/// from it with [`Partition::from_assignment`] or [`Partition::with_totals`].
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    assignment: GroupAssignment,
    parts: BTreeMap<String, Vec<String>>, // group -> member units, in unit order
    totals: BTreeMap<String, BTreeMap<String, f64>>, // series -> group -> total
}

impl Partition {
    /// Build a partition from a raw assignment, without any totals.
    pub fn from_assignment(assignment: GroupAssignment) -> Self {
        let mut parts: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (unit, group) in assignment.iter() {
            parts.entry(group.to_string()).or_default().push(unit.to_string());
        }
        Self { assignment, parts, totals: BTreeMap::new() }
    }

    /// Build a partition and sum each numeric `series` of `table` per group.
    ///
    /// Every assigned unit must be a row of `table`. Nulls count as zero.
    pub fn with_totals<S: AsRef<str>>(assignment: GroupAssignment, table: &GeoTable, series: &[S]) -> Result<Self> {
        let positions = assignment.iter()
            .map(|(unit, group)| match table.position(unit) {
                Some(row) => Ok((row, group)),
                None => Err(Error::AssignmentMismatch(format!("unit {unit:?} is not in the table"))),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut totals = BTreeMap::new();
        for name in series {
            let name = name.as_ref();
            let column = table.column(name, "partition")?;
            if !column.dtype().is_primitive_numeric() {
                return Err(Error::NonNumericColumn { column: name.to_string(), dtype: column.dtype().to_string() });
            }
            let values = column.cast(&DataType::Float64)?;
            let values = values.f64()?;

            let mut sums: BTreeMap<String, f64> = BTreeMap::new();
            for &(row, group) in &positions {
                *sums.entry(group.to_string()).or_default() += values.get(row).unwrap_or(0.0);
            }
            totals.insert(name.to_string(), sums);
        }

        let mut partition = Self::from_assignment(assignment);
        partition.totals = totals;
        Ok(partition)
    }

    /// The raw unit → group assignment.
    #[inline] pub fn assignment(&self) -> &GroupAssignment { &self.assignment }

    /// Drop the derived state, keeping only the assignment.
    #[inline] pub fn into_assignment(self) -> GroupAssignment { self.assignment }

    #[inline] pub fn group_of(&self, unit: &str) -> Option<&str> { self.assignment.get(unit) }

    /// Group labels in sorted order.
    pub fn groups(&self) -> impl Iterator<Item = &str> { self.parts.keys().map(String::as_str) }

    #[inline] pub fn num_groups(&self) -> usize { self.parts.len() }

    /// Units assigned to `group`, empty if the group does not exist.
    pub fn members(&self, group: &str) -> &[String] {
        self.parts.get(group).map_or(&[][..], Vec::as_slice)
    }

    /// Total of `series` in `group`, if the series was summed.
    pub fn total(&self, series: &str, group: &str) -> Option<f64> {
        self.totals.get(series).map(|sums| sums.get(group).copied().unwrap_or(0.0))
    }

    /// Group label per row of `table`, null where the unit is unassigned.
    pub fn group_column(&self, table: &GeoTable, name: &str) -> Column {
        let groups = table.ids().iter()
            .map(|id| self.assignment.get(id))
            .collect::<Vec<_>>();
        Column::new(name.into(), groups)
    }
}

impl From<GroupAssignment> for Partition {
    fn from(assignment: GroupAssignment) -> Self { Self::from_assignment(assignment) }
}
