use polars::prelude::{Column, DataType};
use tracing::debug;

use crate::{Assignment, Error, GeoTable, Result};

/// Sum each named `source` column per target unit of `assignment`.
///
/// Returns one column per name, each with one value per `target` row. Integer columns
/// sum to `Int64`, float columns to `Float64`. Nulls and unassigned source units
/// contribute nothing; a target unit with no source units sums to zero.
pub fn column_sums<S: AsRef<str>>(
    target: &GeoTable,
    assignment: &Assignment,
    source: &GeoTable,
    columns: &[S],
) -> Result<Vec<Column>> {
    assignment.check_fits(source.len(), target.len())?;

    columns.iter().map(|name| {
        let name = name.as_ref();
        let column = source.column(name, "source")?;

        // Accumulate by target position rather than group_by: targets without any source
        // unit still need a zero row.
        let sums = match column.dtype() {
            DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
                let overflow = || Error::Overflow { column: name.to_string() };
                let values = column.strict_cast(&DataType::Int64).map_err(|_| overflow())?;
                let mut sums = vec![0i64; target.len()];
                for (value, part) in values.i64()?.into_iter().zip(assignment.targets()) {
                    if let (Some(value), Some(part)) = (value, part) {
                        let sum = &mut sums[*part as usize];
                        *sum = sum.checked_add(value).ok_or_else(overflow)?;
                    }
                }
                Column::new(name.into(), sums)
            }
            DataType::Float32 | DataType::Float64 => {
                let values = column.cast(&DataType::Float64)?;
                let mut sums = vec![0f64; target.len()];
                for (value, part) in values.f64()?.into_iter().zip(assignment.targets()) {
                    if let (Some(value), Some(part)) = (value, part) {
                        sums[*part as usize] += value;
                    }
                }
                Column::new(name.into(), sums)
            }
            dtype => return Err(Error::NonNumericColumn {
                column: name.to_string(),
                dtype: dtype.to_string(),
            }),
        };

        debug!(target: "popmap::aggregate", column = name, "summed column onto target units");
        Ok(sums)
    }).collect()
}

/// Pure aggregation: a copy of `target` with the summed columns added or overwritten.
pub fn aggregate<S: AsRef<str>>(
    target: &GeoTable,
    assignment: &Assignment,
    source: &GeoTable,
    columns: &[S],
) -> Result<GeoTable> {
    let mut out = target.clone();
    for column in column_sums(target, assignment, source, columns)? {
        out.set_column(column)?;
    }
    Ok(out)
}

/// In-place aggregation onto the caller's `target`.
///
/// All sums are computed before anything is written, so on error `target` is unchanged.
/// Callers that need the original table must copy it first.
pub fn aggregate_into<S: AsRef<str>>(
    target: &mut GeoTable,
    assignment: &Assignment,
    source: &GeoTable,
    columns: &[S],
) -> Result<()> {
    for column in column_sums(target, assignment, source, columns)? {
        target.set_column(column)?;
    }
    Ok(())
}
