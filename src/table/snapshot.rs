use geo::MultiPolygon;
use polars::{frame::DataFrame, prelude::{Column, DataType}};
use serde::{Deserialize, Serialize};

use crate::{Crs, Error, GeoTable, Result};

/// Values of one attribute column, tagged with its dtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum ColumnValues {
    I32(Vec<Option<i32>>),
    I64(Vec<Option<i64>>),
    U32(Vec<Option<u32>>),
    U64(Vec<Option<u64>>),
    F32(Vec<Option<f32>>),
    F64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Str(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,
    pub values: ColumnValues,
}

/// Serializable form of a [`GeoTable`].
///
/// Columns keep their dtype. Only the dtypes of [`ColumnValues`] are supported, and
/// floats must be finite or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub ids: Vec<String>,
    pub shapes: Vec<MultiPolygon<f64>>,
    pub columns: Vec<ColumnSnapshot>,
    pub crs: Option<Crs>,
}

/// JSON has no NaN or infinity; they would come back as nulls.
fn finite<T: Into<f64> + Copy>(name: &str, values: Vec<Option<T>>) -> Result<Vec<Option<T>>> {
    let bad = values.iter().flatten().map(|&v| -> f64 { v.into() }).find(|v| !v.is_finite());
    match bad {
        Some(v) => Err(Error::InvalidTable(format!("column {name:?} holds non-finite value {v}"))),
        None => Ok(values),
    }
}

impl ColumnSnapshot {
    fn from_column(column: &Column) -> Result<Self> {
        let name = column.name().to_string();
        let values = match column.dtype() {
            DataType::Int32 => ColumnValues::I32(column.i32()?.into_iter().collect()),
            DataType::Int64 => ColumnValues::I64(column.i64()?.into_iter().collect()),
            DataType::UInt32 => ColumnValues::U32(column.u32()?.into_iter().collect()),
            DataType::UInt64 => ColumnValues::U64(column.u64()?.into_iter().collect()),
            DataType::Float32 => ColumnValues::F32(finite(&name, column.f32()?.into_iter().collect())?),
            DataType::Float64 => ColumnValues::F64(finite(&name, column.f64()?.into_iter().collect())?),
            DataType::Boolean => ColumnValues::Bool(column.bool()?.into_iter().collect()),
            DataType::String => ColumnValues::Str(column.str()?.into_iter().map(|v| v.map(str::to_string)).collect()),
            dtype => return Err(Error::InvalidTable(format!("column {name:?} has unsupported dtype {dtype}"))),
        };

        Ok(Self { name, values })
    }

    fn into_column(self) -> Column {
        let name = self.name.into();
        match self.values {
            ColumnValues::I32(values) => Column::new(name, values),
            ColumnValues::I64(values) => Column::new(name, values),
            ColumnValues::U32(values) => Column::new(name, values),
            ColumnValues::U64(values) => Column::new(name, values),
            ColumnValues::F32(values) => Column::new(name, values),
            ColumnValues::F64(values) => Column::new(name, values),
            ColumnValues::Bool(values) => Column::new(name, values),
            ColumnValues::Str(values) => Column::new(name, values),
        }
    }
}

impl TableSnapshot {
    /// Capture ids, shapes, attributes and CRS of a table.
    pub fn of(table: &GeoTable) -> Result<Self> {
        Ok(Self {
            ids: table.ids().to_vec(),
            shapes: table.shapes().to_vec(),
            columns: table.data().get_columns().iter()
                .map(ColumnSnapshot::from_column)
                .collect::<Result<Vec<_>>>()?,
            crs: table.crs().cloned(),
        })
    }

    /// Rebuild the table, including its spatial index.
    pub fn into_table(self) -> Result<GeoTable> {
        let table = GeoTable::new(self.ids, self.shapes, self.crs)?;
        if self.columns.is_empty() {
            return Ok(table);
        }

        let data = DataFrame::new(
            self.columns.into_iter().map(ColumnSnapshot::into_column).collect()
        )?;
        table.with_data(data)
    }
}
