use ahash::AHashMap;
use geo::MultiPolygon;
use polars::{frame::DataFrame, prelude::Column};

use crate::{Crs, Error, Result, geom::Geometries};

/// An ordered table of geographic units: identifier, shape and attribute columns.
///
/// Row `i` of the attribute frame describes unit `i`. A table without attributes
/// holds an empty frame.
#[derive(Debug, Clone)]
pub struct GeoTable {
    ids: Vec<String>,
    index: AHashMap<String, u32>, // Map between unit ids and row positions.
    geoms: Geometries,
    data: DataFrame,
    crs: Option<Crs>,
}

impl GeoTable {
    /// Construct a table from parallel lists of identifiers and shapes.
    pub fn new(ids: Vec<String>, shapes: Vec<MultiPolygon<f64>>, crs: Option<Crs>) -> Result<Self> {
        if ids.len() != shapes.len() {
            return Err(Error::InvalidTable(format!(
                "{} identifiers for {} shapes", ids.len(), shapes.len()
            )));
        }

        let mut index = AHashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i as u32).is_some() {
                return Err(Error::DuplicateId(id.clone()));
            }
        }

        Ok(Self {
            ids,
            index,
            geoms: Geometries::new(shapes),
            data: DataFrame::empty(),
            crs,
        })
    }

    /// Attach attribute columns, replacing any existing ones.
    pub fn with_data(mut self, data: DataFrame) -> Result<Self> {
        self.set_data(data)?;
        Ok(self)
    }

    /// Replace all attribute columns.
    pub fn set_data(&mut self, data: DataFrame) -> Result<()> {
        if data.width() > 0 && data.height() != self.len() {
            return Err(Error::InvalidTable(format!(
                "attribute frame has {} rows for {} units", data.height(), self.len()
            )));
        }
        self.data = data;
        Ok(())
    }

    /// Add a column, or overwrite the column with the same name.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.len() {
            return Err(Error::InvalidTable(format!(
                "column {:?} has {} values for {} units", column.name().as_str(), column.len(), self.len()
            )));
        }

        if self.data.width() == 0 {
            self.data = DataFrame::new(vec![column])?;
        } else {
            self.data.with_column(column)?;
        }
        Ok(())
    }

    /// Get the number of units.
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    /// Check if the table has no units.
    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Unit identifiers, in row order.
    #[inline] pub fn ids(&self) -> &[String] { &self.ids }

    /// Identifier of the unit at row `i`.
    #[inline] pub fn id(&self, i: usize) -> &str { &self.ids[i] }

    /// Row position of the unit with identifier `id`.
    #[inline] pub fn position(&self, id: &str) -> Option<usize> { self.index.get(id).map(|&i| i as usize) }

    /// Unit shapes, in row order.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.geoms.shapes() }

    #[inline] pub(crate) fn geometries(&self) -> &Geometries { &self.geoms }

    /// Attribute columns, one row per unit.
    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    /// Declared coordinate reference system, if known.
    #[inline] pub fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    /// Names of the attribute columns.
    pub fn column_names(&self) -> Vec<String> {
        self.data.get_column_names().into_iter().map(|name| name.to_string()).collect()
    }

    /// Look up an attribute column; `table` names the role of this table in errors.
    pub(crate) fn column(&self, name: &str, table: &'static str) -> Result<&Column> {
        if self.data.width() == 0 {
            return Err(Error::MissingColumn { column: name.to_string(), table });
        }
        self.data.column(name).map_err(|_| Error::MissingColumn { column: name.to_string(), table })
    }

    pub(crate) fn describe_crs(crs: Option<&Crs>) -> String {
        crs.map_or_else(|| "unknown".to_string(), Crs::to_string)
    }
}
