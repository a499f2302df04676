//! Shapefile loading.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use polars::{frame::DataFrame, prelude::Column};
use shapefile::{PolygonRing, Reader, Shape, dbase::{FieldValue, Record}};
use tracing::{debug, info};

use crate::{Crs, GeoTable};

/// How to read a shapefile into a [`GeoTable`].
#[derive(Clone, Debug, Default)]
pub struct ShapefileOptions {
    /// Attribute holding the unit id. Record numbers are used when unset.
    pub id_field: Option<String>,
    /// Overrides the reference system found in the `.prj` sidecar.
    pub crs: Option<Crs>,
}

impl ShapefileOptions {
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }
}

/// Read polygons and attributes from a `.shp` file and its `.dbf`/`.prj` sidecars.
///
/// Numeric attributes become `Float64` columns, text and dates `String`, logicals `Boolean`.
pub fn read_shapefile(path: &Path, options: &ShapefileOptions) -> Result<GeoTable> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut shapes = Vec::new();
    let mut records = Vec::new();
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .with_context(|| format!("[io::shp] Error reading record {i} of {}", path.display()))?;
        shapes.push(shape_to_multipolygon(shape)
            .with_context(|| format!("[io::shp] Record {i} of {}", path.display()))?);
        records.push(record);
    }

    let ids = match &options.id_field {
        Some(field) => records.iter()
            .map(|record| id_field(record, field))
            .collect::<Result<Vec<_>>>()?,
        None => (0..records.len()).map(|i| i.to_string()).collect(),
    };
    let data = records_to_dataframe(&records, options.id_field.as_deref())?;

    let crs = match &options.crs {
        Some(crs) => Some(crs.clone()),
        None => read_prj(path)?,
    };
    if crs.is_none() {
        debug!(target: "popmap::io", path = %path.display(), "no .prj sidecar, reference system unknown");
    }

    info!(target: "popmap::io", path = %path.display(), units = ids.len(), columns = data.width(), "read shapefile");
    GeoTable::new(ids, shapes, crs)
        .and_then(|table| table.with_data(data))
        .with_context(|| format!("[io::shp] Invalid table in {}", path.display()))
}

/// Reference system from the `.prj` file next to `path`, if there is one.
fn read_prj(path: &Path) -> Result<Option<Crs>> {
    let prj = path.with_extension("prj");
    if !prj.is_file() { return Ok(None) }

    let wkt = fs::read_to_string(&prj)
        .with_context(|| format!("[io::shp] Failed to read {}", prj.display()))?;
    Ok(Some(Crs::from_wkt(&wkt)))
}

/// Convert a polygon shape to a MultiPolygon, attaching each inner ring to the outer ring before it.
fn shape_to_multipolygon(shape: Shape) -> Result<MultiPolygon<f64>> {
    fn convert<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
        let mut polys = Vec::new();
        let mut exterior: Option<LineString<f64>> = None;
        let mut holes = Vec::new();

        for ring in rings {
            // LineString::new closes the ring once it becomes part of a Polygon.
            let line = LineString::new(ring.points().iter().map(&xy).collect());
            match ring {
                PolygonRing::Outer(_) => {
                    if let Some(ext) = exterior.replace(line) {
                        polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                    }
                }
                PolygonRing::Inner(_) => holes.push(line),
            }
        }
        if let Some(ext) = exterior {
            polys.push(Polygon::new(ext, holes));
        }

        MultiPolygon(polys)
    }

    Ok(match shape {
        Shape::Polygon(p) => convert(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::PolygonM(p) => convert(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::PolygonZ(p) => convert(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::NullShape => MultiPolygon(vec![]),
        other => bail!("expected a polygon shape, found {:?}", other.shapetype()),
    })
}

/// Unit id from `field`; whole numbers are written without a fractional part.
fn id_field(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        Some(FieldValue::Numeric(Some(n))) if n.fract() == 0.0 => Ok(format!("{n:.0}")),
        Some(FieldValue::Numeric(Some(n))) => Ok(n.to_string()),
        Some(FieldValue::Integer(n)) => Ok(n.to_string()),
        Some(value) => bail!("[io::shp] id field {field:?} has unusable value {value:?}"),
        None => bail!("[io::shp] missing id field {field:?}"),
    }
}

enum Values {
    Float(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

impl Values {
    fn for_value(value: &FieldValue, capacity: usize) -> Self {
        match value {
            FieldValue::Numeric(_) | FieldValue::Float(_) | FieldValue::Integer(_)
            | FieldValue::Double(_) | FieldValue::Currency(_) => Values::Float(Vec::with_capacity(capacity)),
            FieldValue::Logical(_) => Values::Bool(Vec::with_capacity(capacity)),
            _ => Values::Str(Vec::with_capacity(capacity)),
        }
    }

    /// Append `value`, or null when it does not fit the column type.
    fn push(&mut self, value: Option<&FieldValue>) {
        match self {
            Values::Float(v) => v.push(match value {
                Some(FieldValue::Numeric(n)) => *n,
                Some(FieldValue::Float(n)) => n.map(f64::from),
                Some(FieldValue::Integer(n)) => Some(f64::from(*n)),
                Some(FieldValue::Double(n)) | Some(FieldValue::Currency(n)) => Some(*n),
                _ => None,
            }),
            Values::Bool(v) => v.push(match value {
                Some(FieldValue::Logical(b)) => *b,
                _ => None,
            }),
            Values::Str(v) => v.push(match value {
                Some(FieldValue::Character(s)) => s.as_ref().map(|s| s.trim().to_string()),
                Some(FieldValue::Memo(s)) => Some(s.clone()),
                Some(FieldValue::Date(Some(d))) => Some(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
                _ => None,
            }),
        }
    }

    fn into_column(self, name: &str) -> Column {
        match self {
            Values::Float(v) => Column::new(name.into(), v),
            Values::Str(v) => Column::new(name.into(), v),
            Values::Bool(v) => Column::new(name.into(), v),
        }
    }
}

/// Attribute columns (except the id field) in name order.
fn records_to_dataframe(records: &[Record], id_field: Option<&str>) -> Result<DataFrame> {
    let Some(first) = records.first() else { return Ok(DataFrame::empty()) };

    let mut names = first.clone().into_iter()
        .map(|(name, _)| name)
        .filter(|name| Some(name.as_str()) != id_field)
        .collect::<Vec<_>>();
    names.sort();

    let columns = names.iter()
        .map(|name| {
            let mut values = records.iter()
                .find_map(|record| record.get(name).filter(|v| !is_null(v)))
                .map_or(Values::Str(Vec::new()), |v| Values::for_value(v, records.len()));
            for record in records {
                values.push(record.get(name));
            }
            values.into_column(name)
        })
        .collect::<Vec<_>>();

    DataFrame::new(columns).context("[io::shp] Failed to build attribute table")
}

fn is_null(value: &FieldValue) -> bool {
    matches!(
        value,
        FieldValue::Character(None) | FieldValue::Numeric(None) | FieldValue::Float(None)
            | FieldValue::Logical(None) | FieldValue::Date(None)
    )
}
