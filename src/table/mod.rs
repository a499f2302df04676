mod crs;
mod snapshot;
mod table;

pub use crs::Crs;
pub use snapshot::{ColumnSnapshot, ColumnValues, TableSnapshot};
pub use table::GeoTable;
