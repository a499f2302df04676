mod bbox;
mod geom;
mod overlap;

use bbox::BoundingBox;
pub(crate) use geom::Geometries;
pub use overlap::assign;
