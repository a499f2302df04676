#![doc = "Census population assignment onto voting precincts, with checkpointed stages"]
mod aggregate;
mod assignment;
mod cache;
mod checkpoint;
mod common;
mod error;
mod geom;
mod partition;
mod pipeline;
mod table;

pub mod io;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use table::{ColumnSnapshot, ColumnValues, Crs, GeoTable, TableSnapshot};

#[doc(inline)]
pub use assignment::Assignment;

#[doc(inline)]
pub use geom::assign;

#[doc(inline)]
pub use aggregate::{aggregate, aggregate_into, column_sums};

#[doc(inline)]
pub use cache::{Cache, CacheConfig, Payload, PayloadKind};

#[doc(inline)]
pub use checkpoint::{Cacheable, Checkpointed, Checkpointer};

#[doc(inline)]
pub use partition::{GroupAssignment, Partition};

#[doc(inline)]
pub use pipeline::{PopulationSource, assign_population_data, assignment_key, load_geotable_cached};
