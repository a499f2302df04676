mod groups;
mod io;
mod partition;

pub use groups::GroupAssignment;
pub use partition::Partition;
