mod fs;
mod name;

pub(crate) use fs::*;
pub(crate) use name::*;
