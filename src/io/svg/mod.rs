//! SVG map export.

mod color;
mod render;
mod writer;

pub(crate) use color::*;
pub use render::{render_groups, render_partition};
pub(crate) use writer::*;
