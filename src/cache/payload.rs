use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Assignment, GroupAssignment, TableSnapshot};

/// Kind tag of a cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    GeoTable,
    Assignment,
    Groups,
}

impl PayloadKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            PayloadKind::GeoTable => "geo_table",
            PayloadKind::Assignment => "assignment",
            PayloadKind::Groups => "groups",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Everything the cache knows how to persist, one variant per payload kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// A loaded geometry table.
    GeoTable(TableSnapshot),
    /// A computed source → target assignment.
    Assignment(Assignment),
    /// A raw unit → group mapping.
    Groups(GroupAssignment),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::GeoTable(_) => PayloadKind::GeoTable,
            Payload::Assignment(_) => PayloadKind::Assignment,
            Payload::Groups(_) => PayloadKind::Groups,
        }
    }
}
