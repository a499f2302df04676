use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, GeoTable, Result};

/// Mapping from each source unit (by row position) to the target unit it belongs to.
///
/// `None` marks a source unit that overlaps no target unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAssignment")]
pub struct Assignment {
    targets: Vec<Option<u32>>,
    num_targets: usize,
}

/// Unchecked serde form; every decoded assignment goes through [`Assignment::new`].
#[derive(Deserialize)]
struct RawAssignment {
    targets: Vec<Option<u32>>,
    num_targets: usize,
}

impl TryFrom<RawAssignment> for Assignment {
    type Error = Error;

    fn try_from(raw: RawAssignment) -> Result<Self> {
        Self::new(raw.targets, raw.num_targets)
    }
}

impl Assignment {
    /// Construct an assignment over `num_targets` target units.
    pub fn new(targets: Vec<Option<u32>>, num_targets: usize) -> Result<Self> {
        let assignment = Self { targets, num_targets };
        assignment.check_targets()?;
        Ok(assignment)
    }

    /// Number of source units covered.
    #[inline] pub fn num_sources(&self) -> usize { self.targets.len() }

    /// Number of target units the assignment refers to.
    #[inline] pub fn num_targets(&self) -> usize { self.num_targets }

    /// Target position per source position.
    #[inline] pub fn targets(&self) -> &[Option<u32>] { &self.targets }

    /// Target position of source unit `source`, or `None` if unassigned.
    #[inline] pub fn get(&self, source: usize) -> Option<u32> { self.targets.get(source).copied().flatten() }

    /// Positions of source units with no target.
    pub fn unassigned(&self) -> impl Iterator<Item = usize> + '_ {
        self.targets.iter().enumerate()
            .filter_map(|(i, target)| target.is_none().then_some(i))
    }

    /// Count of source units with no target.
    pub fn num_unassigned(&self) -> usize { self.unassigned().count() }

    /// Source positions assigned to each target, indexed by target position.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.num_targets];
        for (source, target) in self.targets.iter().enumerate() {
            if let Some(target) = target {
                members[*target as usize].push(source);
            }
        }
        members
    }

    /// Expand into a map from source id to target id using the tables it was computed on.
    pub fn to_id_map(&self, source: &GeoTable, target: &GeoTable) -> Result<BTreeMap<String, Option<String>>> {
        self.check_fits(source.len(), target.len())?;

        Ok(source.ids().iter().zip(&self.targets)
            .map(|(id, part)| (id.clone(), part.map(|p| target.id(p as usize).to_string())))
            .collect())
    }

    /// Ensure the assignment describes `num_sources` source and `num_targets` target units.
    pub(crate) fn check_fits(&self, num_sources: usize, num_targets: usize) -> Result<()> {
        if self.num_sources() != num_sources {
            return Err(Error::AssignmentMismatch(format!(
                "covers {} source units, table has {}", self.num_sources(), num_sources
            )));
        }
        if self.num_targets != num_targets {
            return Err(Error::AssignmentMismatch(format!(
                "refers to {} target units, table has {}", self.num_targets, num_targets
            )));
        }
        self.check_targets()
    }

    fn check_targets(&self) -> Result<()> {
        match self.targets.iter().flatten().find(|&&t| t as usize >= self.num_targets) {
            Some(t) => Err(Error::AssignmentMismatch(format!(
                "target {} out of range for {} target units", t, self.num_targets
            ))),
            None => Ok(()),
        }
    }
}
