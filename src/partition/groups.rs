use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

/// Raw unit → group mapping, ordered by unit id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupAssignment(BTreeMap<String, String>);

impl GroupAssignment {
    pub fn new() -> Self { Self::default() }

    /// Assign `unit` to `group`, returning its previous group.
    pub fn insert(&mut self, unit: impl Into<String>, group: impl Into<String>) -> Option<String> {
        self.0.insert(unit.into(), group.into())
    }

    /// Group of `unit`, if assigned.
    #[inline] pub fn get(&self, unit: &str) -> Option<&str> { self.0.get(unit).map(String::as_str) }

    #[inline] pub fn len(&self) -> usize { self.0.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// (unit, group) pairs in unit order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(unit, group)| (unit.as_str(), group.as_str()))
    }

    #[inline] pub fn as_map(&self) -> &BTreeMap<String, String> { &self.0 }

    #[inline] pub fn into_map(self) -> BTreeMap<String, String> { self.0 }
}

impl From<BTreeMap<String, String>> for GroupAssignment {
    fn from(map: BTreeMap<String, String>) -> Self { Self(map) }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GroupAssignment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(unit, group)| (unit.into(), group.into())).collect())
    }
}

impl IntoIterator for GroupAssignment {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}
