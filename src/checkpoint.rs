use std::{fmt, path::PathBuf};

use tracing::info;

use crate::{
    Assignment, Cache, Error, GeoTable, GroupAssignment, Partition, Result, TableSnapshot,
    cache::{Payload, PayloadKind},
};

/// A value that can be checkpointed.
///
/// `to_payload` chooses what is persisted; `View` is what comes back from the cache.
/// For plain values the view is the value itself. Grouping objects persist only
/// their unit → group assignment, so their view is the raw assignment.
pub trait Cacheable: Sized {
    /// Payload kind written by `to_payload`.
    const KIND: PayloadKind;

    /// Shape of the value as it is restored from the cache.
    type View;

    fn to_payload(&self) -> Result<Payload>;

    /// Reinterpret a payload. `None` if it holds a different kind, `Some(Err)` if it has
    /// the right kind but does not form a valid view.
    fn view_from_payload(payload: Payload) -> Option<Result<Self::View>>;

    /// Reduce a freshly computed value to its persisted view.
    fn into_view(self) -> Self::View;
}

/// Result of a checkpoint: freshly computed, or restored from the cache.
pub enum Checkpointed<T: Cacheable> {
    Computed(T),
    Restored(T::View),
}

impl<T: Cacheable> Checkpointed<T> {
    #[inline] pub fn is_restored(&self) -> bool { matches!(self, Checkpointed::Restored(_)) }

    #[inline] pub fn is_computed(&self) -> bool { matches!(self, Checkpointed::Computed(_)) }

    /// The persisted view, regardless of where the value came from.
    pub fn into_view(self) -> T::View {
        match self {
            Checkpointed::Computed(value) => value.into_view(),
            Checkpointed::Restored(view) => view,
        }
    }
}

impl<T: Cacheable<View = T>> Checkpointed<T> {
    /// The value itself, for types that persist in full.
    pub fn into_inner(self) -> T {
        match self {
            Checkpointed::Computed(value) | Checkpointed::Restored(value) => value,
        }
    }
}

impl<T> fmt::Debug for Checkpointed<T>
where
    T: Cacheable + fmt::Debug,
    T::View: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpointed::Computed(value) => f.debug_tuple("Computed").field(value).finish(),
            Checkpointed::Restored(view) => f.debug_tuple("Restored").field(view).finish(),
        }
    }
}

/// Compute-or-load wrapper around pipeline stages, backed by a [`Cache`].
#[derive(Debug, Clone)]
pub struct Checkpointer {
    cache: Cache,
}

impl Checkpointer {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Checkpoints stored under `dir` with default cache settings.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Cache::new(dir))
    }

    #[inline] pub fn cache(&self) -> &Cache { &self.cache }

    /// Return the checkpoint `name`, running `producer` only if it is not cached yet.
    ///
    /// On a miss the produced value's cacheable view is stored and the value itself is
    /// returned as [`Checkpointed::Computed`]. On a hit `producer` is not called and the
    /// stored view comes back as [`Checkpointed::Restored`]. Producer errors propagate
    /// and nothing is stored.
    pub fn checkpoint<T, E, F>(&self, name: &str, producer: F) -> Result<Checkpointed<T>, E>
    where
        T: Cacheable,
        E: From<Error>,
        F: FnOnce() -> Result<T, E>,
    {
        self.cache.ensure_dir()?;

        if let Some(view) = self.cache.load_view::<T>(name)? {
            info!(target: "popmap::checkpoint", name, "loaded from cache");
            return Ok(Checkpointed::Restored(view));
        }

        info!(target: "popmap::checkpoint", name, "computing");
        let value = producer()?;
        self.cache.store_value(name, &value)?;
        info!(
            target: "popmap::checkpoint",
            name,
            path = %self.cache.entry_path(name).display(),
            "saved"
        );

        Ok(Checkpointed::Computed(value))
    }
}

impl Cacheable for GeoTable {
    const KIND: PayloadKind = PayloadKind::GeoTable;
    type View = GeoTable;

    fn to_payload(&self) -> Result<Payload> {
        Ok(Payload::GeoTable(TableSnapshot::of(self)?))
    }

    fn view_from_payload(payload: Payload) -> Option<Result<Self::View>> {
        match payload {
            Payload::GeoTable(snapshot) => Some(snapshot.into_table()),
            _ => None,
        }
    }

    fn into_view(self) -> Self::View { self }
}

impl Cacheable for Assignment {
    const KIND: PayloadKind = PayloadKind::Assignment;
    type View = Assignment;

    fn to_payload(&self) -> Result<Payload> {
        Ok(Payload::Assignment(self.clone()))
    }

    fn view_from_payload(payload: Payload) -> Option<Result<Self::View>> {
        match payload {
            Payload::Assignment(assignment) => Some(Ok(assignment)),
            _ => None,
        }
    }

    fn into_view(self) -> Self::View { self }
}

impl Cacheable for GroupAssignment {
    const KIND: PayloadKind = PayloadKind::Groups;
    type View = GroupAssignment;

    fn to_payload(&self) -> Result<Payload> {
        Ok(Payload::Groups(self.clone()))
    }

    fn view_from_payload(payload: Payload) -> Option<Result<Self::View>> {
        match payload {
            Payload::Groups(groups) => Some(Ok(groups)),
            _ => None,
        }
    }

    fn into_view(self) -> Self::View { self }
}

impl Cacheable for Partition {
    const KIND: PayloadKind = PayloadKind::Groups;
    type View = GroupAssignment;

    fn to_payload(&self) -> Result<Payload> {
        Ok(Payload::Groups(self.assignment().clone()))
    }

    fn view_from_payload(payload: Payload) -> Option<Result<Self::View>> {
        GroupAssignment::view_from_payload(payload)
    }

    fn into_view(self) -> Self::View { self.into_assignment() }
}
