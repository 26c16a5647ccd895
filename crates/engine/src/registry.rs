//! Name-keyed registry with deterministic conflict resolution.
//!
//! Several instances may be registered under the same (case-insensitive) name.
//! Exactly one of them is active: the highest ranking wins, and on equal
//! ranking the earliest registration wins. The others stay shadowed until the
//! active one is withdrawn.

use crate::error::ToggleError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Opaque handle of one registration, ordered by registration sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RegistrationId(u64);

impl RegistrationId {
    fn next() -> Self {
        Self(SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Case-insensitive identity of a name.
pub(crate) fn key(name: &str) -> String {
    name.to_lowercase()
}

#[derive(Debug)]
struct Entry<T: ?Sized> {
    id: RegistrationId,
    ranking: i32,
    value: Arc<T>,
}

impl<T: ?Sized> Entry<T> {
    /// Whether `self` takes precedence over `other`.
    fn outranks(&self, other: &Self) -> bool {
        (self.ranking, std::cmp::Reverse(self.id)) > (other.ranking, std::cmp::Reverse(other.id))
    }
}

#[derive(Debug)]
struct Slots<T: ?Sized> {
    by_name: FxHashMap<String, Vec<Entry<T>>>,
    by_id: FxHashMap<RegistrationId, String>,
}

impl<T: ?Sized> Default for Slots<T> {
    fn default() -> Self {
        Self { by_name: FxHashMap::default(), by_id: FxHashMap::default() }
    }
}

impl<T: ?Sized> Slots<T> {
    fn insert(&mut self, key: String, entry: Entry<T>) -> usize {
        let id = entry.id;
        let entries = self.by_name.entry(key.clone()).or_default();
        let at = entries.partition_point(|existing| existing.outranks(&entry));
        entries.insert(at, entry);
        self.by_id.insert(id, key);
        entries.len()
    }

    fn remove(&mut self, id: RegistrationId) -> Option<(String, Entry<T>)> {
        let key = self.by_id.remove(&id)?;
        let entries = self.by_name.get_mut(&key)?;
        let at = entries.iter().position(|e| e.id == id)?;
        let entry = entries.remove(at);
        if entries.is_empty() {
            self.by_name.remove(&key);
        }
        Some((key, entry))
    }
}

/// A registered instance together with its registration metadata.
#[derive(Debug)]
pub struct Registered<T: ?Sized> {
    pub id: RegistrationId,
    pub ranking: i32,
    pub value: Arc<T>,
}

impl<T: ?Sized> Clone for Registered<T> {
    fn clone(&self) -> Self {
        Self { id: self.id, ranking: self.ranking, value: Arc::clone(&self.value) }
    }
}

/// Concurrent multimap from name to ranked instances.
///
/// Every write holds the lock for the whole insert/remove and re-sort, so a
/// reader always sees exactly one active instance per registered name.
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    slots: RwLock<Slots<T>>,
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("kind", &self.kind).field("names", &self.len()).finish()
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self { kind, slots: RwLock::new(Slots::default()) }
    }

    /// Adds an instance under `name`. Duplicates never fail; they are ranked.
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] when `name` is empty.
    pub fn register(
        &self,
        name: &str,
        ranking: i32,
        value: Arc<T>,
    ) -> Result<RegistrationId, ToggleError> {
        let key = self.validated_key(name)?;
        let id = RegistrationId::next();

        let (count, active) = {
            let mut slots = self.slots.write();
            let count = slots.insert(key.clone(), Entry { id, ranking, value });
            let active = slots.by_name.get(&key).and_then(|e| e.first()).map(|e| e.id);
            (count, active)
        };

        debug!(kind = self.kind, name, %id, ranking, "Registered");
        if count > 1 {
            warn!(
                kind = self.kind,
                name,
                active = ?active,
                shadowed = count - 1,
                "Several instances share one name; lower ranked ones are shadowed"
            );
        }
        Ok(id)
    }

    /// Replaces the instance registered under `id`, keeping its id and sequence.
    ///
    /// The instance moves if `name` differs from the registered one. Returns the
    /// previous instance, or `None` when `id` is unknown.
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] when `name` is empty.
    pub fn replace(
        &self,
        id: RegistrationId,
        name: &str,
        ranking: i32,
        value: Arc<T>,
    ) -> Result<Option<Arc<T>>, ToggleError> {
        let key = self.validated_key(name)?;

        let previous = {
            let mut slots = self.slots.write();
            let Some((_, previous)) = slots.remove(id) else {
                return Ok(None);
            };
            slots.insert(key, Entry { id, ranking, value });
            previous.value
        };

        debug!(kind = self.kind, name, %id, ranking, "Replaced");
        Ok(Some(previous))
    }

    /// Rewrites the active instance for `name` in place.
    ///
    /// `f` runs under the write lock, so no other writer can slip in between
    /// reading the current instance and storing its successor. Id, ranking and
    /// name stay as they were; `f` must not rename the instance.
    pub fn modify(&self, name: &str, f: impl FnOnce(&T) -> Arc<T>) -> Option<Registered<T>> {
        if name.is_empty() {
            return None;
        }
        let modified = {
            let mut slots = self.slots.write();
            let entry = slots.by_name.get_mut(&key(name))?.first_mut()?;
            entry.value = f(&entry.value);
            Registered { id: entry.id, ranking: entry.ranking, value: Arc::clone(&entry.value) }
        };

        debug!(kind = self.kind, name, id = %modified.id, "Modified");
        Some(modified)
    }

    /// Withdraws one registration, promoting the next shadowed instance if any.
    pub fn unregister(&self, id: RegistrationId) -> Option<Arc<T>> {
        let (key, entry) = self.slots.write().remove(id)?;
        debug!(kind = self.kind, name = %key, %id, "Unregistered");
        Some(entry.value)
    }

    /// The active instance for `name`, compared case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<Arc<T>> {
        self.active(name).map(|r| r.value)
    }

    /// The active instance for `name` with its registration metadata.
    pub fn active(&self, name: &str) -> Option<Registered<T>> {
        if name.is_empty() {
            return None;
        }
        let slots = self.slots.read();
        slots.by_name.get(&key(name)).and_then(|e| e.first()).map(|e| Registered {
            id: e.id,
            ranking: e.ranking,
            value: Arc::clone(&e.value),
        })
    }

    /// The instance registered under `id`, active or shadowed.
    pub fn get(&self, id: RegistrationId) -> Option<Registered<T>> {
        let slots = self.slots.read();
        let key = slots.by_id.get(&id)?;
        slots.by_name.get(key)?.iter().find(|e| e.id == id).map(|e| Registered {
            id: e.id,
            ranking: e.ranking,
            value: Arc::clone(&e.value),
        })
    }

    /// Snapshot of the active instances, one per name, ordered by name.
    pub fn all(&self) -> Vec<Arc<T>> {
        let slots = self.slots.read();
        let mut active: Vec<_> = slots
            .by_name
            .iter()
            .filter_map(|(key, entries)| entries.first().map(|e| (key, Arc::clone(&e.value))))
            .collect();
        active.sort_unstable_by(|a, b| a.0.cmp(b.0));
        active.into_iter().map(|(_, value)| value).collect()
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.slots.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validated_key(&self, name: &str) -> Result<String, ToggleError> {
        if name.trim().is_empty() {
            return Err(ToggleError::Validation {
                message: format!("{} name cannot be empty", self.kind).into(),
                context: None,
            });
        }
        Ok(key(name))
    }
}
