//! Bulk loading of definitions with per-source bookkeeping.
//!
//! Each definition is registered only if no definition of the same kind and
//! name was recorded in the [`NameStore`] before. Everything a source
//! registered can be withdrawn again with [`Bootstrapper::unload`].

use crate::error::ToggleError;
use crate::factory::Factory;
use crate::model::{Properties, Strategizable};
use crate::registry::{RegistrationId, key};
use crate::service::FeatureService;
use crate::strategy::StrategyKind;
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use toggle_domain::constants::NAME;
use tracing::{debug, info, warn};

/// A definitions document: loosely typed records for each entity kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Definitions {
    pub features: Vec<Properties>,
    pub groups: Vec<Properties>,
    pub strategies: Vec<StrategyRecord>,
}

impl Definitions {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.groups.is_empty() && self.strategies.is_empty()
    }

    /// Appends every record of `other`.
    pub fn extend(&mut self, other: Self) {
        self.features.extend(other.features);
        self.groups.extend(other.groups);
        self.strategies.extend(other.strategies);
    }
}

/// A built-in strategy record, tagged with its variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    #[serde(rename = "type", alias = "kind")]
    pub kind: StrategyKind,
    #[serde(flatten)]
    pub properties: Properties,
}

/// Set of names already claimed by loaded definitions.
pub trait NameStore: Send + Sync + fmt::Debug {
    fn contains(&self, name: &str) -> bool;

    /// Returns `false` if the name was already present.
    fn insert(&self, name: &str) -> bool;

    /// Returns `false` if the name was absent.
    fn remove(&self, name: &str) -> bool;

    fn names(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct MemoryNameStore {
    names: RwLock<FxHashSet<String>>,
}

impl MemoryNameStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameStore for MemoryNameStore {
    fn contains(&self, name: &str) -> bool {
        self.names.read().contains(name)
    }

    fn insert(&self, name: &str) -> bool {
        self.names.write().insert(name.to_owned())
    }

    fn remove(&self, name: &str) -> bool {
        self.names.write().remove(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.names.read().iter().cloned().collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Feature,
    Group,
    Strategy,
}

impl Kind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Group => "group",
            Self::Strategy => "strategy",
        }
    }

    /// Store entry for a name; kinds live in separate namespaces.
    fn store_key(self, name: &str) -> String {
        format!("{}:{}", self.as_str(), key(name.trim()))
    }
}

#[derive(Debug)]
struct Loaded {
    kind: Kind,
    id: RegistrationId,
    store_key: String,
}

/// A definition that could not be registered.
#[derive(Debug)]
pub struct Rejection {
    pub kind: &'static str,
    pub name: Option<String>,
    pub error: ToggleError,
}

/// Outcome of one [`Bootstrapper::load`] call.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub registered: usize,
    /// Store entries of definitions skipped because their name was already claimed.
    pub skipped: Vec<String>,
    pub rejected: Vec<Rejection>,
}

impl BootstrapReport {
    /// Whether every definition was registered.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.rejected.is_empty()
    }
}

/// Loads [`Definitions`] into a [`FeatureService`], remembering what each source registered.
#[derive(Debug)]
pub struct Bootstrapper {
    service: FeatureService,
    store: Arc<dyn NameStore>,
    loaded: Mutex<FxHashMap<String, Vec<Loaded>>>,
}

impl Bootstrapper {
    pub fn new(service: FeatureService) -> Self {
        Self::with_store(service, Arc::new(MemoryNameStore::new()))
    }

    pub fn with_store(service: FeatureService, store: Arc<dyn NameStore>) -> Self {
        Self { service, store, loaded: Mutex::new(FxHashMap::default()) }
    }

    pub const fn service(&self) -> &FeatureService {
        &self.service
    }

    pub fn store(&self) -> &Arc<dyn NameStore> {
        &self.store
    }

    /// Registers strategies, then groups, then features. Invalid records are
    /// reported and never abort the load.
    pub fn load(&self, source: &str, definitions: &Definitions) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        let mut loaded = Vec::new();

        for record in &definitions.strategies {
            match Factory::strategy_from_properties(record.kind, &record.properties) {
                Ok(definition) => {
                    self.admit(Kind::Strategy, &definition.name, &mut report, &mut loaded, || {
                        self.service.register_strategy(&definition)
                    });
                },
                Err(error) => reject(&mut report, Kind::Strategy, &record.properties, error),
            }
        }

        for properties in &definitions.groups {
            match Factory::group_from_properties(properties) {
                Ok(group) => {
                    let name = group.name().to_owned();
                    self.admit(Kind::Group, &name, &mut report, &mut loaded, || {
                        self.service.register_group(group)
                    });
                },
                Err(error) => reject(&mut report, Kind::Group, properties, error),
            }
        }

        for properties in &definitions.features {
            match Factory::feature_from_properties(properties) {
                Ok(feature) => {
                    let name = feature.name().to_owned();
                    self.admit(Kind::Feature, &name, &mut report, &mut loaded, || {
                        self.service.register_feature(feature)
                    });
                },
                Err(error) => reject(&mut report, Kind::Feature, properties, error),
            }
        }

        self.loaded.lock().entry(source.to_owned()).or_default().extend(loaded);

        info!(
            source,
            registered = report.registered,
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            "Definitions loaded"
        );
        report
    }

    /// Withdraws everything `source` registered and releases its names.
    /// Returns the number of registrations withdrawn.
    pub fn unload(&self, source: &str) -> usize {
        let Some(loaded) = self.loaded.lock().remove(source) else {
            debug!(source, "Nothing to unload");
            return 0;
        };

        let mut withdrawn = 0;
        for entry in loaded.into_iter().rev() {
            let removed = match entry.kind {
                Kind::Feature => self.service.unregister_feature(entry.id),
                Kind::Group => self.service.unregister_group(entry.id),
                Kind::Strategy => self.service.unregister_strategy(entry.id),
            };
            self.store.remove(&entry.store_key);
            withdrawn += usize::from(removed);
        }

        info!(source, withdrawn, "Definitions unloaded");
        withdrawn
    }

    pub fn reload(&self, source: &str, definitions: &Definitions) -> BootstrapReport {
        self.unload(source);
        self.load(source, definitions)
    }

    /// Sources with at least one remembered registration, sorted.
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<_> = self.loaded.lock().keys().cloned().collect();
        sources.sort_unstable();
        sources
    }

    fn admit(
        &self,
        kind: Kind,
        name: &str,
        report: &mut BootstrapReport,
        loaded: &mut Vec<Loaded>,
        register: impl FnOnce() -> Result<RegistrationId, ToggleError>,
    ) {
        let store_key = kind.store_key(name);
        if !self.store.insert(&store_key) {
            debug!(kind = kind.as_str(), name, "Name already claimed; skipping definition");
            report.skipped.push(store_key);
            return;
        }

        match register() {
            Ok(id) => {
                loaded.push(Loaded { kind, id, store_key });
                report.registered += 1;
            },
            Err(error) => {
                self.store.remove(&store_key);
                warn!(kind = kind.as_str(), name, error.code = error.code(), %error, "Definition rejected");
                report.rejected.push(Rejection {
                    kind: kind.as_str(),
                    name: Some(name.to_owned()),
                    error,
                });
            },
        }
    }
}

fn reject(report: &mut BootstrapReport, kind: Kind, properties: &Properties, error: ToggleError) {
    let name = properties.get(NAME).and_then(Value::as_str).map(str::to_owned);
    warn!(kind = kind.as_str(), name = ?name, error.code = error.code(), %error, "Definition rejected");
    report.rejected.push(Rejection { kind: kind.as_str(), name, error });
}

#[cfg(test)]
mod tests {
    use super::{Kind, MemoryNameStore, NameStore};

    #[test]
    fn store_keys_are_namespaced_and_case_insensitive() {
        assert_eq!(Kind::Feature.store_key(" Dark-Mode "), "feature:dark-mode");
        assert_ne!(Kind::Group.store_key("x"), Kind::Feature.store_key("x"));
    }

    #[test]
    fn memory_store_tracks_names() {
        let store = MemoryNameStore::new();
        assert!(store.insert("b"));
        assert!(store.insert("a"));
        assert!(!store.insert("a"));
        assert_eq!(store.names(), vec!["a", "b"]);
        assert!(store.remove("a"));
        assert!(!store.contains("a"));
        assert!(!store.remove("a"));
    }
}
