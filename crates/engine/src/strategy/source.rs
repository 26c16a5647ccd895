use fxhash::FxHashMap;
use std::fmt;

/// Read-only view of process-wide key/value pairs.
pub trait PropertySource: Send + Sync + fmt::Debug {
    /// Returns `true` as soon as `predicate` accepts one pair.
    fn any(&self, predicate: &mut dyn FnMut(&str, &str) -> bool) -> bool;
}

/// The process environment, read at every evaluation.
///
/// Variables whose key or value is not valid UTF-8 are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentSource;

impl PropertySource for EnvironmentSource {
    fn any(&self, predicate: &mut dyn FnMut(&str, &str) -> bool) -> bool {
        std::env::vars_os().any(|(key, value)| match (key.to_str(), value.to_str()) {
            (Some(key), Some(value)) => predicate(key, value),
            _ => false,
        })
    }
}

/// Fixed key/value pairs, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    values: FxHashMap<String, String>,
}

impl StaticSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Adds a key/value pair"]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl PropertySource for StaticSource {
    fn any(&self, predicate: &mut dyn FnMut(&str, &str) -> bool) -> bool {
        self.values.iter().any(|(key, value)| predicate(key, value))
    }
}
