//! Activation strategies: pluggable enablement rules.
//!
//! Two built-in variants match a key/value pattern pair against either the
//! process-wide [`PropertySource`] or the properties of the evaluated target.
//! Anything else implements [`ActivationStrategy`] directly.

mod matcher;
mod service;
mod source;
mod system;

pub use matcher::PropertyMatcher;
pub use service::ServicePropertyStrategy;
pub use source::{EnvironmentSource, PropertySource, StaticSource};
pub use system::SystemPropertyStrategy;

use crate::model::{Properties, Strategizable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rule computing enablement from contextual signals.
pub trait ActivationStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        self.name()
    }

    /// Decides enablement of `target`; `properties` is its full property map.
    fn is_enabled(&self, target: &dyn Strategizable, properties: &Properties) -> bool;

    /// Configuration snapshot attached to change notifications.
    fn properties(&self) -> Properties {
        Properties::new()
    }
}

/// Built-in strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Matches process-wide key/value pairs.
    #[serde(alias = "system")]
    SystemProperty,
    /// Matches the properties of the evaluated feature or group.
    #[serde(alias = "service")]
    ServiceProperty,
}

impl StrategyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SystemProperty => "system_property",
            Self::ServiceProperty => "service_property",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed definition of a built-in strategy.
///
/// Empty strings count as absent. A definition without both patterns yields a
/// strategy that always evaluates to disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    pub kind: StrategyKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub property_key: Option<String>,
    #[serde(default)]
    pub property_value: Option<String>,
    #[serde(default)]
    pub ranking: i32,
}

impl StrategyDefinition {
    pub fn new(kind: StrategyKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            property_key: None,
            property_value: None,
            ranking: 0,
        }
    }

    #[must_use = "Sets the strategy description"]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets both patterns, each matched against the whole key or value.
    #[must_use = "Sets the key and value patterns"]
    pub fn pattern(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.property_key = Some(key.into());
        self.property_value = Some(value.into());
        self
    }

    #[must_use = "Sets the registry ranking"]
    pub const fn ranking(mut self, ranking: i32) -> Self {
        self.ranking = ranking;
        self
    }
}
