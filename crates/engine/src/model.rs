//! Immutable feature and group definitions.
//!
//! Instances are never mutated once registered; management operations replace
//! them with modified copies.

use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use toggle_domain::constants::{DESCRIPTION, ENABLED, GROUPS, NAME, SERVICE_RANKING, STRATEGY};

/// Loosely typed key/value map definitions are built from and carry as metadata.
pub type Properties = serde_json::Map<String, Value>;

/// Capability shared by [`Feature`] and [`FeatureGroup`].
pub trait Strategizable: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Falls back to the name when none was configured.
    fn description(&self) -> &str;

    /// Name of the associated activation strategy, which may not be registered.
    fn strategy(&self) -> Option<&str>;

    /// The static enabled flag.
    fn enabled(&self) -> bool;

    /// Opaque metadata, not interpreted by the resolver.
    fn properties(&self) -> &Properties;

    /// The full property map: the metadata plus `name`, `description`,
    /// `enabled`, `strategy`, `groups` and `service.ranking`. This is what
    /// strategies evaluate and what change events carry.
    fn to_properties(&self) -> Properties;
}

/// A named, independently toggleable capability flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) strategy: Option<String>,
    pub(crate) groups: Vec<String>,
    pub(crate) enabled: bool,
    pub(crate) properties: Properties,
    pub(crate) ranking: i32,
}

/// A named collection of features; an enabled group forces its members on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureGroup {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) strategy: Option<String>,
    pub(crate) enabled: bool,
    pub(crate) properties: Properties,
    pub(crate) ranking: i32,
}

impl Feature {
    /// Group names in declaration order, without duplicates.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub const fn ranking(&self) -> i32 {
        self.ranking
    }

    /// Whether the feature declares membership of `group`, compared case-insensitively.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.to_lowercase() == group.to_lowercase())
    }

    #[must_use]
    pub(crate) fn with_enabled(&self, enabled: bool) -> Self {
        Self { enabled, ..self.clone() }
    }

    /// Flattens the feature back into the property map shape it can be built from.
    fn flatten(&self) -> Properties {
        let mut map = self.properties.clone();
        map.insert(NAME.to_owned(), json!(self.name));
        map.insert(DESCRIPTION.to_owned(), json!(self.description));
        map.insert(ENABLED.to_owned(), json!(self.enabled));
        if let Some(strategy) = &self.strategy {
            map.insert(STRATEGY.to_owned(), json!(strategy));
        }
        if !self.groups.is_empty() {
            map.insert(GROUPS.to_owned(), json!(self.groups));
        }
        map.insert(SERVICE_RANKING.to_owned(), json!(self.ranking));
        map
    }
}

impl FeatureGroup {
    pub const fn ranking(&self) -> i32 {
        self.ranking
    }

    #[must_use]
    pub(crate) fn with_enabled(&self, enabled: bool) -> Self {
        Self { enabled, ..self.clone() }
    }

    /// Flattens the group back into the property map shape it can be built from.
    fn flatten(&self) -> Properties {
        let mut map = self.properties.clone();
        map.insert(NAME.to_owned(), json!(self.name));
        map.insert(DESCRIPTION.to_owned(), json!(self.description));
        map.insert(ENABLED.to_owned(), json!(self.enabled));
        if let Some(strategy) = &self.strategy {
            map.insert(STRATEGY.to_owned(), json!(strategy));
        }
        map.insert(SERVICE_RANKING.to_owned(), json!(self.ranking));
        map
    }
}

macro_rules! strategizable {
    ($ty:ty) => {
        impl Strategizable for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn description(&self) -> &str {
                &self.description
            }

            fn strategy(&self) -> Option<&str> {
                self.strategy.as_deref()
            }

            fn enabled(&self) -> bool {
                self.enabled
            }

            fn properties(&self) -> &Properties {
                &self.properties
            }

            fn to_properties(&self) -> Properties {
                self.flatten()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.name)
            }
        }
    };
}

strategizable!(Feature);
strategizable!(FeatureGroup);
