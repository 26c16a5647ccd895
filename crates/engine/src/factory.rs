//! Validated construction of features, groups and strategies.
//!
//! Definitions come either from the staged builders, whose stages are fixed
//! (description, strategy, groups, properties, enabled), or from loosely typed
//! property maps.

use crate::error::ToggleError;
use crate::model::{Feature, FeatureGroup, Properties};
use crate::strategy::{
    ActivationStrategy, PropertyMatcher, PropertySource, ServicePropertyStrategy,
    StrategyDefinition, StrategyKind, SystemPropertyStrategy,
};
use private::Sealed;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use toggle_domain::constants::{
    DESCRIPTION, ENABLED, GROUPS, NAME, PROPERTIES, PROPERTY_KEY, PROPERTY_VALUE, RESERVED_KEYS,
    SERVICE_RANKING, STRATEGY,
};

#[derive(Debug)]
pub struct NeedsDescription;
#[derive(Debug)]
pub struct NeedsStrategy;
#[derive(Debug)]
pub struct NeedsGroups;
#[derive(Debug)]
pub struct NeedsProperties;
#[derive(Debug)]
pub struct NeedsEnabled;
#[derive(Debug)]
pub struct Ready;

mod private {
    pub trait Sealed {}
}
impl Sealed for NeedsDescription {}
impl Sealed for NeedsStrategy {}
impl Sealed for NeedsGroups {}
impl Sealed for NeedsProperties {}
impl Sealed for NeedsEnabled {}
impl Sealed for Ready {}

#[derive(Debug, Default)]
struct Draft {
    name: String,
    description: Option<String>,
    strategy: Option<String>,
    groups: Vec<String>,
    properties: Properties,
    enabled: bool,
    ranking: i32,
}

impl Draft {
    fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    fn validated_name(&self, kind: &str) -> Result<String, ToggleError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ToggleError::validation(format!("{kind} name cannot be null or empty")));
        }
        Ok(name.to_owned())
    }

    fn description_or(&mut self, name: &str) -> String {
        self.description.take().filter(|d| !d.is_empty()).unwrap_or_else(|| name.to_owned())
    }
}

/// Staged builder of a [`Feature`].
#[derive(Debug)]
pub struct FeatureBuilder<S: Sealed = NeedsDescription> {
    draft: Draft,
    stage: PhantomData<S>,
}

/// Staged builder of a [`FeatureGroup`]. Groups have no group stage.
#[derive(Debug)]
pub struct GroupBuilder<S: Sealed = NeedsDescription> {
    draft: Draft,
    stage: PhantomData<S>,
}

impl<S: Sealed> FeatureBuilder<S> {
    fn transition<N: Sealed>(self) -> FeatureBuilder<N> {
        FeatureBuilder { draft: self.draft, stage: PhantomData }
    }
}

impl<S: Sealed> GroupBuilder<S> {
    fn transition<N: Sealed>(self) -> GroupBuilder<N> {
        GroupBuilder { draft: self.draft, stage: PhantomData }
    }
}

impl FeatureBuilder<NeedsDescription> {
    /// Description shown to operators; defaults to the name.
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn description(mut self, description: Option<&str>) -> FeatureBuilder<NeedsStrategy> {
        self.draft.description = description.map(str::to_owned);
        self.transition()
    }
}

impl FeatureBuilder<NeedsStrategy> {
    /// Name of the activation strategy consulted when no group decides.
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn strategy(mut self, strategy: Option<&str>) -> FeatureBuilder<NeedsGroups> {
        self.draft.strategy = strategy.map(str::to_owned);
        self.transition()
    }
}

impl FeatureBuilder<NeedsGroups> {
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn groups(mut self, groups: &[&str]) -> FeatureBuilder<NeedsProperties> {
        self.draft.groups = groups.iter().map(|g| (*g).to_owned()).collect();
        self.transition()
    }
}

impl FeatureBuilder<NeedsProperties> {
    /// Opaque metadata, also visible to service-property strategies.
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn properties(mut self, properties: Properties) -> FeatureBuilder<NeedsEnabled> {
        self.draft.properties = properties;
        self.transition()
    }
}

impl FeatureBuilder<NeedsEnabled> {
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn enabled(mut self, enabled: bool) -> FeatureBuilder<Ready> {
        self.draft.enabled = enabled;
        self.transition()
    }
}

impl FeatureBuilder<Ready> {
    /// Registry ranking; higher wins among same-named features.
    #[must_use = "The builder must be built to produce a feature"]
    pub const fn ranking(mut self, ranking: i32) -> Self {
        self.draft.ranking = ranking;
        self
    }

    /// # Errors
    /// Returns [`ToggleError::Validation`] when the name is empty.
    pub fn build(mut self) -> Result<Feature, ToggleError> {
        let name = self.draft.validated_name("Feature")?;
        Ok(Feature {
            description: self.draft.description_or(&name),
            strategy: non_empty(self.draft.strategy),
            groups: distinct(self.draft.groups),
            enabled: self.draft.enabled,
            properties: self.draft.properties,
            ranking: self.draft.ranking,
            name,
        })
    }
}

impl GroupBuilder<NeedsDescription> {
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn description(mut self, description: Option<&str>) -> GroupBuilder<NeedsStrategy> {
        self.draft.description = description.map(str::to_owned);
        self.transition()
    }
}

impl GroupBuilder<NeedsStrategy> {
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn strategy(mut self, strategy: Option<&str>) -> GroupBuilder<NeedsProperties> {
        self.draft.strategy = strategy.map(str::to_owned);
        self.transition()
    }
}

impl GroupBuilder<NeedsProperties> {
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn properties(mut self, properties: Properties) -> GroupBuilder<NeedsEnabled> {
        self.draft.properties = properties;
        self.transition()
    }
}

impl GroupBuilder<NeedsEnabled> {
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn enabled(mut self, enabled: bool) -> GroupBuilder<Ready> {
        self.draft.enabled = enabled;
        self.transition()
    }
}

impl GroupBuilder<Ready> {
    #[must_use = "The builder must be built to produce a group"]
    pub const fn ranking(mut self, ranking: i32) -> Self {
        self.draft.ranking = ranking;
        self
    }

    /// # Errors
    /// Returns [`ToggleError::Validation`] when the name is empty.
    pub fn build(mut self) -> Result<FeatureGroup, ToggleError> {
        let name = self.draft.validated_name("Group")?;
        Ok(FeatureGroup {
            description: self.draft.description_or(&name),
            strategy: non_empty(self.draft.strategy),
            enabled: self.draft.enabled,
            properties: self.draft.properties,
            ranking: self.draft.ranking,
            name,
        })
    }
}

/// Entry point for every definition constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Factory;

impl Factory {
    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn feature(name: impl Into<String>) -> FeatureBuilder<NeedsDescription> {
        FeatureBuilder { draft: Draft::named(name), stage: PhantomData }
    }

    #[must_use = "The builder must reach the final stage before it can build"]
    pub fn group(name: impl Into<String>) -> GroupBuilder<NeedsDescription> {
        GroupBuilder { draft: Draft::named(name), stage: PhantomData }
    }

    /// Compiles a built-in strategy. `source` is only used by the system-property variant.
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] when the name is empty and
    /// [`ToggleError::Pattern`] when a pattern does not compile.
    pub fn strategy(
        definition: &StrategyDefinition,
        source: Arc<dyn PropertySource>,
    ) -> Result<Arc<dyn ActivationStrategy>, ToggleError> {
        let name = definition.name.trim();
        if name.is_empty() {
            return Err(ToggleError::validation("Strategy name cannot be null or empty"));
        }
        let description = definition
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(name)
            .to_owned();
        let matcher = PropertyMatcher::optional(
            definition.property_key.as_deref(),
            definition.property_value.as_deref(),
        )?;

        Ok(match definition.kind {
            StrategyKind::SystemProperty => {
                Arc::new(SystemPropertyStrategy::new(name.to_owned(), description, matcher, source))
            },
            StrategyKind::ServiceProperty => {
                Arc::new(ServicePropertyStrategy::new(name.to_owned(), description, matcher))
            },
        })
    }

    /// Builds a feature from a property map.
    ///
    /// Unrecognised keys are kept as extra properties; a nested `properties`
    /// object is merged into them.
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] for a missing name or a mistyped field.
    pub fn feature_from_properties(properties: &Properties) -> Result<Feature, ToggleError> {
        let groups = names(properties, GROUPS)?;
        let groups: Vec<&str> = groups.iter().map(String::as_str).collect();

        Self::feature(text(properties, NAME)?.unwrap_or_default())
            .description(text(properties, DESCRIPTION)?.as_deref())
            .strategy(text(properties, STRATEGY)?.as_deref())
            .groups(&groups)
            .properties(extras(properties)?)
            .enabled(flag(properties, ENABLED)?)
            .ranking(ranking(properties)?)
            .build()
    }

    /// Builds a group from a property map; see [`Factory::feature_from_properties`].
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] for a missing name or a mistyped field.
    pub fn group_from_properties(properties: &Properties) -> Result<FeatureGroup, ToggleError> {
        Self::group(text(properties, NAME)?.unwrap_or_default())
            .description(text(properties, DESCRIPTION)?.as_deref())
            .strategy(text(properties, STRATEGY)?.as_deref())
            .properties(extras(properties)?)
            .enabled(flag(properties, ENABLED)?)
            .ranking(ranking(properties)?)
            .build()
    }

    /// Reads a strategy definition from a property map and checks its patterns.
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] for a missing name or a mistyped field,
    /// and [`ToggleError::Pattern`] when a pattern does not compile.
    pub fn strategy_from_properties(
        kind: StrategyKind,
        properties: &Properties,
    ) -> Result<StrategyDefinition, ToggleError> {
        let name = text(properties, NAME)?
            .ok_or_else(|| ToggleError::validation("Strategy name cannot be null or empty"))?;
        let definition = StrategyDefinition {
            kind,
            name,
            description: text(properties, DESCRIPTION)?,
            property_key: text(properties, PROPERTY_KEY)?,
            property_value: text(properties, PROPERTY_VALUE)?,
            ranking: ranking(properties)?,
        };
        PropertyMatcher::optional(
            definition.property_key.as_deref(),
            definition.property_value.as_deref(),
        )?;
        Ok(definition)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Trims, drops empty names and keeps the first of case-insensitive duplicates.
fn distinct(names: Vec<String>) -> Vec<String> {
    let mut seen = fxhash::FxHashSet::default();
    names
        .into_iter()
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty() && seen.insert(n.to_lowercase()))
        .collect()
}

fn mistyped(key: &str, expected: &str) -> ToggleError {
    ToggleError::Validation {
        message: format!("'{key}' must be {expected}").into(),
        context: Some("property map".into()),
    }
}

fn text(properties: &Properties, key: &str) -> Result<Option<String>, ToggleError> {
    match properties.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(mistyped(key, "a string")),
    }
}

fn flag(properties: &Properties, key: &str) -> Result<bool, ToggleError> {
    match properties.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => Ok(s.trim().eq_ignore_ascii_case("true")),
        Some(_) => Err(mistyped(key, "a boolean")),
    }
}

fn names(properties: &Properties, key: &str) -> Result<Vec<String>, ToggleError> {
    match properties.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(s.split(',').map(str::to_owned).collect()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_owned).ok_or_else(|| mistyped(key, "a list of strings")))
            .collect(),
        Some(_) => Err(mistyped(key, "a list of strings")),
    }
}

fn ranking(properties: &Properties) -> Result<i32, ToggleError> {
    match properties.get(SERVICE_RANKING) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| mistyped(SERVICE_RANKING, "a 32-bit integer")),
        Some(Value::String(s)) => {
            s.trim().parse().map_err(|_| mistyped(SERVICE_RANKING, "a 32-bit integer"))
        },
        Some(_) => Err(mistyped(SERVICE_RANKING, "a 32-bit integer")),
    }
}

fn extras(properties: &Properties) -> Result<Properties, ToggleError> {
    let mut extras: Properties = properties
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    match properties.get(PROPERTIES) {
        None | Some(Value::Null) => {},
        Some(Value::Object(nested)) => {
            extras.extend(nested.iter().map(|(k, v)| (k.clone(), v.clone())));
        },
        Some(_) => return Err(mistyped(PROPERTIES, "an object")),
    }
    Ok(extras)
}
