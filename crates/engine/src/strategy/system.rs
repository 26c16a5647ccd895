use super::{ActivationStrategy, PropertyMatcher, PropertySource, StrategyKind};
use crate::model::{Properties, Strategizable};
use serde_json::json;
use std::sync::Arc;
use toggle_domain::constants::{DESCRIPTION, NAME, PROPERTY_KEY, PROPERTY_VALUE};

/// Enabled when any process-wide key/value pair matches both patterns.
///
/// The target is not consulted.
#[derive(Debug, Clone)]
pub struct SystemPropertyStrategy {
    name: String,
    description: String,
    matcher: Option<PropertyMatcher>,
    source: Arc<dyn PropertySource>,
}

impl SystemPropertyStrategy {
    pub(crate) fn new(
        name: String,
        description: String,
        matcher: Option<PropertyMatcher>,
        source: Arc<dyn PropertySource>,
    ) -> Self {
        Self { name, description, matcher, source }
    }

    pub const fn matcher(&self) -> Option<&PropertyMatcher> {
        self.matcher.as_ref()
    }
}

impl ActivationStrategy for SystemPropertyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_enabled(&self, _target: &dyn Strategizable, _properties: &Properties) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| self.source.any(&mut |key, value| matcher.matches(key, value)))
    }

    fn properties(&self) -> Properties {
        snapshot(StrategyKind::SystemProperty, &self.name, &self.description, self.matcher.as_ref())
    }
}

pub(super) fn snapshot(
    kind: StrategyKind,
    name: &str,
    description: &str,
    matcher: Option<&PropertyMatcher>,
) -> Properties {
    let mut map = Properties::new();
    map.insert("type".to_owned(), json!(kind.as_str()));
    map.insert(NAME.to_owned(), json!(name));
    map.insert(DESCRIPTION.to_owned(), json!(description));
    if let Some((key, value)) = matcher.map(PropertyMatcher::patterns) {
        map.insert(PROPERTY_KEY.to_owned(), json!(key));
        map.insert(PROPERTY_VALUE.to_owned(), json!(value));
    }
    map
}
