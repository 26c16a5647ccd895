use super::system::snapshot;
use super::{ActivationStrategy, PropertyMatcher, StrategyKind};
use crate::model::{Properties, Strategizable};
use serde_json::Value;
use std::borrow::Cow;

/// Enabled when any property of the evaluated target matches both patterns.
/// The built-in keys (`name`, `enabled`, `service.ranking`, ...) take part too.
///
/// String values are matched raw, other values by their JSON rendering.
#[derive(Debug, Clone)]
pub struct ServicePropertyStrategy {
    name: String,
    description: String,
    matcher: Option<PropertyMatcher>,
}

impl ServicePropertyStrategy {
    pub(crate) const fn new(
        name: String,
        description: String,
        matcher: Option<PropertyMatcher>,
    ) -> Self {
        Self { name, description, matcher }
    }

    pub const fn matcher(&self) -> Option<&PropertyMatcher> {
        self.matcher.as_ref()
    }
}

impl ActivationStrategy for ServicePropertyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_enabled(&self, _target: &dyn Strategizable, properties: &Properties) -> bool {
        let Some(matcher) = &self.matcher else {
            return false;
        };
        properties.iter().any(|(key, value)| matcher.matches(key, &render(value)))
    }

    fn properties(&self) -> Properties {
        snapshot(StrategyKind::ServiceProperty, &self.name, &self.description, self.matcher.as_ref())
    }
}

fn render(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}
