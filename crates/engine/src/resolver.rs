//! Enablement resolution.
//!
//! Precedence for a feature: the lexicographically first enabled group, then
//! the associated strategy if it is registered, then the static flag. Groups
//! follow the same rule without the group step.

use crate::model::{Feature, FeatureGroup, Strategizable};
use crate::registry::Registry;
use crate::strategy::ActivationStrategy;
use serde::Serialize;
use std::fmt;
use tracing::trace;

/// The rule that decided a feature's enablement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Resolution {
    /// No feature is registered under the name.
    Unknown,
    /// An enabled group the feature belongs to.
    Group { name: String, enabled: bool },
    /// The feature's registered activation strategy.
    Strategy { name: String, enabled: bool },
    /// The feature's own flag.
    Static { enabled: bool },
}

impl Resolution {
    pub const fn is_enabled(&self) -> bool {
        match self {
            Self::Unknown => false,
            Self::Group { enabled, .. }
            | Self::Strategy { enabled, .. }
            | Self::Static { enabled } => *enabled,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |enabled: bool| if enabled { "enabled" } else { "disabled" };
        match self {
            Self::Unknown => f.write_str("disabled (unknown feature)"),
            Self::Group { name, enabled } => write!(f, "{} by group '{name}'", state(*enabled)),
            Self::Strategy { name, enabled } => {
                write!(f, "{} by strategy '{name}'", state(*enabled))
            },
            Self::Static { enabled } => write!(f, "{} by static flag", state(*enabled)),
        }
    }
}

/// Read-only view over the three registries.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    features: &'a Registry<Feature>,
    groups: &'a Registry<FeatureGroup>,
    strategies: &'a Registry<dyn ActivationStrategy>,
}

impl<'a> Resolver<'a> {
    pub const fn new(
        features: &'a Registry<Feature>,
        groups: &'a Registry<FeatureGroup>,
        strategies: &'a Registry<dyn ActivationStrategy>,
    ) -> Self {
        Self { features, groups, strategies }
    }

    /// Unknown features are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.explain(name).is_enabled()
    }

    /// Resolves a feature and reports which rule decided.
    pub fn explain(&self, name: &str) -> Resolution {
        let Some(feature) = self.features.lookup(name) else {
            trace!(feature = name, "Unknown feature resolves to disabled");
            return Resolution::Unknown;
        };

        let resolution = self.resolve(&feature);
        trace!(feature = name, %resolution, "Resolved");
        resolution
    }

    /// Enablement of a registered group: its strategy if registered, else its flag.
    pub fn group_enabled(&self, group: &FeatureGroup) -> bool {
        self.strategy_decision(group).map_or(group.enabled(), |(_, enabled)| enabled)
    }

    /// Enablement of the active group registered under `name`; unknown groups are disabled.
    pub fn is_group_enabled(&self, name: &str) -> bool {
        self.groups.lookup(name).is_some_and(|group| self.group_enabled(&group))
    }

    fn resolve(&self, feature: &Feature) -> Resolution {
        let mut eligible: Vec<_> = feature
            .groups()
            .iter()
            .filter_map(|name| self.groups.lookup(name))
            .filter(|group| self.group_enabled(group))
            .collect();
        eligible.sort_by(|a, b| a.name().cmp(b.name()));

        if let Some(deciding) = eligible.first() {
            return Resolution::Group {
                name: deciding.name().to_owned(),
                enabled: self.group_enabled(deciding),
            };
        }

        if let Some((name, enabled)) = self.strategy_decision(feature) {
            return Resolution::Strategy { name, enabled };
        }

        Resolution::Static { enabled: feature.enabled() }
    }

    fn strategy_decision(&self, target: &dyn Strategizable) -> Option<(String, bool)> {
        let strategy = self.strategies.lookup(target.strategy()?)?;
        let enabled = strategy.is_enabled(target, &target.to_properties());
        Some((strategy.name().to_owned(), enabled))
    }
}

#[cfg(test)]
mod tests {
    use super::{Resolution, Resolver};
    use crate::factory::Factory;
    use crate::model::{Feature, FeatureGroup, Properties};
    use crate::registry::Registry;
    use crate::strategy::{ActivationStrategy, StaticSource, StrategyDefinition, StrategyKind};
    use std::sync::Arc;

    struct Fixture {
        features: Registry<Feature>,
        groups: Registry<FeatureGroup>,
        strategies: Registry<dyn ActivationStrategy>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                features: Registry::new("feature"),
                groups: Registry::new("group"),
                strategies: Registry::new("strategy"),
            }
        }

        fn resolver(&self) -> Resolver<'_> {
            Resolver::new(&self.features, &self.groups, &self.strategies)
        }

        fn feature(&self, name: &str, enabled: bool, strategy: Option<&str>, groups: &[&str]) {
            let feature = Factory::feature(name)
                .description(None)
                .strategy(strategy)
                .groups(groups)
                .properties(Properties::new())
                .enabled(enabled)
                .build()
                .unwrap();
            self.features.register(name, 0, Arc::new(feature)).unwrap();
        }

        fn group(&self, name: &str, enabled: bool, strategy: Option<&str>) {
            let group = Factory::group(name)
                .description(None)
                .strategy(strategy)
                .properties(Properties::new())
                .enabled(enabled)
                .build()
                .unwrap();
            self.groups.register(name, 0, Arc::new(group)).unwrap();
        }

        fn env_strategy(&self, name: &str, source: StaticSource) {
            let definition = StrategyDefinition::new(StrategyKind::SystemProperty, name)
                .pattern(r"feature\.flag", "true");
            let strategy = Factory::strategy(&definition, Arc::new(source)).unwrap();
            self.strategies.register(name, 0, strategy).unwrap();
        }
    }

    #[test]
    fn unknown_feature_is_disabled() {
        let fixture = Fixture::new();
        assert_eq!(fixture.resolver().explain("ghost"), Resolution::Unknown);
        assert!(!fixture.resolver().is_enabled(""));
    }

    #[test]
    fn static_flag_decides_without_groups_or_strategy() {
        let fixture = Fixture::new();
        fixture.feature("on", true, None, &[]);
        fixture.feature("off", false, None, &[]);

        assert_eq!(fixture.resolver().explain("ON"), Resolution::Static { enabled: true });
        assert!(!fixture.resolver().is_enabled("off"));
    }

    #[test]
    fn unresolved_strategy_falls_back_to_static_flag() {
        let fixture = Fixture::new();
        fixture.feature("f", true, Some("missing"), &[]);

        assert_eq!(fixture.resolver().explain("f"), Resolution::Static { enabled: true });
    }

    #[test]
    fn enabled_group_overrides_strategy_and_flag() {
        let fixture = Fixture::new();
        fixture.env_strategy("env", StaticSource::new());
        fixture.group("g", true, None);
        fixture.feature("f", false, Some("env"), &["g"]);

        assert_eq!(
            fixture.resolver().explain("f"),
            Resolution::Group { name: "g".to_owned(), enabled: true }
        );
    }

    #[test]
    fn disabled_or_missing_groups_behave_as_no_groups() {
        let fixture = Fixture::new();
        fixture.env_strategy("env", StaticSource::new().with("feature.flag", "true"));
        fixture.group("off", false, None);
        fixture.feature("f", false, Some("env"), &["off", "absent"]);

        assert_eq!(
            fixture.resolver().explain("f"),
            Resolution::Strategy { name: "env".to_owned(), enabled: true }
        );
    }

    #[test]
    fn lowest_enabled_group_name_decides() {
        let fixture = Fixture::new();
        fixture.group("Beta", true, None);
        fixture.group("Alpha", true, None);
        fixture.feature("F", false, None, &["Beta", "Alpha"]);

        assert_eq!(
            fixture.resolver().explain("F"),
            Resolution::Group { name: "Alpha".to_owned(), enabled: true }
        );
    }

    #[test]
    fn disabled_group_with_smaller_name_is_filtered_before_sorting() {
        let fixture = Fixture::new();
        fixture.group("Alpha", false, None);
        fixture.group("Beta", true, None);
        fixture.feature("F", false, None, &["Alpha", "Beta"]);

        assert_eq!(
            fixture.resolver().explain("F"),
            Resolution::Group { name: "Beta".to_owned(), enabled: true }
        );
    }

    #[test]
    fn group_strategy_overrides_group_flag() {
        let fixture = Fixture::new();
        fixture.env_strategy("env", StaticSource::new().with("feature.flag", "true"));
        fixture.group("g", false, Some("env"));
        fixture.feature("f", false, None, &["g"]);

        assert!(fixture.resolver().is_group_enabled("G"));
        assert_eq!(
            fixture.resolver().explain("f"),
            Resolution::Group { name: "g".to_owned(), enabled: true }
        );
        assert!(!fixture.resolver().is_group_enabled("missing"));
    }

    #[test]
    fn display_names_the_deciding_rule() {
        let resolution = Resolution::Group { name: "Alpha".to_owned(), enabled: true };
        assert_eq!(resolution.to_string(), "enabled by group 'Alpha'");
        assert_eq!(Resolution::Unknown.to_string(), "disabled (unknown feature)");
    }
}
