#![allow(dead_code)]

use std::sync::Arc;
use toggle_engine::strategy::StaticSource;
use toggle_engine::{
    Factory, Feature, FeatureGroup, FeatureService, Properties, StrategyDefinition, StrategyKind,
};

pub fn service_with(source: StaticSource) -> FeatureService {
    FeatureService::builder().property_source(Arc::new(source)).build()
}

pub fn feature(name: &str, enabled: bool, strategy: Option<&str>, groups: &[&str]) -> Feature {
    Factory::feature(name)
        .description(None)
        .strategy(strategy)
        .groups(groups)
        .properties(Properties::new())
        .enabled(enabled)
        .build()
        .unwrap()
}

pub fn group(name: &str, enabled: bool, strategy: Option<&str>) -> FeatureGroup {
    Factory::group(name)
        .description(None)
        .strategy(strategy)
        .properties(Properties::new())
        .enabled(enabled)
        .build()
        .unwrap()
}

/// `feature.flag=true` system-property strategy.
pub fn system_strategy(name: &str) -> StrategyDefinition {
    StrategyDefinition::new(StrategyKind::SystemProperty, name).pattern(r"feature\.flag", "true")
}
