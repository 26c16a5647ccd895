mod fixtures;

use fixtures::{feature, group, service_with, system_strategy};
use std::sync::Arc;
use toggle_engine::strategy::StaticSource;
use toggle_engine::{
    ActivationStrategy, Factory, FeatureService, Properties, Resolution, Strategizable,
    StrategyDefinition, StrategyKind, ToggleError,
};

#[test]
fn static_flag_decides_without_groups_or_strategy() {
    let service = FeatureService::new();
    service.register_feature(feature("on", true, None, &[])).unwrap();
    service.register_feature(feature("off", false, None, &[])).unwrap();

    assert!(service.is_enabled("on"));
    assert!(!service.is_enabled("off"));
    assert!(!service.is_enabled("unknown"));
}

#[test]
fn enabled_group_ignores_feature_flag_and_strategy() {
    let service = service_with(StaticSource::new());
    service.register_strategy(&system_strategy("env")).unwrap();
    service.register_group(group("g", true, None)).unwrap();
    service.register_feature(feature("f", false, Some("env"), &["g"])).unwrap();

    assert!(service.is_enabled("f"));
    assert_eq!(service.explain("f"), Resolution::Group { name: "g".into(), enabled: true });
}

#[test]
fn single_disabled_group_defers_to_strategy() {
    let service = service_with(StaticSource::new().with("feature.flag", "true"));
    service.register_strategy(&system_strategy("env")).unwrap();
    service.register_group(group("g", false, None)).unwrap();
    service.register_feature(feature("f", false, Some("env"), &["g"])).unwrap();

    assert_eq!(service.explain("f"), Resolution::Strategy { name: "env".into(), enabled: true });
}

#[test]
fn lowest_enabled_group_decides_after_filtering() {
    let service = FeatureService::new();
    service.register_group(group("Beta", true, None)).unwrap();
    let alpha = service.register_group(group("Alpha", true, None)).unwrap();
    service.register_feature(feature("F", false, None, &["Beta", "Alpha"])).unwrap();

    assert!(service.is_enabled("F"));
    assert_eq!(service.explain("F"), Resolution::Group { name: "Alpha".into(), enabled: true });

    // Disabled groups are dropped before sorting, so Beta becomes the deciding group.
    service.update_group(alpha, group("Alpha", false, None)).unwrap();
    assert_eq!(service.explain("F"), Resolution::Group { name: "Beta".into(), enabled: true });

    service.disable_group("beta").unwrap();
    assert_eq!(service.explain("F"), Resolution::Static { enabled: false });
}

#[test]
fn lower_ranked_strategy_is_shadowed_until_original_leaves() {
    let service = FeatureService::new();
    let original = service
        .register_strategy(&StrategyDefinition::new(StrategyKind::ServiceProperty, "S").ranking(5))
        .unwrap();
    service
        .register_strategy(
            &StrategyDefinition::new(StrategyKind::ServiceProperty, "S")
                .description("second")
                .ranking(1),
        )
        .unwrap();

    assert_eq!(service.get_strategy("S").unwrap().description(), "S");

    assert!(service.unregister_strategy(original));
    assert_eq!(service.get_strategy("s").unwrap().description(), "second");
}

#[test]
fn system_property_strategy_follows_the_source() {
    let on = service_with(StaticSource::new().with("feature.flag", "true"));
    on.register_strategy(&system_strategy("env")).unwrap();
    on.register_feature(feature("f", false, Some("env"), &[])).unwrap();
    assert!(on.is_enabled("f"));

    let off = service_with(StaticSource::new());
    off.register_strategy(&system_strategy("env")).unwrap();
    off.register_feature(feature("f", true, Some("env"), &[])).unwrap();
    assert!(!off.is_enabled("f"));
}

#[test]
fn service_property_strategy_reads_feature_properties() {
    let service = FeatureService::new();
    service
        .register_strategy(
            &StrategyDefinition::new(StrategyKind::ServiceProperty, "tier").pattern("tier", "gold|platinum"),
        )
        .unwrap();

    let mut properties = Properties::new();
    properties.insert("tier".into(), "gold".into());
    let gold = Factory::feature("gold")
        .description(None)
        .strategy(Some("tier"))
        .groups(&[])
        .properties(properties)
        .enabled(false)
        .build()
        .unwrap();
    service.register_feature(gold).unwrap();
    service.register_feature(feature("plain", true, Some("tier"), &[])).unwrap();

    assert!(service.is_enabled("gold"));
    assert!(!service.is_enabled("plain"));
}

#[test]
fn service_property_strategy_sees_built_in_keys() {
    let service = FeatureService::new();
    service
        .register_strategy(
            &StrategyDefinition::new(StrategyKind::ServiceProperty, "beta-names").pattern("name", "beta-.*"),
        )
        .unwrap();
    service
        .register_strategy(
            &StrategyDefinition::new(StrategyKind::ServiceProperty, "static-on").pattern("enabled", "true"),
        )
        .unwrap();

    service.register_feature(feature("beta-search", false, Some("beta-names"), &[])).unwrap();
    service.register_feature(feature("search", true, Some("beta-names"), &[])).unwrap();
    service.register_feature(feature("mirror", true, Some("static-on"), &[])).unwrap();

    assert!(service.is_enabled("beta-search"));
    assert!(!service.is_enabled("search"));
    assert!(service.is_enabled("mirror"));

    service.disable_feature("mirror").unwrap();
    assert!(!service.is_enabled("mirror"));
}

#[test]
fn empty_names_are_rejected_and_descriptions_default() {
    let err = Factory::feature("")
        .description(None)
        .strategy(None)
        .groups(&[])
        .properties(Properties::new())
        .enabled(true)
        .build()
        .unwrap_err();
    assert!(matches!(err, ToggleError::Validation { .. }));

    let err = Factory::strategy(
        &StrategyDefinition::new(StrategyKind::SystemProperty, " "),
        Arc::new(StaticSource::new()),
    )
    .unwrap_err();
    assert!(matches!(err, ToggleError::Validation { .. }));

    assert_eq!(group("g", true, None).description(), "g");
    assert_eq!(feature("f", true, None, &[]).description(), "f");
}

#[test]
fn register_lookup_unregister_round_trip() {
    let service = FeatureService::new();
    let definition = feature("Dark-Mode", true, Some("s"), &["ui"]);
    let id = service.register_feature(definition.clone()).unwrap();

    assert_eq!(*service.get_feature("dark-mode").unwrap(), definition);
    assert!(service.unregister_feature(id));
    assert!(service.get_feature("Dark-Mode").is_none());
    assert!(!service.unregister_feature(id));
}

#[test]
fn management_keeps_registration_and_reports_unknown_names() {
    let service = FeatureService::new();
    service.register_feature(feature("f", false, None, &[])).unwrap();

    service.enable_feature("F").unwrap();
    assert!(service.is_enabled("f"));
    service.disable_feature("f").unwrap();
    assert!(!service.is_enabled("f"));

    let err = service.enable_feature("ghost").unwrap_err();
    assert!(matches!(err, ToggleError::NotFound { .. }));
    assert_eq!(err.code(), "not_found");
    assert!(!service.remove_feature("ghost"));
    assert!(service.remove_feature("f"));
    assert!(service.list_features().is_empty());
}

#[test]
fn update_with_unknown_id_is_not_found() {
    let service = FeatureService::new();
    let id = service.register_group(group("g", true, None)).unwrap();
    assert!(service.unregister_group(id));

    let err = service.update_group(id, group("g", false, None)).unwrap_err();
    assert!(matches!(err, ToggleError::NotFound { .. }));
}

#[test]
fn reverse_lookups_are_case_insensitive() {
    let service = FeatureService::new();
    service.register_group(group("ui", true, Some("Env"))).unwrap();
    service.register_feature(feature("a", true, Some("env"), &["UI"])).unwrap();
    service.register_feature(feature("b", true, None, &["ui", "other"])).unwrap();
    service.register_feature(feature("c", true, Some("other"), &[])).unwrap();

    let names = |features: Vec<Arc<toggle_engine::Feature>>| {
        features.iter().map(|f| f.name().to_owned()).collect::<Vec<_>>()
    };
    assert_eq!(names(service.features_by_group("Ui")), vec!["a", "b"]);
    assert_eq!(names(service.features_by_strategy("ENV")), vec!["a"]);
    assert_eq!(service.groups_by_strategy("env").len(), 1);
    assert!(service.features_by_group("").is_empty());
    assert!(service.features_by_strategy(" ").is_empty());
}

#[derive(Debug)]
struct Weekend(bool);

impl ActivationStrategy for Weekend {
    fn name(&self) -> &str {
        "weekend"
    }

    fn is_enabled(&self, _target: &dyn Strategizable, _properties: &Properties) -> bool {
        self.0
    }
}

#[test]
fn custom_strategies_plug_into_resolution() {
    let service = FeatureService::new();
    service.register_custom_strategy(Arc::new(Weekend(true)), 0).unwrap();
    service.register_group(group("g", false, Some("weekend"))).unwrap();
    service.register_feature(feature("f", false, None, &["g"])).unwrap();

    assert!(service.is_group_enabled("g"));
    assert!(service.is_enabled("f"));

    service.register_custom_strategy(Arc::new(Weekend(false)), 10).unwrap();
    assert!(!service.is_group_enabled("g"));
    assert!(!service.is_enabled("f"));
}
