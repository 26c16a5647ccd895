mod fixtures;

use fixtures::{feature, group};
use std::sync::Arc;
use std::time::Duration;
use toggle_engine::{
    ConfigurationEvent, EventKind, FeatureService, StrategyDefinition, StrategyKind, Subject,
    ToggleError,
};
use toggle_event_bus::{ListenerError, Subscription};

async fn next(subscription: &mut Subscription<ConfigurationEvent>) -> Arc<ConfigurationEvent> {
    tokio::time::timeout(Duration::from_secs(2), subscription.recv())
        .await
        .expect("event not delivered in time")
        .expect("bus closed")
}

#[tokio::test]
async fn update_update_delete_arrive_in_order() {
    let service = FeatureService::new();
    let mut events = service.subscribe_channel();

    let id = service.register_feature(feature("f", false, None, &[])).unwrap();
    service.enable_feature("f").unwrap();
    assert!(service.unregister_feature(id));

    let observed: Vec<_> = [
        next(&mut events).await,
        next(&mut events).await,
        next(&mut events).await,
    ]
    .iter()
    .map(|e| (e.kind(), e.id(), e.properties()["enabled"].as_bool()))
    .collect();

    assert_eq!(
        observed,
        vec![
            (EventKind::Updated, id, Some(false)),
            (EventKind::Updated, id, Some(true)),
            (EventKind::Deleted, id, Some(true)),
        ]
    );
}

#[tokio::test]
async fn callback_listener_sees_every_subject_kind() {
    let service = FeatureService::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    service
        .subscribe(move |event: &ConfigurationEvent| -> Result<(), ListenerError> {
            tx.send(event.to_string()).map_err(|e| ListenerError::from(e.to_string()))
        })
        .unwrap();

    service
        .register_strategy(&StrategyDefinition::new(StrategyKind::ServiceProperty, "s"))
        .unwrap();
    let group_id = service.register_group(group("g", true, Some("s"))).unwrap();
    service.register_feature(feature("f", true, None, &["g"])).unwrap();
    assert!(service.unregister_group(group_id));

    let mut seen = Vec::new();
    for _ in 0..4 {
        let line = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        seen.push(line);
    }

    assert!(seen[0].starts_with("Updated strategy 's'"));
    assert!(seen[1].starts_with("Updated group 'g'"));
    assert!(seen[2].starts_with("Updated feature 'f'"));
    assert!(seen[3].starts_with("Deleted group 'g'"));
}

#[tokio::test]
async fn event_carries_the_registered_instance() {
    let service = FeatureService::new();
    let mut events = service.subscribe_channel();

    service.register_feature(feature("f", true, None, &["a"])).unwrap();
    let event = next(&mut events).await;

    let Subject::Feature(published) = event.subject() else {
        panic!("expected a feature subject, got {:?}", event.subject());
    };
    assert!(Arc::ptr_eq(published, &service.get_feature("f").unwrap()));
    assert_eq!(event.properties()["groups"], serde_json::json!(["a"]));
}

#[test]
fn subscribing_outside_a_runtime_fails() {
    let service = FeatureService::new();
    let err = service
        .subscribe(|_: &ConfigurationEvent| -> Result<(), ListenerError> { Ok(()) })
        .unwrap_err();
    assert!(matches!(err, ToggleError::EventBus { .. }));
}
