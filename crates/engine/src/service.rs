use crate::error::ToggleError;
use crate::event::{ConfigurationEvent, EventKind, Subject};
use crate::factory::Factory;
use crate::model::{Feature, FeatureGroup, Strategizable};
use crate::registry::{RegistrationId, Registry};
use crate::resolver::{Resolution, Resolver};
use crate::strategy::{ActivationStrategy, EnvironmentSource, PropertySource, StrategyDefinition};
use serde_json::json;
use std::sync::Arc;
use toggle_domain::constants::{NAME, SERVICE_RANKING};
use toggle_event_bus::{Listener, ListenerId, NotificationBus, Subscription};

#[derive(Debug)]
struct ServiceInner {
    features: Registry<Feature>,
    groups: Registry<FeatureGroup>,
    strategies: Registry<dyn ActivationStrategy>,
    bus: NotificationBus<ConfigurationEvent>,
    source: Arc<dyn PropertySource>,
}

/// Registration, query and management surface over the feature, group and
/// strategy registries.
///
/// Cloning is cheap and every clone shares the same registries and bus.
#[derive(Debug, Clone)]
pub struct FeatureService {
    inner: Arc<ServiceInner>,
}

/// Builder for [`FeatureService`].
#[derive(Debug, Default)]
pub struct FeatureServiceBuilder {
    bus: Option<NotificationBus<ConfigurationEvent>>,
    source: Option<Arc<dyn PropertySource>>,
}

impl FeatureServiceBuilder {
    /// Publishes change events on an existing bus instead of a private one.
    #[must_use = "The builder must be built to produce a service"]
    pub fn bus(mut self, bus: NotificationBus<ConfigurationEvent>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Key/value pairs read by system-property strategies. Defaults to the process environment.
    #[must_use = "The builder must be built to produce a service"]
    pub fn property_source(mut self, source: Arc<dyn PropertySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> FeatureService {
        FeatureService {
            inner: Arc::new(ServiceInner {
                features: Registry::new("feature"),
                groups: Registry::new("group"),
                strategies: Registry::new("strategy"),
                bus: self.bus.unwrap_or_default(),
                source: self.source.unwrap_or_else(|| Arc::new(EnvironmentSource)),
            }),
        }
    }
}

impl Default for FeatureService {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FeatureService {
    #[must_use = "The builder must be built to produce a service"]
    pub fn builder() -> FeatureServiceBuilder {
        FeatureServiceBuilder::default()
    }

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.inner.features, &self.inner.groups, &self.inner.strategies)
    }

    // --- Queries ---

    pub fn list_features(&self) -> Vec<Arc<Feature>> {
        self.inner.features.all()
    }

    pub fn get_feature(&self, name: &str) -> Option<Arc<Feature>> {
        self.inner.features.lookup(name)
    }

    /// Whether the feature is enabled; unknown features are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.resolver().is_enabled(name)
    }

    /// Same decision as [`FeatureService::is_enabled`], with the deciding rule.
    pub fn explain(&self, name: &str) -> Resolution {
        self.resolver().explain(name)
    }

    pub fn list_groups(&self) -> Vec<Arc<FeatureGroup>> {
        self.inner.groups.all()
    }

    pub fn get_group(&self, name: &str) -> Option<Arc<FeatureGroup>> {
        self.inner.groups.lookup(name)
    }

    pub fn is_group_enabled(&self, name: &str) -> bool {
        self.resolver().is_group_enabled(name)
    }

    pub fn list_strategies(&self) -> Vec<Arc<dyn ActivationStrategy>> {
        self.inner.strategies.all()
    }

    pub fn get_strategy(&self, name: &str) -> Option<Arc<dyn ActivationStrategy>> {
        self.inner.strategies.lookup(name)
    }

    /// Features declaring membership of `group`.
    pub fn features_by_group(&self, group: &str) -> Vec<Arc<Feature>> {
        if group.trim().is_empty() {
            return Vec::new();
        }
        self.list_features().into_iter().filter(|f| f.in_group(group)).collect()
    }

    /// Features associated with the strategy named `strategy`.
    pub fn features_by_strategy(&self, strategy: &str) -> Vec<Arc<Feature>> {
        self.list_features().into_iter().filter(|f| uses(f.as_ref(), strategy)).collect()
    }

    /// Groups associated with the strategy named `strategy`.
    pub fn groups_by_strategy(&self, strategy: &str) -> Vec<Arc<FeatureGroup>> {
        self.list_groups().into_iter().filter(|g| uses(g.as_ref(), strategy)).collect()
    }

    // --- Registration ---

    /// # Errors
    /// Returns [`ToggleError::Validation`] when the name is empty.
    pub fn register_feature(&self, feature: Feature) -> Result<RegistrationId, ToggleError> {
        let feature = Arc::new(feature);
        let id =
            self.inner.features.register(feature.name(), feature.ranking(), Arc::clone(&feature))?;
        self.notify_feature(EventKind::Updated, id, feature);
        Ok(id)
    }

    /// # Errors
    /// Returns [`ToggleError::Validation`] when the name is empty.
    pub fn register_group(&self, group: FeatureGroup) -> Result<RegistrationId, ToggleError> {
        let group = Arc::new(group);
        let id = self.inner.groups.register(group.name(), group.ranking(), Arc::clone(&group))?;
        self.notify_group(EventKind::Updated, id, group);
        Ok(id)
    }

    /// Compiles and registers a built-in strategy.
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] or [`ToggleError::Pattern`] for a bad definition.
    pub fn register_strategy(
        &self,
        definition: &StrategyDefinition,
    ) -> Result<RegistrationId, ToggleError> {
        let strategy = Factory::strategy(definition, Arc::clone(&self.inner.source))?;
        self.register_custom_strategy(strategy, definition.ranking)
    }

    /// Registers an implementor-supplied strategy.
    ///
    /// # Errors
    /// Returns [`ToggleError::Validation`] when the strategy name is empty.
    pub fn register_custom_strategy(
        &self,
        strategy: Arc<dyn ActivationStrategy>,
        ranking: i32,
    ) -> Result<RegistrationId, ToggleError> {
        let id = self.inner.strategies.register(strategy.name(), ranking, Arc::clone(&strategy))?;
        self.notify_strategy(EventKind::Updated, id, strategy.as_ref(), ranking);
        Ok(id)
    }

    pub fn unregister_feature(&self, id: RegistrationId) -> bool {
        self.inner.features.unregister(id).is_some_and(|feature| {
            self.notify_feature(EventKind::Deleted, id, feature);
            true
        })
    }

    pub fn unregister_group(&self, id: RegistrationId) -> bool {
        self.inner.groups.unregister(id).is_some_and(|group| {
            self.notify_group(EventKind::Deleted, id, group);
            true
        })
    }

    pub fn unregister_strategy(&self, id: RegistrationId) -> bool {
        let Some(registered) = self.inner.strategies.get(id) else {
            return false;
        };
        self.inner.strategies.unregister(id).is_some_and(|strategy| {
            self.notify_strategy(EventKind::Deleted, id, strategy.as_ref(), registered.ranking);
            true
        })
    }

    // --- Management ---

    /// # Errors
    /// Returns [`ToggleError::NotFound`] when no feature has that name.
    pub fn enable_feature(&self, name: &str) -> Result<(), ToggleError> {
        self.set_feature_enabled(name, true)
    }

    /// # Errors
    /// Returns [`ToggleError::NotFound`] when no feature has that name.
    pub fn disable_feature(&self, name: &str) -> Result<(), ToggleError> {
        self.set_feature_enabled(name, false)
    }

    /// # Errors
    /// Returns [`ToggleError::NotFound`] when no group has that name.
    pub fn enable_group(&self, name: &str) -> Result<(), ToggleError> {
        self.set_group_enabled(name, true)
    }

    /// # Errors
    /// Returns [`ToggleError::NotFound`] when no group has that name.
    pub fn disable_group(&self, name: &str) -> Result<(), ToggleError> {
        self.set_group_enabled(name, false)
    }

    /// Replaces the feature registered under `id`; the new ranking applies.
    ///
    /// # Errors
    /// Returns [`ToggleError::NotFound`] for an unknown id and
    /// [`ToggleError::Validation`] when the name is empty.
    pub fn update_feature(&self, id: RegistrationId, feature: Feature) -> Result<(), ToggleError> {
        let feature = Arc::new(feature);
        self.inner
            .features
            .replace(id, feature.name(), feature.ranking(), Arc::clone(&feature))?
            .ok_or_else(|| ToggleError::not_found("feature registration", id))?;
        self.notify_feature(EventKind::Updated, id, feature);
        Ok(())
    }

    /// Replaces the group registered under `id`; the new ranking applies.
    ///
    /// # Errors
    /// Returns [`ToggleError::NotFound`] for an unknown id and
    /// [`ToggleError::Validation`] when the name is empty.
    pub fn update_group(&self, id: RegistrationId, group: FeatureGroup) -> Result<(), ToggleError> {
        let group = Arc::new(group);
        self.inner
            .groups
            .replace(id, group.name(), group.ranking(), Arc::clone(&group))?
            .ok_or_else(|| ToggleError::not_found("group registration", id))?;
        self.notify_group(EventKind::Updated, id, group);
        Ok(())
    }

    /// Replaces the strategy registered under `id` with a newly compiled built-in.
    ///
    /// # Errors
    /// Returns [`ToggleError::NotFound`] for an unknown id, and
    /// [`ToggleError::Validation`] or [`ToggleError::Pattern`] for a bad definition.
    pub fn update_strategy(
        &self,
        id: RegistrationId,
        definition: &StrategyDefinition,
    ) -> Result<(), ToggleError> {
        let strategy = Factory::strategy(definition, Arc::clone(&self.inner.source))?;
        self.inner
            .strategies
            .replace(id, strategy.name(), definition.ranking, Arc::clone(&strategy))?
            .ok_or_else(|| ToggleError::not_found("strategy registration", id))?;
        self.notify_strategy(EventKind::Updated, id, strategy.as_ref(), definition.ranking);
        Ok(())
    }

    /// Withdraws the active feature named `name`, promoting a shadowed one.
    pub fn remove_feature(&self, name: &str) -> bool {
        self.inner.features.active(name).is_some_and(|active| self.unregister_feature(active.id))
    }

    /// Withdraws the active group named `name`, promoting a shadowed one.
    pub fn remove_group(&self, name: &str) -> bool {
        self.inner.groups.active(name).is_some_and(|active| self.unregister_group(active.id))
    }

    /// Withdraws the active strategy named `name`, promoting a shadowed one.
    pub fn remove_strategy(&self, name: &str) -> bool {
        self.inner.strategies.active(name).is_some_and(|active| self.unregister_strategy(active.id))
    }

    // --- Events ---

    /// Registers a change listener, served by its own task on the current runtime.
    ///
    /// # Errors
    /// Returns [`ToggleError::EventBus`] outside a tokio runtime.
    pub fn subscribe<L: Listener<ConfigurationEvent>>(
        &self,
        listener: L,
    ) -> Result<ListenerId, ToggleError> {
        Ok(self.inner.bus.subscribe(listener)?)
    }

    /// Pull-based access to change events.
    #[must_use]
    pub fn subscribe_channel(&self) -> Subscription<ConfigurationEvent> {
        self.inner.bus.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.bus.unsubscribe(id)
    }

    pub fn bus(&self) -> &NotificationBus<ConfigurationEvent> {
        &self.inner.bus
    }

    fn set_feature_enabled(&self, name: &str, enabled: bool) -> Result<(), ToggleError> {
        let modified = self
            .inner
            .features
            .modify(name, |current| Arc::new(current.with_enabled(enabled)))
            .ok_or_else(|| ToggleError::not_found("feature", name))?;
        self.notify_feature(EventKind::Updated, modified.id, modified.value);
        Ok(())
    }

    fn set_group_enabled(&self, name: &str, enabled: bool) -> Result<(), ToggleError> {
        let modified = self
            .inner
            .groups
            .modify(name, |current| Arc::new(current.with_enabled(enabled)))
            .ok_or_else(|| ToggleError::not_found("group", name))?;
        self.notify_group(EventKind::Updated, modified.id, modified.value);
        Ok(())
    }

    fn notify_feature(&self, kind: EventKind, id: RegistrationId, feature: Arc<Feature>) {
        let properties = feature.to_properties();
        self.publish(ConfigurationEvent::new(kind, id, Subject::Feature(feature), properties));
    }

    fn notify_group(&self, kind: EventKind, id: RegistrationId, group: Arc<FeatureGroup>) {
        let properties = group.to_properties();
        self.publish(ConfigurationEvent::new(kind, id, Subject::Group(group), properties));
    }

    fn notify_strategy(
        &self,
        kind: EventKind,
        id: RegistrationId,
        strategy: &dyn ActivationStrategy,
        ranking: i32,
    ) {
        let mut properties = strategy.properties();
        properties.insert(NAME.to_owned(), json!(strategy.name()));
        properties.insert(SERVICE_RANKING.to_owned(), json!(ranking));
        let subject = Subject::Strategy { name: strategy.name().to_owned() };
        self.publish(ConfigurationEvent::new(kind, id, subject, properties));
    }

    fn publish(&self, event: ConfigurationEvent) {
        self.inner.bus.publish(event);
    }
}

fn uses(target: &dyn Strategizable, strategy: &str) -> bool {
    !strategy.trim().is_empty()
        && target.strategy().is_some_and(|s| s.to_lowercase() == strategy.to_lowercase())
}
