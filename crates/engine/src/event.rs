use crate::model::{Feature, FeatureGroup, Properties, Strategizable};
use crate::registry::RegistrationId;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Registered, or replaced by a new instance.
    Updated,
    /// Registration withdrawn.
    Deleted,
}

/// The entity a [`ConfigurationEvent`] refers to.
#[derive(Debug, Clone)]
pub enum Subject {
    Feature(Arc<Feature>),
    Group(Arc<FeatureGroup>),
    Strategy { name: String },
}

impl Subject {
    pub fn name(&self) -> &str {
        match self {
            Self::Feature(feature) => feature.name(),
            Self::Group(group) => group.name(),
            Self::Strategy { name } => name,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Feature(_) => "feature",
            Self::Group(_) => "group",
            Self::Strategy { .. } => "strategy",
        }
    }
}

/// Immutable record of a configuration change.
#[derive(Debug, Clone)]
pub struct ConfigurationEvent {
    kind: EventKind,
    id: RegistrationId,
    subject: Subject,
    properties: Properties,
}

impl ConfigurationEvent {
    pub(crate) const fn new(
        kind: EventKind,
        id: RegistrationId,
        subject: Subject,
        properties: Properties,
    ) -> Self {
        Self { kind, id, subject, properties }
    }

    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Registration the change applies to.
    pub const fn id(&self) -> RegistrationId {
        self.id
    }

    pub const fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Property snapshot of the subject when the event was produced.
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl fmt::Display for ConfigurationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} '{}' ({})", self.kind, self.subject.kind(), self.subject.name(), self.id)
    }
}
