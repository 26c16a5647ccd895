//! Well-known keys of the loosely typed property maps features, groups and
//! strategies are built from.

pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const ENABLED: &str = "enabled";
pub const STRATEGY: &str = "strategy";
pub const GROUPS: &str = "groups";
/// Nested object whose entries are merged into the extra properties.
pub const PROPERTIES: &str = "properties";
pub const PROPERTY_KEY: &str = "property_key";
pub const PROPERTY_VALUE: &str = "property_value";
pub const SERVICE_RANKING: &str = "service.ranking";

/// Keys interpreted by the factory; everything else is opaque metadata.
pub const RESERVED_KEYS: [&str; 9] = [
    NAME,
    DESCRIPTION,
    ENABLED,
    STRATEGY,
    GROUPS,
    PROPERTIES,
    PROPERTY_KEY,
    PROPERTY_VALUE,
    SERVICE_RANKING,
];

/// Bootstrap source used when the configuration names none.
pub const DEFAULT_SOURCE: &str = "static";

pub const DEFAULT_LOG_ROTATION: &str = "daily";
pub const DEFAULT_LOG_FILES: usize = 10;

/// Prefix of environment variables overriding file configuration.
pub const ENV_PREFIX: &str = "TOGGLE";
