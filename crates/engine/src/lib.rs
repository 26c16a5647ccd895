//! # Toggle Engine
//!
//! Feature flag registries and enablement resolution.
//!
//! ## Overview
//!
//! * [`Factory`] builds immutable [`Feature`], [`FeatureGroup`] and strategy
//!   instances, from typed builders or from loosely typed property maps.
//! * [`FeatureService`] owns three [`Registry`] instances (features, groups,
//!   strategies). Several instances may share a name; the highest ranking one,
//!   then the earliest registered one, is active.
//! * [`Resolver`] decides enablement: an enabled group wins (lowest name first),
//!   then a registered strategy, then the static flag.
//! * Every registration change publishes a [`ConfigurationEvent`] on the
//!   service's notification bus.
//! * [`Bootstrapper`] loads [`Definitions`] in bulk and unloads them per source.
//!
//! # Example
//!
//! ```rust
//! use toggle_engine::{Factory, FeatureService, Properties, Resolution};
//!
//! # fn main() -> Result<(), toggle_engine::ToggleError> {
//! let service = FeatureService::new();
//! let group = Factory::group("beta")
//!     .description(None)
//!     .strategy(None)
//!     .properties(Properties::new())
//!     .enabled(true)
//!     .build()?;
//! let feature = Factory::feature("checkout")
//!     .description(Some("New checkout flow"))
//!     .strategy(None)
//!     .groups(&["beta"])
//!     .properties(Properties::new())
//!     .enabled(false)
//!     .build()?;
//!
//! service.register_group(group)?;
//! service.register_feature(feature)?;
//!
//! assert!(service.is_enabled("Checkout"));
//! assert_eq!(
//!     service.explain("checkout"),
//!     Resolution::Group { name: "beta".into(), enabled: true }
//! );
//! assert!(!service.is_enabled("unknown"));
//! # Ok(())
//! # }
//! ```

mod error;

pub mod bootstrap;
pub mod event;
pub mod factory;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod strategy;

pub use bootstrap::{BootstrapReport, Bootstrapper, Definitions, MemoryNameStore, NameStore};
pub use error::{ToggleError, ToggleErrorExt};
pub use event::{ConfigurationEvent, EventKind, Subject};
pub use factory::Factory;
pub use model::{Feature, FeatureGroup, Properties, Strategizable};
pub use registry::{RegistrationId, Registry};
pub use resolver::{Resolution, Resolver};
pub use service::{FeatureService, FeatureServiceBuilder};
pub use strategy::{ActivationStrategy, PropertySource, StrategyDefinition, StrategyKind};
