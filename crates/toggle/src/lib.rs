//! Facade crate for the toggle service.
//! Wires configuration, the notification bus, the feature service and the
//! bootstrapper together. Keep this crate thin: behavior lives in `toggle-engine`.
//!
//! ## Usage
//! ```rust,no_run
//! use toggle::Toggle;
//! use toggle::domain::config::ToggleConfig;
//!
//! # async fn run() -> Result<(), toggle::engine::ToggleError> {
//! let toggle = Toggle::builder().config(ToggleConfig::default()).build().await?;
//! if toggle.service().is_enabled("checkout") {
//!     // new flow
//! }
//! # Ok(())
//! # }
//! ```

pub use toggle_domain as domain;
pub use toggle_engine as engine;
pub use toggle_event_bus as events;

use std::path::Path;
use std::sync::Arc;
use toggle_domain::config::ToggleConfig;
use toggle_engine::strategy::PropertySource;
use toggle_engine::{
    BootstrapReport, Bootstrapper, ConfigurationEvent, Definitions, FeatureService, NameStore,
    ToggleError, ToggleErrorExt,
};
use toggle_event_bus::NotificationBus;
use tracing::{debug, info};

/// A bootstrapped feature service.
#[derive(Debug)]
pub struct Toggle {
    config: ToggleConfig,
    bootstrapper: Bootstrapper,
    initial: Definitions,
}

/// Builder for [`Toggle`].
#[derive(Debug, Default)]
pub struct ToggleBuilder {
    config: ToggleConfig,
    definitions: Definitions,
    source: Option<Arc<dyn PropertySource>>,
    store: Option<Arc<dyn NameStore>>,
    bus: Option<NotificationBus<ConfigurationEvent>>,
}

impl ToggleBuilder {
    #[must_use = "The builder must be built to produce a service"]
    pub fn config(mut self, config: ToggleConfig) -> Self {
        self.config = config;
        self
    }

    /// Definitions loaded in addition to the configured definitions file.
    #[must_use = "The builder must be built to produce a service"]
    pub fn definitions(mut self, definitions: Definitions) -> Self {
        self.definitions.extend(definitions);
        self
    }

    #[must_use = "The builder must be built to produce a service"]
    pub fn property_source(mut self, source: Arc<dyn PropertySource>) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use = "The builder must be built to produce a service"]
    pub fn name_store(mut self, store: Arc<dyn NameStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use = "The builder must be built to produce a service"]
    pub fn bus(mut self, bus: NotificationBus<ConfigurationEvent>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Creates the service and loads the definitions under `service.source`.
    ///
    /// # Errors
    /// Returns [`ToggleError::Io`] or [`ToggleError::Definitions`] when the
    /// configured definitions file cannot be read or parsed. Invalid records
    /// inside a well-formed document are skipped, not fatal.
    pub async fn build(self) -> Result<Toggle, ToggleError> {
        let mut service = FeatureService::builder();
        if let Some(source) = self.source {
            service = service.property_source(source);
        }
        if let Some(bus) = self.bus {
            service = service.bus(bus);
        }
        let service = service.build();

        let bootstrapper = match self.store {
            Some(store) => Bootstrapper::with_store(service, store),
            None => Bootstrapper::new(service),
        };

        let toggle = Toggle { config: self.config, bootstrapper, initial: self.definitions };
        let report = toggle.load().await?;
        info!(
            source = %toggle.config.service.source,
            features = toggle.service().list_features().len(),
            groups = toggle.service().list_groups().len(),
            strategies = toggle.service().list_strategies().len(),
            rejected = report.rejected.len(),
            "Toggle service ready"
        );
        Ok(toggle)
    }
}

impl Toggle {
    #[must_use = "The builder must be built to produce a service"]
    pub fn builder() -> ToggleBuilder {
        ToggleBuilder::default()
    }

    pub const fn service(&self) -> &FeatureService {
        self.bootstrapper.service()
    }

    pub const fn bootstrapper(&self) -> &Bootstrapper {
        &self.bootstrapper
    }

    pub const fn config(&self) -> &ToggleConfig {
        &self.config
    }

    pub fn bus(&self) -> &NotificationBus<ConfigurationEvent> {
        self.service().bus()
    }

    /// Re-reads the definitions file and replaces everything loaded under `service.source`.
    ///
    /// # Errors
    /// Same as [`ToggleBuilder::build`]; on error the previous definitions stay loaded.
    pub async fn reload(&self) -> Result<BootstrapReport, ToggleError> {
        let definitions = self.definitions().await?;
        Ok(self.bootstrapper.reload(&self.config.service.source, &definitions))
    }

    async fn load(&self) -> Result<BootstrapReport, ToggleError> {
        let definitions = self.definitions().await?;
        Ok(self.bootstrapper.load(&self.config.service.source, &definitions))
    }

    async fn definitions(&self) -> Result<Definitions, ToggleError> {
        let mut definitions = match &self.config.service.definitions {
            Some(path) => read_definitions(path).await?,
            None => Definitions::default(),
        };
        definitions.extend(self.initial.clone());
        Ok(definitions)
    }
}

/// Reads a JSON definitions document.
///
/// # Errors
/// Returns [`ToggleError::Io`] when the file cannot be read and
/// [`ToggleError::Definitions`] when it is not a valid document.
pub async fn read_definitions(path: impl AsRef<Path>) -> Result<Definitions, ToggleError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading definitions");

    let bytes = tokio::fs::read(path).await.context(path.display().to_string())?;
    serde_json::from_slice::<Definitions>(&bytes).context(path.display().to_string())
}
