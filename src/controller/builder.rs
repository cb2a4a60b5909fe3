use std::sync::Arc;

use crate::{
    core::{Admission, Clock, Config, SystemClock},
    documents::{DraftPrefix, IdentityResolver},
    error::ConfigError,
    events::Bus,
    store::DocumentStore,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{config::ControllerConfig, core::Controller};

/// Builder for constructing a [`Controller`] with optional parts.
///
/// Defaults: [`DraftPrefix`] identities, [`SystemClock`], no subscribers,
/// [`ControllerConfig::default`].
pub struct ControllerBuilder {
    cfg: Config,
    store: Arc<dyn DocumentStore>,
    resolver: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    controller_config: ControllerConfig,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration and store.
    pub fn new(cfg: Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            cfg,
            store,
            resolver: Arc::new(DraftPrefix::default()),
            clock: Arc::new(SystemClock),
            subscribers: Vec::new(),
            controller_config: ControllerConfig::default(),
        }
    }

    /// Sets how raw ids fold into one identity.
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the time source used for `featuredAt` stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive controller events (admissions, evictions, failures)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets queue and bus capacities.
    pub fn with_controller_config(mut self, config: ControllerConfig) -> Self {
        self.controller_config = config;
        self
    }

    /// Validates the configuration, then builds and starts the controller.
    ///
    /// Must be called inside a Tokio runtime: the controller loop, the event
    /// listener and subscriber workers are spawned here.
    pub fn build(self) -> Result<Arc<Controller>, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.controller_config.bus_capacity);
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let engine = Arc::new(Admission::new(
            self.cfg,
            self.store,
            self.resolver,
            self.clock,
            bus.clone(),
        ));

        Ok(Controller::start(self.controller_config, engine, bus, subs))
    }
}
