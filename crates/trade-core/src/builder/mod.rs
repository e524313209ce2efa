//! Builder for the lifecycle service.
//!
//! Resolves the configured storage backend through its factory and wires the
//! storage, event bus and state machine together.

use crate::event_bus::EventBus;
use crate::state::EntityStateMachine;
use crate::LifecycleService;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use trade_config::Config;
use trade_storage::{StorageError, StorageInterface, StorageService};

/// Errors that can occur during service construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct LifecycleFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing a [`LifecycleService`].
pub struct LifecycleBuilder {
	config: Config,
}

impl LifecycleBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the service, instantiating only the primary storage backend.
	pub fn build<SF>(self, factories: LifecycleFactories<SF>) -> Result<LifecycleService, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let storage_config = self.config.storage.implementations.get(primary).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' has no configuration section",
				primary
			))
		})?;
		let factory = factories.storage_factories.get(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!("storage implementation '{}'", primary))
		})?;

		let backend = factory(storage_config).map_err(|e| {
			tracing::error!(
				component = "storage",
				implementation = %primary,
				error = %e,
				"Failed to create storage implementation"
			);
			BuilderError::Config(format!(
				"Failed to create storage implementation '{}': {}",
				primary, e
			))
		})?;
		tracing::info!(component = "storage", implementation = %primary, "Loaded");

		let storage = Arc::new(StorageService::new(backend));
		let event_bus = EventBus::new(self.config.lifecycle.event_capacity);
		let state = Arc::new(EntityStateMachine::new(storage, event_bus.clone()));

		Ok(LifecycleService {
			config: self.config,
			state,
			event_bus,
		})
	}
}
