//! Lifecycle core for orders, quotes and shipments.
//!
//! The pure pieces ([`registry`], [`validator`], [`engine`], [`stats`] and
//! [`timeline`]) decide and apply status changes without any I/O. The
//! [`state`] module persists entities through storage and serializes
//! transitions per entity, and [`builder`] assembles everything into a
//! [`LifecycleService`] from configuration.

pub mod builder;
pub mod engine;
pub mod event_bus;
pub mod registry;
pub mod state;
pub mod stats;
pub mod timeline;
pub mod validator;


pub use builder::{BuilderError, LifecycleBuilder, LifecycleFactories};
pub use engine::{DerivedFields, LifecycleEngine};
pub use event_bus::EventBus;
pub use registry::{StatusMeta, StatusRegistry};
pub use state::{Dashboard, EntityStateMachine, StateError, TransitionCommand};
pub use stats::{AggregateStatsCalculator, Summary};
pub use timeline::{
	DisplayEvent, Progress, Projection, TimelineProjector, TimelineTemplate, TimelineView,
};
pub use validator::TransitionValidator;

use std::sync::Arc;
use trade_config::Config;

/// The assembled lifecycle service.
///
/// Cheap to clone; all clones share the same state machine and event bus.
#[derive(Clone)]
pub struct LifecycleService {
	pub(crate) config: Config,
	pub(crate) state: Arc<EntityStateMachine>,
	pub(crate) event_bus: EventBus,
}

impl LifecycleService {
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Store-backed entity operations.
	pub fn state(&self) -> &Arc<EntityStateMachine> {
		&self.state
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}
}
