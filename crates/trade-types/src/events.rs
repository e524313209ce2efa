//! Event types for lifecycle notifications.
//!
//! Events are published on the lifecycle event bus after a change has been
//! persisted, so dashboards and other listeners can recompute their views.

use crate::{ActorRole, EntityKind, Status};
use serde::Serialize;

/// Main event type published by the lifecycle service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LifecycleEvent {
	/// A new entity has been stored.
	#[serde(rename_all = "camelCase")]
	Created {
		kind: EntityKind,
		entity_id: String,
		status: Status,
	},
	/// An entity moved from one status to another.
	#[serde(rename_all = "camelCase")]
	Transitioned {
		kind: EntityKind,
		entity_id: String,
		from: Status,
		to: Status,
		actor: ActorRole,
		version: u64,
		terminal: bool,
	},
}

impl LifecycleEvent {
	/// The id of the entity this event concerns.
	pub fn entity_id(&self) -> &str {
		match self {
			LifecycleEvent::Created { entity_id, .. } => entity_id,
			LifecycleEvent::Transitioned { entity_id, .. } => entity_id,
		}
	}
}
