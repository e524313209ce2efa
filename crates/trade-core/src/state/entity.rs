//! Entity state machine backed by storage.
//!
//! Every status change for an entity goes through [`EntityStateMachine`],
//! which holds a per-entity lock across the read, validate and write steps
//! and checks the caller's expected version before applying anything.

use crate::engine::LifecycleEngine;
use crate::event_bus::EventBus;
use crate::registry::StatusRegistry;
use crate::stats::{AggregateStatsCalculator, Summary};
use crate::timeline::{self, TimelineView};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::instrument;
use trade_storage::{StorageError, StorageService};
use trade_types::{
	truncate_id, APIError, ActorRole, Entity, EntityKind, LifecycleError, LifecycleEvent,
	OrderStatus, QuoteResponse, QuoteStatus, Status, StorageKey,
};

/// Errors that can occur while reading or changing stored entities.
#[derive(Debug, Error)]
pub enum StateError {
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("{kind} not found: {id}")]
	NotFound { kind: EntityKind, id: String },
	#[error("{kind} already exists: {id}")]
	AlreadyExists { kind: EntityKind, id: String },
}

impl From<StorageError> for StateError {
	fn from(err: StorageError) -> Self {
		StateError::Storage(err.to_string())
	}
}

impl From<StateError> for APIError {
	fn from(err: StateError) -> Self {
		let message = err.to_string();
		match err {
			StateError::Lifecycle(e) => e.into(),
			StateError::NotFound { .. } => APIError::not_found(message),
			StateError::AlreadyExists { .. } => APIError::Conflict {
				error_type: "ALREADY_EXISTS".to_string(),
				message,
			},
			StateError::Storage(_) => APIError::internal(message),
		}
	}
}

/// A requested status change.
#[derive(Debug, Clone)]
pub struct TransitionCommand {
	/// Status label, exactly as listed for the entity kind.
	pub status: String,
	pub role: ActorRole,
	pub description: Option<String>,
	pub location: Option<String>,
	/// Version the caller last observed.
	pub expected_version: Option<u64>,
}

impl TransitionCommand {
	pub fn new(status: impl Into<String>, role: ActorRole) -> Self {
		Self {
			status: status.into(),
			role,
			description: None,
			location: None,
			expected_version: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_location(mut self, location: impl Into<String>) -> Self {
		self.location = Some(location.into());
		self
	}

	pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
		self.expected_version = version;
		self
	}
}

/// Entities of one kind together with their summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
	pub kind: EntityKind,
	pub summary: Summary,
	pub entities: Vec<Entity>,
}

/// Holds one entity's lock slot. Dropping it removes the slot from the map
/// once no other caller holds or awaits the same lock.
struct EntityLock<'a> {
	locks: &'a DashMap<String, Arc<Mutex<()>>>,
	key: String,
	lock: Arc<Mutex<()>>,
}

impl Drop for EntityLock<'_> {
	fn drop(&mut self) {
		// Two references left: the map's and this handle's
		self.locks.remove_if(&self.key, |_, lock| {
			Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
		});
	}
}

/// Manages entity persistence and serialized lifecycle transitions.
pub struct EntityStateMachine {
	storage: Arc<StorageService>,
	event_bus: EventBus,
	locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EntityStateMachine {
	pub fn new(storage: Arc<StorageService>, event_bus: EventBus) -> Self {
		Self {
			storage,
			event_bus,
			locks: DashMap::new(),
		}
	}

	fn namespace(kind: EntityKind) -> &'static str {
		StorageKey::for_kind(kind).as_str()
	}

	fn lock_for(&self, kind: EntityKind, id: &str) -> EntityLock<'_> {
		let key = format!("{}:{}", kind, id);
		let lock = self.locks.entry(key.clone()).or_default().clone();
		EntityLock {
			locks: &self.locks,
			key,
			lock,
		}
	}

	/// Subscribes to lifecycle events.
	pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
		self.event_bus.subscribe()
	}

	/// Creates and stores a new entity in its kind's initial status.
	///
	/// `milestones` are status labels seeded into the timeline as expected
	/// events. A random id is generated when none is given.
	#[instrument(skip_all, fields(kind = %kind))]
	pub async fn create(
		&self,
		kind: EntityKind,
		id: Option<String>,
		payload: serde_json::Value,
		milestones: &[String],
	) -> Result<Entity, StateError> {
		let expected = milestones
			.iter()
			.map(|label| Status::parse(kind, label))
			.collect::<Result<Vec<_>, _>>()?;

		let id = id
			.filter(|id| !id.trim().is_empty())
			.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

		let slot = self.lock_for(kind, &id);
		let _guard = slot.lock.lock().await;

		if self.storage.exists(Self::namespace(kind), &id).await? {
			return Err(StateError::AlreadyExists { kind, id });
		}

		let mut entity = Entity::new(kind, id, payload);
		for status in expected {
			let label = StatusRegistry::metadata(kind, status)
				.map(|meta| meta.label)
				.unwrap_or(status.as_str());
			entity = entity.with_expected(status, format!("{} expected", label));
		}

		self.storage
			.store(Self::namespace(kind), &entity.id, &entity)
			.await?;

		tracing::info!(entity_id = %truncate_id(&entity.id), status = %entity.status, "Created");
		self.event_bus
			.publish(LifecycleEvent::Created {
				kind,
				entity_id: entity.id.clone(),
				status: entity.status,
			})
			.ok();

		Ok(entity)
	}

	/// Loads an entity.
	pub async fn get(&self, kind: EntityKind, id: &str) -> Result<Entity, StateError> {
		let entity: Entity = self
			.storage
			.retrieve(Self::namespace(kind), id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => StateError::NotFound {
					kind,
					id: id.to_string(),
				},
				other => other.into(),
			})?;
		if entity.kind != kind {
			return Err(StateError::NotFound {
				kind,
				id: id.to_string(),
			});
		}
		Ok(entity)
	}

	/// All stored entities of a kind, ordered by id.
	pub async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, StateError> {
		let entities: Vec<Entity> = self.storage.retrieve_all(Self::namespace(kind)).await?;
		Ok(entities.into_iter().filter(|e| e.kind == kind).collect())
	}

	/// Applies a transition to a stored entity.
	#[instrument(skip_all, fields(kind = %kind, entity_id = %truncate_id(id), to = %command.status))]
	pub async fn transition(
		&self,
		kind: EntityKind,
		id: &str,
		command: TransitionCommand,
	) -> Result<Entity, StateError> {
		let slot = self.lock_for(kind, id);
		let _guard = slot.lock.lock().await;

		let entity = self.get(kind, id).await?;
		if let Some(expected) = command.expected_version {
			if expected != entity.version {
				return Err(LifecycleError::ConcurrentModification {
					id: id.to_string(),
					expected,
					actual: entity.version,
				}
				.into());
			}
		}

		let updated = LifecycleEngine::transition_named(
			&entity,
			&command.status,
			command.role,
			command.description.unwrap_or_default(),
			command.location,
		)
		.inspect_err(|e| {
			tracing::warn!(from = %entity.status, role = %command.role, error = %e, "Transition rejected")
		})?;

		self.storage
			.update(Self::namespace(kind), id, &updated)
			.await?;

		let terminal = StatusRegistry::is_terminal(kind, updated.status);
		tracing::info!(
			from = %entity.status,
			to = %updated.status,
			version = updated.version,
			terminal,
			"Transitioned"
		);
		self.event_bus
			.publish(LifecycleEvent::Transitioned {
				kind,
				entity_id: updated.id.clone(),
				from: entity.status,
				to: updated.status,
				actor: command.role,
				version: updated.version,
				terminal,
			})
			.ok();

		Ok(updated)
	}

	/// Cancels an order.
	pub async fn cancel_order(
		&self,
		id: &str,
		role: ActorRole,
		reason: Option<String>,
		expected_version: Option<u64>,
	) -> Result<Entity, StateError> {
		let description = reason
			.filter(|r| !r.trim().is_empty())
			.unwrap_or_else(|| format!("Cancelled by {}", role));
		let command = TransitionCommand::new(OrderStatus::Cancelled.as_str(), role)
			.with_description(description)
			.with_expected_version(expected_version);
		self.transition(EntityKind::Order, id, command).await
	}

	/// Accepts, rejects or counters a quote.
	pub async fn respond_to_quote(
		&self,
		id: &str,
		role: ActorRole,
		response: QuoteResponse,
		message: Option<String>,
		expected_version: Option<u64>,
	) -> Result<Entity, StateError> {
		let (status, default_description) = match response {
			QuoteResponse::Accept => (QuoteStatus::Accepted, "Quote accepted"),
			QuoteResponse::Reject => (QuoteStatus::Rejected, "Quote rejected"),
			QuoteResponse::Negotiate => (QuoteStatus::Negotiating, "Counter-offer sent"),
		};
		let description = message
			.filter(|m| !m.trim().is_empty())
			.unwrap_or_else(|| default_description.to_string());
		let command = TransitionCommand::new(status.as_str(), role)
			.with_description(description)
			.with_expected_version(expected_version);
		self.transition(EntityKind::Quote, id, command).await
	}

	/// Recomputes the summary of a kind from the stored entities.
	pub async fn summarize(&self, kind: EntityKind) -> Result<Summary, StateError> {
		let entities = self.list(kind).await?;
		Ok(AggregateStatsCalculator::summarize(kind, &entities))
	}

	/// Entities of a kind plus their summary, from a single listing.
	pub async fn dashboard(&self, kind: EntityKind) -> Result<Dashboard, StateError> {
		let entities = self.list(kind).await?;
		let summary = AggregateStatsCalculator::summarize(kind, &entities);
		Ok(Dashboard {
			kind,
			summary,
			entities,
		})
	}

	/// Projected display timeline of a stored entity.
	pub async fn timeline(&self, kind: EntityKind, id: &str) -> Result<TimelineView, StateError> {
		let entity = self.get(kind, id).await?;
		Ok(timeline::project(&entity).to_view())
	}
}
