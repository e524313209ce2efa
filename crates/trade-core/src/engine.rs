//! Applies validated transitions to entities.
//!
//! [`LifecycleEngine`] is the only mutation path for an entity's status. It
//! never touches storage: callers hand it a snapshot and get back the updated
//! copy, or the validator's rejection.

use crate::registry::StatusRegistry;
use crate::timeline::{self, Progress};
use crate::validator::TransitionValidator;
use chrono::Utc;
use serde::Serialize;
use trade_types::{ActorRole, Entity, LifecycleError, Status, TimelineEvent};

/// Fields dashboards derive from an entity after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
	pub terminal: bool,
	pub progress: Progress,
}

/// Stateless transition applier.
pub struct LifecycleEngine;

impl LifecycleEngine {
	/// Validates and applies a transition.
	///
	/// On success the returned entity carries the new status, a completed
	/// timeline event stamped now, a refreshed `updated_at` and a bumped
	/// version. The input is left untouched either way.
	pub fn transition(
		entity: &Entity,
		requested: Status,
		role: ActorRole,
		description: impl Into<String>,
		location: Option<String>,
	) -> Result<Entity, LifecycleError> {
		let base = if StatusRegistry::is_overlay(entity.status) {
			TransitionValidator::resume_point(&entity.timeline)
		} else {
			None
		};
		TransitionValidator::check_from(entity.kind, entity.status, base, requested, role)?;

		let mut description = description.into();
		if description.trim().is_empty() {
			description = default_description(entity, requested);
		}

		let now = Utc::now();
		let mut updated = entity.clone();
		updated.status = requested;
		updated
			.timeline
			.push(TimelineEvent::completed(requested, description, location, now));
		// Keep updated_at monotonic even if the wall clock stepped back
		updated.updated_at = now.max(entity.updated_at);
		updated.version = entity.version + 1;

		tracing::debug!(
			entity_id = %trade_types::truncate_id(&entity.id),
			kind = %entity.kind,
			from = %entity.status,
			to = %requested,
			role = %role,
			"Applied transition"
		);
		Ok(updated)
	}

	/// Like [`LifecycleEngine::transition`], taking the requested status as a
	/// wire label.
	///
	/// A terminal entity is rejected with `InvalidTransition` before the
	/// label is even parsed.
	pub fn transition_named(
		entity: &Entity,
		requested: &str,
		role: ActorRole,
		description: impl Into<String>,
		location: Option<String>,
	) -> Result<Entity, LifecycleError> {
		if StatusRegistry::is_terminal(entity.kind, entity.status) {
			// Echo whatever the caller asked for when it parses, else the current status
			let to = Status::parse(entity.kind, requested).unwrap_or(entity.status);
			return Err(LifecycleError::InvalidTransition {
				kind: entity.kind,
				from: entity.status,
				to,
			});
		}
		let requested = Status::parse(entity.kind, requested)?;
		Self::transition(entity, requested, role, description, location)
	}

	/// Recomputes the derived fields of an entity.
	pub fn derive(entity: &Entity) -> DerivedFields {
		DerivedFields {
			terminal: StatusRegistry::is_terminal(entity.kind, entity.status),
			progress: timeline::project(entity).progress(),
		}
	}
}

fn default_description(entity: &Entity, requested: Status) -> String {
	let label = StatusRegistry::metadata(entity.kind, requested)
		.map(|meta| meta.label)
		.unwrap_or(requested.as_str());
	format!("Status changed to {}", label)
}

#[cfg(test)]
mod tests {
	use super::*;
	use trade_types::{EntityKind, OrderStatus, QuoteStatus, ShipmentStatus};

	fn order() -> Entity {
		Entity::new(EntityKind::Order, "ord-100", serde_json::json!({"lines": 2}))
	}

	#[test]
	fn test_transition_appends_completed_event() {
		let original = order();
		let updated = LifecycleEngine::transition(
			&original,
			OrderStatus::Processing.into(),
			ActorRole::Supplier,
			"Picked by warehouse",
			None,
		)
		.unwrap();

		assert_eq!(updated.status, Status::Order(OrderStatus::Processing));
		assert_eq!(updated.timeline.len(), 2);
		let last = updated.timeline.last().unwrap();
		assert!(last.is_completed);
		assert!(last.timestamp.is_some());
		assert_eq!(last.description, "Picked by warehouse");
		assert_eq!(updated.version, 1);
		assert!(updated.updated_at >= original.updated_at);
		assert_eq!(updated.payload, original.payload);
		// Input untouched
		assert_eq!(original.timeline.len(), 1);
	}

	#[test]
	fn test_rejection_leaves_nothing_applied() {
		let original = order();
		let result = LifecycleEngine::transition(
			&original,
			OrderStatus::Shipped.into(),
			ActorRole::Customer,
			"",
			None,
		);
		assert!(matches!(result, Err(LifecycleError::Forbidden { .. })));
	}

	#[test]
	fn test_blank_description_gets_default() {
		let updated = LifecycleEngine::transition(
			&order(),
			OrderStatus::Confirmed.into(),
			ActorRole::Admin,
			"  ",
			None,
		)
		.unwrap();
		assert_eq!(updated.timeline[1].description, "Status changed to Confirmed");
	}

	#[test]
	fn test_named_transition_terminal_first() {
		let cancelled = LifecycleEngine::transition(
			&order(),
			OrderStatus::Cancelled.into(),
			ActorRole::Customer,
			"Customer requested cancellation",
			None,
		)
		.unwrap();

		for label in ["Shipped", "not-a-status"] {
			let result = LifecycleEngine::transition_named(
				&cancelled,
				label,
				ActorRole::Admin,
				"",
				None,
			);
			assert!(matches!(result, Err(LifecycleError::InvalidTransition { .. })));
		}

		let unknown =
			LifecycleEngine::transition_named(&order(), "shipped", ActorRole::Admin, "", None);
		assert!(matches!(unknown, Err(LifecycleError::UnknownStatus { .. })));
	}

	#[test]
	fn test_delayed_shipment_resumes_from_last_position() {
		let mut shipment = Entity::new(EntityKind::Shipment, "shp-7", serde_json::Value::Null);
		for (status, role) in [
			(ShipmentStatus::PickedUp, ActorRole::Supplier),
			(ShipmentStatus::InTransit, ActorRole::Supplier),
			(ShipmentStatus::Delayed, ActorRole::Admin),
		] {
			shipment =
				LifecycleEngine::transition(&shipment, status.into(), role, "", Some("Rotterdam".into()))
					.unwrap();
		}

		let back = LifecycleEngine::transition(
			&shipment,
			ShipmentStatus::PickedUp.into(),
			ActorRole::Admin,
			"",
			None,
		);
		assert!(matches!(back, Err(LifecycleError::InvalidTransition { .. })));

		let resumed = LifecycleEngine::transition(
			&shipment,
			ShipmentStatus::InTransit.into(),
			ActorRole::Supplier,
			"Back on schedule",
			None,
		)
		.unwrap();
		assert_eq!(resumed.status, Status::Shipment(ShipmentStatus::InTransit));
		assert_eq!(resumed.version, 4);
	}

	#[test]
	fn test_derived_fields() {
		let quote = Entity::new(EntityKind::Quote, "q-1", serde_json::Value::Null);
		let derived = LifecycleEngine::derive(&quote);
		assert!(!derived.terminal);
		assert_eq!(derived.progress.completed, 1);
		assert_eq!(derived.progress.total, 4);

		let mut quote = quote;
		for status in [QuoteStatus::InReview, QuoteStatus::Quoted] {
			quote = LifecycleEngine::transition(&quote, status.into(), ActorRole::Supplier, "", None)
				.unwrap();
		}
		quote = LifecycleEngine::transition(
			&quote,
			QuoteStatus::Accepted.into(),
			ActorRole::Customer,
			"",
			None,
		)
		.unwrap();
		let derived = LifecycleEngine::derive(&quote);
		assert!(derived.terminal);
		assert_eq!(derived.progress.percent, 100);
	}
}
