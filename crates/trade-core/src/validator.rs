//! Transition rules.
//!
//! Statuses of one kind form a partial order (see [`StatusRegistry::rank`]).
//! Moves never go backward, terminal statuses never move, and a few
//! transitions carry their own preconditions: order cancellation, quote
//! acceptance or rejection, and the shipment `Delayed` overlay. Customers may
//! only perform those customer-facing actions; every other forward move needs
//! a privileged role.

use crate::registry::StatusRegistry;
use trade_types::{
	ActorRole, EntityKind, LifecycleError, OrderStatus, QuoteStatus, ShipmentStatus, Status,
	TimelineEvent,
};

/// Decides whether a requested transition is legal.
pub struct TransitionValidator;

impl TransitionValidator {
	/// Checks a transition from `current` to `requested`.
	///
	/// When `current` is the shipment `Delayed` overlay, the position it is
	/// resumed from is assumed to be `Pending Pickup`; use
	/// [`TransitionValidator::check_from`] to supply the real one.
	pub fn check(
		kind: EntityKind,
		current: Status,
		requested: Status,
		role: ActorRole,
	) -> Result<(), LifecycleError> {
		Self::check_from(kind, current, None, requested, role)
	}

	/// Checks a transition, with `base` giving the last non-overlay status
	/// when `current` is an overlay.
	pub fn check_from(
		kind: EntityKind,
		current: Status,
		base: Option<Status>,
		requested: Status,
		role: ActorRole,
	) -> Result<(), LifecycleError> {
		let invalid = || LifecycleError::InvalidTransition {
			kind,
			from: current,
			to: requested,
		};
		let forbidden = || LifecycleError::Forbidden {
			role,
			kind,
			from: current,
			to: requested,
		};

		if StatusRegistry::is_terminal(current.kind(), current) {
			return Err(invalid());
		}
		if !StatusRegistry::is_allowed(kind, current) {
			return Err(LifecycleError::UnknownStatus {
				kind,
				status: current.to_string(),
			});
		}
		if !StatusRegistry::is_allowed(kind, requested) {
			return Err(LifecycleError::UnknownStatus {
				kind,
				status: requested.to_string(),
			});
		}
		if requested == current {
			return Err(invalid());
		}

		match requested {
			Status::Order(OrderStatus::Cancelled) => {
				if !matches!(
					current,
					Status::Order(
						OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Confirmed
					)
				) {
					return Err(LifecycleError::NotCancellable { status: current });
				}
				return match role {
					ActorRole::Supplier => Err(forbidden()),
					ActorRole::Customer | ActorRole::Admin => Ok(()),
				};
			},
			Status::Quote(QuoteStatus::Accepted | QuoteStatus::Rejected) => {
				if current != Status::Quote(QuoteStatus::Quoted) {
					return Err(LifecycleError::NotRespondable { status: current });
				}
				return match role {
					ActorRole::Supplier => Err(forbidden()),
					ActorRole::Customer | ActorRole::Admin => Ok(()),
				};
			},
			Status::Shipment(ShipmentStatus::Delayed) => {
				return if role.is_privileged() {
					Ok(())
				} else {
					Err(forbidden())
				};
			},
			_ => {},
		}

		let from_rank = if StatusRegistry::is_overlay(current) {
			position(base.unwrap_or(ShipmentStatus::PendingPickup.into()))
		} else {
			position(current)
		};
		let to_rank = position(requested);

		if to_rank < from_rank {
			return Err(invalid());
		}
		if to_rank == from_rank && !is_lateral(current, base, requested) {
			return Err(invalid());
		}
		if requested == Status::Quote(QuoteStatus::Negotiating)
			&& current != Status::Quote(QuoteStatus::Quoted)
		{
			return Err(invalid());
		}

		let customer_allowed = current == Status::Quote(QuoteStatus::Quoted)
			&& requested == Status::Quote(QuoteStatus::Negotiating);
		if role == ActorRole::Customer && !customer_allowed {
			return Err(forbidden());
		}

		Ok(())
	}

	/// The status an overlaid entity resumes from: the most recent completed,
	/// non-overlay status in its timeline.
	pub fn resume_point(timeline: &[TimelineEvent]) -> Option<Status> {
		timeline
			.iter()
			.rev()
			.filter(|e| e.is_completed)
			.map(|e| e.status)
			.find(|s| !StatusRegistry::is_overlay(*s))
	}
}

fn position(status: Status) -> u8 {
	StatusRegistry::rank(status).unwrap_or(0)
}

/// Same-rank moves allowed without going forward.
fn is_lateral(current: Status, base: Option<Status>, requested: Status) -> bool {
	match (current, requested) {
		(Status::Quote(QuoteStatus::Quoted), Status::Quote(QuoteStatus::Negotiating))
		| (Status::Quote(QuoteStatus::Negotiating), Status::Quote(QuoteStatus::Quoted)) => true,
		// Resuming an overlaid shipment at the position it was flagged from
		(Status::Shipment(ShipmentStatus::Delayed), _) => {
			requested == base.unwrap_or(ShipmentStatus::PendingPickup.into())
		},
		_ => false,
	}
}
