//! Lifecycle error type.
//!
//! Every variant is a recoverable, user-facing rejection. Callers are expected
//! to surface them as notifications rather than abort.

use crate::{ActorRole, EntityKind, Status};
use thiserror::Error;

/// Errors produced when validating or applying a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
	/// The requested status is not part of the entity kind's status set.
	#[error("Unknown {kind} status: {status}")]
	UnknownStatus { kind: EntityKind, status: String },
	/// The transition is not allowed, including any move out of a terminal
	/// status and any backward move.
	#[error("Invalid {kind} transition from {from} to {to}")]
	InvalidTransition {
		kind: EntityKind,
		from: Status,
		to: Status,
	},
	/// The order is past the point where it can be cancelled.
	#[error("Order cannot be cancelled while {status}")]
	NotCancellable { status: Status },
	/// The quote is not currently awaiting a customer response.
	#[error("Quote cannot be accepted or rejected while {status}")]
	NotRespondable { status: Status },
	/// The actor's role may not perform this transition.
	#[error("Role {role} may not move {kind} from {from} to {to}")]
	Forbidden {
		role: ActorRole,
		kind: EntityKind,
		from: Status,
		to: Status,
	},
	/// The stored record changed since the caller last read it.
	#[error("Concurrent modification of {id}: expected version {expected}, found {actual}")]
	ConcurrentModification {
		id: String,
		expected: u64,
		actual: u64,
	},
	/// An inbound record violates the entity invariants.
	#[error("Malformed record: {0}")]
	MalformedRecord(String),
}

impl LifecycleError {
	/// Stable machine-readable code for API responses.
	pub fn code(&self) -> &'static str {
		match self {
			LifecycleError::UnknownStatus { .. } => "UNKNOWN_STATUS",
			LifecycleError::InvalidTransition { .. } => "INVALID_TRANSITION",
			LifecycleError::NotCancellable { .. } => "NOT_CANCELLABLE",
			LifecycleError::NotRespondable { .. } => "NOT_RESPONDABLE",
			LifecycleError::Forbidden { .. } => "FORBIDDEN",
			LifecycleError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
			LifecycleError::MalformedRecord(_) => "MALFORMED_RECORD",
		}
	}
}
