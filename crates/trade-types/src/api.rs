//! API types for the lifecycle HTTP API.
//!
//! Request bodies for the transition endpoints and the structured error type
//! that maps lifecycle failures onto HTTP status codes.

use crate::LifecycleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for creating an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntityRequest {
	/// Identifier to use; a UUID is generated when absent.
	pub id: Option<String>,
	/// Kind-specific payload stored unchanged.
	#[serde(default)]
	pub payload: serde_json::Value,
	/// Expected milestones to seed into the timeline, as status labels.
	#[serde(default)]
	pub milestones: Vec<String>,
}

/// Request body for a generic status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
	/// Requested status label, exactly as listed for the entity kind.
	pub status: String,
	/// Timeline description; a default is derived from the status when absent.
	pub description: Option<String>,
	/// Free-text location for shipment events.
	pub location: Option<String>,
	/// Version the caller last observed, for optimistic concurrency.
	pub expected_version: Option<u64>,
}

/// Request body for cancelling an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
	pub reason: Option<String>,
	pub expected_version: Option<u64>,
}

/// A customer's answer to a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteResponse {
	Accept,
	Reject,
	/// Counter-offer; moves the quote into negotiation.
	Negotiate,
}

/// Request body for responding to a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
	pub action: QuoteResponse,
	pub message: Option<String>,
	pub expected_version: Option<u64>,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed request or unknown status (400)
	BadRequest { error_type: String, message: String },
	/// Role not allowed to perform the change (403)
	Forbidden { error_type: String, message: String },
	/// Entity does not exist (404)
	NotFound { error_type: String, message: String },
	/// Stale version or concurrent writer (409)
	Conflict { error_type: String, message: String },
	/// Lifecycle rule rejected the change (422)
	UnprocessableEntity { error_type: String, message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest { error_type, message }
			| APIError::Forbidden { error_type, message }
			| APIError::NotFound { error_type, message }
			| APIError::Conflict { error_type, message }
			| APIError::UnprocessableEntity { error_type, message }
			| APIError::InternalServerError { error_type, message } => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
			details: None,
		}
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		APIError::NotFound {
			error_type: "NOT_FOUND".to_string(),
			message: message.into(),
		}
	}

	pub fn bad_request(message: impl Into<String>) -> Self {
		APIError::BadRequest {
			error_type: "BAD_REQUEST".to_string(),
			message: message.into(),
		}
	}

	pub fn internal(message: impl Into<String>) -> Self {
		APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message: message.into(),
		}
	}
}

impl From<LifecycleError> for APIError {
	fn from(err: LifecycleError) -> Self {
		let error_type = err.code().to_string();
		let message = err.to_string();
		match err {
			LifecycleError::UnknownStatus { .. } | LifecycleError::MalformedRecord(_) => {
				APIError::BadRequest { error_type, message }
			},
			LifecycleError::Forbidden { .. } => APIError::Forbidden { error_type, message },
			LifecycleError::ConcurrentModification { .. } => {
				APIError::Conflict { error_type, message }
			},
			LifecycleError::InvalidTransition { .. }
			| LifecycleError::NotCancellable { .. }
			| LifecycleError::NotRespondable { .. } => {
				APIError::UnprocessableEntity { error_type, message }
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let response = self.to_error_response();
		write!(f, "{} ({}): {}", self.status_code(), response.error, response.message)
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ActorRole, EntityKind, OrderStatus, Status};

	#[test]
	fn test_lifecycle_errors_map_to_status_codes() {
		let forbidden = LifecycleError::Forbidden {
			role: ActorRole::Customer,
			kind: EntityKind::Order,
			from: Status::Order(OrderStatus::Processing),
			to: Status::Order(OrderStatus::Shipped),
		};
		assert_eq!(APIError::from(forbidden).status_code(), 403);

		let conflict = LifecycleError::ConcurrentModification {
			id: "ord-1".into(),
			expected: 1,
			actual: 2,
		};
		assert_eq!(APIError::from(conflict).status_code(), 409);

		let not_cancellable = LifecycleError::NotCancellable {
			status: Status::Order(OrderStatus::Shipped),
		};
		let api = APIError::from(not_cancellable);
		assert_eq!(api.status_code(), 422);
		assert_eq!(api.to_error_response().error, "NOT_CANCELLABLE");
	}

	#[test]
	fn test_request_bodies_use_camel_case() {
		let body: TransitionRequest = serde_json::from_value(serde_json::json!({
			"status": "In Transit",
			"location": "Rotterdam",
			"expectedVersion": 3
		}))
		.unwrap();
		assert_eq!(body.expected_version, Some(3));
		assert!(body.description.is_none());

		let respond: RespondRequest =
			serde_json::from_value(serde_json::json!({"action": "negotiate"})).unwrap();
		assert_eq!(respond.action, QuoteResponse::Negotiate);
	}
}
