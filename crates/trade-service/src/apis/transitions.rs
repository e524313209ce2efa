//! Lifecycle action endpoints.
//!
//! The generic status endpoint accepts any status label; the cancel, accept
//! and respond endpoints are shortcuts for the customer-facing actions and
//! only exist on their own collection.

use super::{parse_kind, Actor, EntityResponse};
use crate::server::AppState;
use axum::{
	body::Bytes,
	extract::{Path, State},
	response::Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use trade_core::TransitionCommand;
use trade_types::{
	APIError, CancelRequest, EntityKind, QuoteResponse, RespondRequest, TransitionRequest,
};

/// Optional body of the accept shortcut.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptRequest {
	pub message: Option<String>,
	pub expected_version: Option<u64>,
}

fn require_kind(segment: &str, expected: EntityKind) -> Result<(), APIError> {
	if parse_kind(segment)? == expected {
		Ok(())
	} else {
		Err(APIError::not_found(format!(
			"Action is not available on {}",
			segment
		)))
	}
}

/// Parses a body that may be omitted entirely.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, APIError> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(T::default());
	}
	serde_json::from_slice(body)
		.map_err(|e| APIError::bad_request(format!("Invalid request body: {}", e)))
}

/// Handles PUT /api/{kind}/{id}/status requests.
pub async fn update_status(
	Path((kind, id)): Path<(String, String)>,
	Actor(role): Actor,
	State(state): State<AppState>,
	Json(request): Json<TransitionRequest>,
) -> Result<Json<EntityResponse>, APIError> {
	let kind = parse_kind(&kind)?;
	let mut command = TransitionCommand::new(request.status, role)
		.with_expected_version(request.expected_version);
	command.description = request.description;
	command.location = request.location;

	let entity = state
		.service
		.state()
		.transition(kind, &id, command)
		.await
		.map_err(APIError::from)?;
	Ok(Json(entity.into()))
}

/// Handles PUT /api/orders/{id}/cancel requests.
pub async fn cancel_order(
	Path((kind, id)): Path<(String, String)>,
	Actor(role): Actor,
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<EntityResponse>, APIError> {
	require_kind(&kind, EntityKind::Order)?;
	let request: CancelRequest = optional_body(&body)?;

	let entity = state
		.service
		.state()
		.cancel_order(&id, role, request.reason, request.expected_version)
		.await
		.map_err(APIError::from)?;
	Ok(Json(entity.into()))
}

/// Handles PUT /api/quotes/{id}/accept requests.
pub async fn accept_quote(
	Path((kind, id)): Path<(String, String)>,
	Actor(role): Actor,
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<EntityResponse>, APIError> {
	require_kind(&kind, EntityKind::Quote)?;
	let request: AcceptRequest = optional_body(&body)?;

	let entity = state
		.service
		.state()
		.respond_to_quote(
			&id,
			role,
			QuoteResponse::Accept,
			request.message,
			request.expected_version,
		)
		.await
		.map_err(APIError::from)?;
	Ok(Json(entity.into()))
}

/// Handles PUT /api/quotes/{id}/respond requests.
pub async fn respond_to_quote(
	Path((kind, id)): Path<(String, String)>,
	Actor(role): Actor,
	State(state): State<AppState>,
	Json(request): Json<RespondRequest>,
) -> Result<Json<EntityResponse>, APIError> {
	require_kind(&kind, EntityKind::Quote)?;

	let entity = state
		.service
		.state()
		.respond_to_quote(
			&id,
			role,
			request.action,
			request.message,
			request.expected_version,
		)
		.await
		.map_err(APIError::from)?;
	Ok(Json(entity.into()))
}
