//! Entity creation and lookup endpoints.

use super::{parse_kind, Actor, EntityResponse};
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use trade_core::TimelineView;
use trade_types::{truncate_id, APIError, CreateEntityRequest};

/// Handles POST /api/{kind} requests.
pub async fn create_entity(
	Path(kind): Path<String>,
	Actor(role): Actor,
	State(state): State<AppState>,
	Json(request): Json<CreateEntityRequest>,
) -> Result<(StatusCode, Json<EntityResponse>), APIError> {
	let kind = parse_kind(&kind)?;
	let entity = state
		.service
		.state()
		.create(kind, request.id, request.payload, &request.milestones)
		.await
		.map_err(|e| {
			tracing::warn!(kind = %kind, role = %role, "Entity creation failed: {}", e);
			APIError::from(e)
		})?;
	Ok((StatusCode::CREATED, Json(entity.into())))
}

/// Handles GET /api/{kind}/{id} requests.
pub async fn get_entity(
	Path((kind, id)): Path<(String, String)>,
	Actor(_): Actor,
	State(state): State<AppState>,
) -> Result<Json<EntityResponse>, APIError> {
	let kind = parse_kind(&kind)?;
	let entity = state.service.state().get(kind, &id).await.map_err(|e| {
		tracing::debug!(entity_id = %truncate_id(&id), "Entity retrieval failed: {}", e);
		APIError::from(e)
	})?;
	Ok(Json(entity.into()))
}

/// Handles GET /api/{kind}/{id}/timeline requests.
pub async fn get_timeline(
	Path((kind, id)): Path<(String, String)>,
	Actor(_): Actor,
	State(state): State<AppState>,
) -> Result<Json<TimelineView>, APIError> {
	let kind = parse_kind(&kind)?;
	let view = state
		.service
		.state()
		.timeline(kind, &id)
		.await
		.map_err(APIError::from)?;
	Ok(Json(view))
}
