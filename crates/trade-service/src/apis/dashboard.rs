//! Dashboard endpoint.

use super::{parse_kind, Actor};
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	response::Json,
};
use trade_core::Dashboard;
use trade_types::APIError;

/// Handles GET /api/dashboard/{kind} requests.
///
/// Returns every entity of the kind with its summary counts, recomputed on
/// each read.
pub async fn get_dashboard(
	Path(kind): Path<String>,
	Actor(role): Actor,
	State(state): State<AppState>,
) -> Result<Json<Dashboard>, APIError> {
	let kind = parse_kind(&kind)?;
	tracing::debug!(kind = %kind, role = %role, "Dashboard requested");

	match state.service.state().dashboard(kind).await {
		Ok(dashboard) => Ok(Json(dashboard)),
		Err(e) => {
			tracing::warn!("Dashboard retrieval failed: {}", e);
			Err(APIError::from(e))
		},
	}
}
