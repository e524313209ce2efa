//! API handlers for the lifecycle endpoints.
//!
//! Shared request plumbing lives here: the actor role extractor, path kind
//! parsing and the entity response shape returned by every endpoint that
//! hands back a single entity.

pub mod dashboard;
pub mod entity;
pub mod transitions;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use trade_core::{DerivedFields, LifecycleEngine};
use trade_types::{APIError, ActorRole, Entity, EntityKind};

/// Header carrying the caller's role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The role of the caller, read from the `x-actor-role` header.
///
/// Requests without the header act as a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub ActorRole);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
	type Rejection = APIError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let Some(value) = parts.headers.get(ACTOR_ROLE_HEADER) else {
			return Ok(Actor(ActorRole::Customer));
		};
		let raw = value
			.to_str()
			.map_err(|_| APIError::bad_request("Actor role header is not valid text"))?;
		raw.trim()
			.parse::<ActorRole>()
			.map(Actor)
			.map_err(|_| APIError::bad_request(format!("Unknown actor role: {}", raw)))
	}
}

/// Parses the `{kind}` path segment (singular or plural).
pub fn parse_kind(segment: &str) -> Result<EntityKind, APIError> {
	segment
		.parse()
		.map_err(|_| APIError::not_found(format!("Unknown entity collection: {}", segment)))
}

/// An entity together with its derived fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResponse {
	pub entity: Entity,
	#[serde(flatten)]
	pub derived: DerivedFields,
}

impl From<Entity> for EntityResponse {
	fn from(entity: Entity) -> Self {
		let derived = LifecycleEngine::derive(&entity);
		Self { entity, derived }
	}
}

#[cfg(test)]
mod tests {
	use crate::server::router;
	use axum::{
		body::{to_bytes, Body},
		http::{Method, Request, StatusCode},
		Router,
	};
	use serde_json::{json, Value};
	use tower::ServiceExt;
	use trade_config::{ApiConfig, Config};
	use trade_core::{LifecycleBuilder, LifecycleFactories};

	fn app() -> Router {
		let factories = LifecycleFactories {
			storage_factories: trade_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		};
		let service = LifecycleBuilder::new(Config::for_testing())
			.build(factories)
			.unwrap();
		let api_config = ApiConfig {
			enabled: true,
			host: "127.0.0.1".to_string(),
			port: 0,
			timeout_seconds: 5,
			cors: None,
		};
		router(&api_config, service)
	}

	async fn send(
		app: &Router,
		method: Method,
		uri: &str,
		role: Option<&str>,
		body: Option<Value>,
	) -> (StatusCode, Value) {
		let mut request = Request::builder().method(method).uri(uri);
		if let Some(role) = role {
			request = request.header(super::ACTOR_ROLE_HEADER, role);
		}
		let request = match body {
			Some(body) => request
				.header("content-type", "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => request.body(Body::empty()).unwrap(),
		};

		let response = app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let value = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, value)
	}

	#[tokio::test]
	async fn test_order_cancel_flow() {
		let app = app();
		let (status, body) =
			send(&app, Method::POST, "/api/orders", None, Some(json!({"id": "ord-1"}))).await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["entity"]["status"], "Pending");

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/ord-1/cancel",
			Some("customer"),
			Some(json!({"reason": "Customer requested cancellation"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["entity"]["status"], "Cancelled");
		assert_eq!(body["terminal"], true);

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/ord-1/status",
			Some("admin"),
			Some(json!({"status": "Shipped"})),
		)
		.await;
		assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(body["error"], "INVALID_TRANSITION");
	}

	#[tokio::test]
	async fn test_error_status_mapping() {
		let app = app();
		send(&app, Method::POST, "/api/orders", None, Some(json!({"id": "ord-2"}))).await;

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/ord-2/status",
			None,
			Some(json!({"status": "Processing"})),
		)
		.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "FORBIDDEN");

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/ord-2/status",
			Some("supplier"),
			Some(json!({"status": "processing"})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "UNKNOWN_STATUS");

		let (status, _) = send(
			&app,
			Method::PUT,
			"/api/orders/ord-2/status",
			Some("supplier"),
			Some(json!({"status": "Processing", "expectedVersion": 7})),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);

		let (status, _) = send(&app, Method::GET, "/api/orders/missing", None, None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, _) = send(&app, Method::GET, "/api/invoices/x", None, None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, _) = send(&app, Method::GET, "/api/orders/ord-2", Some("pirate"), None).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_quote_actions() {
		let app = app();
		send(&app, Method::POST, "/api/quotes", None, Some(json!({"id": "q-1"}))).await;

		let (status, body) =
			send(&app, Method::PUT, "/api/quotes/q-1/accept", Some("customer"), None).await;
		assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(body["error"], "NOT_RESPONDABLE");

		for label in ["in-review", "quoted"] {
			let (status, _) = send(
				&app,
				Method::PUT,
				"/api/quotes/q-1/status",
				Some("supplier"),
				Some(json!({"status": label})),
			)
			.await;
			assert_eq!(status, StatusCode::OK);
		}

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/quotes/q-1/respond",
			Some("customer"),
			Some(json!({"action": "negotiate", "message": "Can you do 5% less?"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["entity"]["status"], "negotiating");

		// Cancellation is an order action only
		let (status, _) =
			send(&app, Method::PUT, "/api/quotes/q-1/cancel", Some("customer"), None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_dashboard_and_timeline() {
		let app = app();
		send(
			&app,
			Method::POST,
			"/api/shipments",
			None,
			Some(json!({
				"id": "shp-1",
				"payload": {"carrier": "DHL"},
				"milestones": ["Picked Up", "In Transit", "Delivered"]
			})),
		)
		.await;
		send(
			&app,
			Method::PUT,
			"/api/shipments/shp-1/status",
			Some("supplier"),
			Some(json!({"status": "Picked Up", "location": "Shanghai"})),
		)
		.await;

		let (status, body) = send(&app, Method::GET, "/api/dashboard/shipments", None, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["summary"]["total"], 1);
		assert_eq!(body["summary"]["byStatus"]["Picked Up"], 1);
		assert_eq!(body["entities"][0]["id"], "shp-1");

		let (status, body) =
			send(&app, Method::GET, "/api/shipments/shp-1/timeline", None, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["progress"]["completed"], 2);
		assert_eq!(body["progress"]["total"], 4);
		assert_eq!(body["events"][4]["location"], "Shanghai");
		assert_eq!(body["current"], 4);
	}
}
