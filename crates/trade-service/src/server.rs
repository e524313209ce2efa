//! HTTP server for the trade lifecycle API.
//!
//! Routes dashboard reads and lifecycle actions onto the store-backed state
//! machine. Every route lives under the `/api` base path.

use crate::apis::{dashboard, entity, transitions};
use axum::{
	http::HeaderValue,
	routing::{get, post, put},
	Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};
use trade_config::ApiConfig;
use trade_core::LifecycleService;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The assembled lifecycle service.
	pub service: LifecycleService,
}

/// Builds the API router with its middleware stack.
pub fn router(api_config: &ApiConfig, service: LifecycleService) -> Router {
	let cors = match api_config.cors.as_ref() {
		Some(cors) if !cors.allowed_origins.is_empty() => {
			let origins = cors
				.allowed_origins
				.iter()
				.filter_map(|origin| match origin.parse::<HeaderValue>() {
					Ok(value) => Some(value),
					Err(_) => {
						tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
						None
					},
				})
				.collect::<Vec<_>>();
			CorsLayer::new()
				.allow_origin(AllowOrigin::list(origins))
				.allow_methods(tower_http::cors::Any)
				.allow_headers(tower_http::cors::Any)
		},
		_ => CorsLayer::permissive(),
	};

	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/dashboard/{kind}", get(dashboard::get_dashboard))
				.route("/{kind}", post(entity::create_entity))
				.route("/{kind}/{id}", get(entity::get_entity))
				.route("/{kind}/{id}/timeline", get(entity::get_timeline))
				.route("/{kind}/{id}/status", put(transitions::update_status))
				.route("/{kind}/{id}/cancel", put(transitions::cancel_order))
				.route("/{kind}/{id}/accept", put(transitions::accept_quote))
				.route("/{kind}/{id}/respond", put(transitions::respond_to_quote)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(api_config.timeout_seconds)))
				.layer(cors),
		)
		.with_state(AppState { service })
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	service: LifecycleService,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, service);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Trade lifecycle API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
