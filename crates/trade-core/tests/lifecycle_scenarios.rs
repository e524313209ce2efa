//! End-to-end lifecycle scenarios through the assembled service.

use std::collections::HashMap;
use tempfile::TempDir;
use trade_config::Config;
use trade_core::{
	timeline, LifecycleBuilder, LifecycleEngine, LifecycleFactories, LifecycleService,
	StateError, StatusRegistry, TransitionCommand,
};
use trade_types::{
	ActorRole, Entity, EntityKind, LifecycleError, LifecycleEvent, OrderStatus, QuoteResponse,
	QuoteStatus, ShipmentStatus, Status, TimelineEvent,
};

fn factories() -> LifecycleFactories<trade_storage::StorageFactory> {
	LifecycleFactories {
		storage_factories: trade_storage::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect::<HashMap<_, _>>(),
	}
}

fn file_config(dir: &TempDir, extra: &[(&str, toml::Value)]) -> Config {
	let mut settings = toml::map::Map::from_iter([(
		"storage_path".to_string(),
		toml::Value::String(dir.path().display().to_string()),
	)]);
	for (key, value) in extra {
		settings.insert(key.to_string(), value.clone());
	}
	let mut config = Config::for_testing();
	config.storage.primary = "file".to_string();
	config
		.storage
		.implementations
		.insert("file".to_string(), toml::Value::Table(settings));
	config
}

fn memory_service() -> LifecycleService {
	LifecycleBuilder::new(Config::for_testing())
		.build(factories())
		.unwrap()
}

#[test]
fn customer_cancels_pending_order() {
	let order = Entity::new(EntityKind::Order, "ord-1", serde_json::Value::Null);

	let cancelled = LifecycleEngine::transition(
		&order,
		OrderStatus::Cancelled.into(),
		ActorRole::Customer,
		"Customer requested cancellation",
		None,
	)
	.unwrap();
	assert_eq!(cancelled.status, Status::Order(OrderStatus::Cancelled));
	assert!(StatusRegistry::is_terminal(EntityKind::Order, cancelled.status));

	let further = LifecycleEngine::transition(
		&cancelled,
		OrderStatus::Shipped.into(),
		ActorRole::Admin,
		"",
		None,
	);
	assert!(matches!(further, Err(LifecycleError::InvalidTransition { .. })));
}

#[test]
fn pending_quote_cannot_be_accepted() {
	let quote = Entity::new(EntityKind::Quote, "q-1", serde_json::Value::Null);
	let result = LifecycleEngine::transition(
		&quote,
		QuoteStatus::Accepted.into(),
		ActorRole::Customer,
		"Looks good",
		None,
	);
	assert!(matches!(result, Err(LifecycleError::NotRespondable { .. })));
}

#[test]
fn shipment_progress_counts_reached_milestones() {
	let now = chrono::Utc::now();
	let mut shipment = Entity::new(EntityKind::Shipment, "shp-1", serde_json::Value::Null);
	shipment.status = ShipmentStatus::InTransit.into();
	shipment.timeline = vec![
		TimelineEvent::completed(ShipmentStatus::PickedUp.into(), "Collected", None, now),
		TimelineEvent::completed(ShipmentStatus::InTransit.into(), "On the way", None, now),
		TimelineEvent::expected(ShipmentStatus::OutForDelivery.into(), "With courier"),
	];
	shipment.milestones = vec![
		ShipmentStatus::PickedUp.into(),
		ShipmentStatus::InTransit.into(),
		ShipmentStatus::OutForDelivery.into(),
	];

	let progress = timeline::project(&shipment).progress();
	assert_eq!(progress.completed, 2);
	assert_eq!(progress.total, 3);
}

#[tokio::test]
async fn quote_negotiation_round_trip() {
	let service = memory_service();
	let state = service.state();
	state
		.create(EntityKind::Quote, Some("q-7".into()), serde_json::json!({"qty": 500}), &[])
		.await
		.unwrap();

	for status in [QuoteStatus::InReview, QuoteStatus::Quoted] {
		state
			.transition(
				EntityKind::Quote,
				"q-7",
				TransitionCommand::new(status.as_str(), ActorRole::Supplier),
			)
			.await
			.unwrap();
	}
	state
		.respond_to_quote("q-7", ActorRole::Customer, QuoteResponse::Negotiate, None, None)
		.await
		.unwrap();

	// Supplier may not accept on the customer's behalf
	let supplier_accept = state
		.respond_to_quote("q-7", ActorRole::Supplier, QuoteResponse::Accept, None, None)
		.await;
	assert!(matches!(
		supplier_accept,
		Err(StateError::Lifecycle(LifecycleError::NotRespondable { .. }))
	));

	state
		.transition(
			EntityKind::Quote,
			"q-7",
			TransitionCommand::new("quoted", ActorRole::Supplier).with_description("Revised price"),
		)
		.await
		.unwrap();
	let accepted = state
		.respond_to_quote(
			"q-7",
			ActorRole::Customer,
			QuoteResponse::Accept,
			Some("Deal".into()),
			Some(4),
		)
		.await
		.unwrap();
	assert_eq!(accepted.status, Status::Quote(QuoteStatus::Accepted));
	assert_eq!(accepted.version, 5);
	assert_eq!(accepted.payload, serde_json::json!({"qty": 500}));

	let summary = state.summarize(EntityKind::Quote).await.unwrap();
	assert_eq!(summary.closed, 1);
	assert_eq!(summary.by_status["accepted"], 1);
}

#[tokio::test]
async fn events_follow_the_order_lifecycle() {
	let service = memory_service();
	let mut events = service.event_bus().subscribe();
	let state = service.state();

	state
		.create(EntityKind::Order, Some("ord-5".into()), serde_json::Value::Null, &[])
		.await
		.unwrap();
	for status in ["Processing", "Confirmed", "Shipped", "Delivered"] {
		state
			.transition(
				EntityKind::Order,
				"ord-5",
				TransitionCommand::new(status, ActorRole::Supplier),
			)
			.await
			.unwrap();
	}

	let mut last_terminal = false;
	let mut count = 0;
	while let Ok(event) = events.try_recv() {
		count += 1;
		if let LifecycleEvent::Transitioned { terminal, .. } = event {
			last_terminal = terminal;
		}
	}
	assert_eq!(count, 5);
	assert!(last_terminal);

	let view = state.timeline(EntityKind::Order, "ord-5").await.unwrap();
	assert_eq!(view.progress.percent, 100);
	assert!(view.terminal);
}

#[tokio::test]
async fn file_storage_survives_restart() {
	let dir = TempDir::new().unwrap();
	let config = file_config(&dir, &[]);

	{
		let service = LifecycleBuilder::new(config.clone()).build(factories()).unwrap();
		let state = service.state();
		state
			.create(EntityKind::Shipment, Some("TRK/001".into()), serde_json::Value::Null, &[])
			.await
			.unwrap();
		state
			.transition(
				EntityKind::Shipment,
				"TRK/001",
				TransitionCommand::new("Picked Up", ActorRole::Supplier).with_location("Ningbo"),
			)
			.await
			.unwrap();
	}

	let service = LifecycleBuilder::new(config).build(factories()).unwrap();
	let shipment = service.state().get(EntityKind::Shipment, "TRK/001").await.unwrap();
	assert_eq!(shipment.status, Status::Shipment(ShipmentStatus::PickedUp));
	assert_eq!(shipment.timeline[1].location.as_deref(), Some("Ningbo"));
	assert_eq!(service.state().list(EntityKind::Shipment).await.unwrap().len(), 1);
}

#[tokio::test]
async fn open_quotes_in_file_storage_are_kept() {
	let dir = TempDir::new().unwrap();
	let expiring = file_config(&dir, &[("ttl_quotes", toml::Value::Integer(1))]);
	assert!(LifecycleBuilder::new(expiring).build(factories()).is_err());

	let config = file_config(&dir, &[]);
	{
		let service = LifecycleBuilder::new(config.clone()).build(factories()).unwrap();
		service
			.state()
			.create(EntityKind::Quote, Some("q-open".into()), serde_json::Value::Null, &[])
			.await
			.unwrap();
		service
			.state()
			.transition(
				EntityKind::Quote,
				"q-open",
				TransitionCommand::new(QuoteStatus::InReview.as_str(), ActorRole::Supplier),
			)
			.await
			.unwrap();
	}

	tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

	let service = LifecycleBuilder::new(config).build(factories()).unwrap();
	let quote = service.state().get(EntityKind::Quote, "q-open").await.unwrap();
	assert_eq!(quote.status, Status::Quote(QuoteStatus::InReview));
	assert_eq!(service.state().summarize(EntityKind::Quote).await.unwrap().open, 1);
}

#[tokio::test]
async fn declared_milestones_survive_restart_and_keep_progress_stable() {
	let dir = TempDir::new().unwrap();
	let config = file_config(&dir, &[]);
	let before = {
		let service = LifecycleBuilder::new(config.clone()).build(factories()).unwrap();
		let state = service.state();
		state
			.create(
				EntityKind::Shipment,
				Some("shp-9".into()),
				serde_json::Value::Null,
				&["Picked Up".to_string(), "In Transit".to_string(), "Delivered".to_string()],
			)
			.await
			.unwrap();
		state
			.transition(
				EntityKind::Shipment,
				"shp-9",
				TransitionCommand::new("Picked Up", ActorRole::Supplier),
			)
			.await
			.unwrap();
		state.timeline(EntityKind::Shipment, "shp-9").await.unwrap()
	};

	let service = LifecycleBuilder::new(config).build(factories()).unwrap();
	let stored = service.state().get(EntityKind::Shipment, "shp-9").await.unwrap();
	assert_eq!(stored.milestones.len(), 4);

	service
		.state()
		.transition(
			EntityKind::Shipment,
			"shp-9",
			TransitionCommand::new("Customs Clearance", ActorRole::Supplier),
		)
		.await
		.unwrap();
	let after = service.state().timeline(EntityKind::Shipment, "shp-9").await.unwrap();

	assert_eq!(after.steps, before.steps);
	assert_eq!(&after.events[..before.events.len()], &before.events[..]);
	assert_eq!((after.progress.completed, after.progress.total), (2, 4));
}
