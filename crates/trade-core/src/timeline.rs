//! Display timeline projection.
//!
//! A projection walks an entity's timeline in append order and annotates each
//! event with display metadata and a running progress figure measured
//! against a [`TimelineTemplate`], the milestone path fixed before the walk
//! starts. Running figures depend only on earlier events and the template,
//! so appending to a timeline extends its projection without changing what
//! was already projected.

use crate::registry::{StatusMeta, StatusRegistry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use trade_types::{
	Entity, EntityKind, OrderStatus, QuoteStatus, ShipmentStatus, Status, TimelineEvent,
};

/// The ordered milestones progress is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineTemplate {
	kind: EntityKind,
	steps: Vec<Status>,
}

impl TimelineTemplate {
	/// The default milestone path of a kind.
	pub fn for_kind(kind: EntityKind) -> Self {
		let steps: Vec<Status> = match kind {
			EntityKind::Order => [
				OrderStatus::Pending,
				OrderStatus::Processing,
				OrderStatus::Confirmed,
				OrderStatus::Shipped,
				OrderStatus::Delivered,
			]
			.into_iter()
			.map(Status::from)
			.collect(),
			EntityKind::Quote => [
				QuoteStatus::Pending,
				QuoteStatus::InReview,
				QuoteStatus::Quoted,
				QuoteStatus::Accepted,
			]
			.into_iter()
			.map(Status::from)
			.collect(),
			EntityKind::Shipment => [
				ShipmentStatus::PendingPickup,
				ShipmentStatus::PickedUp,
				ShipmentStatus::InTransit,
				ShipmentStatus::CustomsClearance,
				ShipmentStatus::OutForDelivery,
				ShipmentStatus::Delivered,
			]
			.into_iter()
			.map(Status::from)
			.collect(),
		};
		Self { kind, steps }
	}

	/// A template over an explicit milestone path.
	pub fn new(kind: EntityKind, steps: Vec<Status>) -> Self {
		let mut unique = Vec::with_capacity(steps.len());
		for status in steps {
			if status.kind() == kind && !StatusRegistry::is_overlay(status) && !unique.contains(&status)
			{
				unique.push(status);
			}
		}
		Self {
			kind,
			steps: unique,
		}
	}

	/// The path stored on the entity at creation, or the kind default when
	/// none was declared. Never depends on the timeline, so later events
	/// cannot change it.
	pub fn for_entity(entity: &Entity) -> Self {
		if entity.milestones.is_empty() {
			Self::for_kind(entity.kind)
		} else {
			Self::new(entity.kind, entity.milestones.clone())
		}
	}

	pub fn kind(&self) -> EntityKind {
		self.kind
	}

	pub fn steps(&self) -> &[Status] {
		&self.steps
	}

	/// Number of defined steps.
	pub fn total(&self) -> usize {
		self.steps.len()
	}

	pub fn contains(&self, status: Status) -> bool {
		self.steps.contains(&status)
	}
}

/// Completed steps out of the template total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
	pub completed: usize,
	pub total: usize,
	/// Rounded to the nearest whole percent.
	pub percent: u8,
}

impl Progress {
	pub fn new(completed: usize, total: usize) -> Self {
		let percent = if total == 0 {
			0
		} else {
			((completed * 100 + total / 2) / total).min(100) as u8
		};
		Self {
			completed,
			total,
			percent,
		}
	}
}

/// One timeline event as dashboards render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEvent {
	/// Position in the source timeline.
	pub index: usize,
	pub status: Status,
	pub label: &'static str,
	pub icon: &'static str,
	pub color_class: &'static str,
	pub description: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
	pub timestamp: Option<DateTime<Utc>>,
	pub is_completed: bool,
	/// Overlay events are shown but never counted toward progress.
	pub is_overlay: bool,
	/// Progress reached once this event is taken into account.
	pub progress: Progress,
}

/// Projects entities against a fixed template.
#[derive(Debug, Clone)]
pub struct TimelineProjector {
	template: TimelineTemplate,
}

impl TimelineProjector {
	pub fn new(template: TimelineTemplate) -> Self {
		Self { template }
	}

	pub fn for_kind(kind: EntityKind) -> Self {
		Self::new(TimelineTemplate::for_kind(kind))
	}

	pub fn for_entity(entity: &Entity) -> Self {
		Self::new(TimelineTemplate::for_entity(entity))
	}

	pub fn template(&self) -> &TimelineTemplate {
		&self.template
	}

	pub fn project<'a>(&self, entity: &'a Entity) -> Projection<'a> {
		Projection {
			entity,
			template: self.template.clone(),
		}
	}
}

/// Projects an entity with the template picked by
/// [`TimelineTemplate::for_entity`].
pub fn project(entity: &Entity) -> Projection<'_> {
	TimelineProjector::for_entity(entity).project(entity)
}

/// A restartable view over an entity's projected timeline.
///
/// Nothing is computed until iterated, and every call to
/// [`Projection::iter`] starts over from the first event.
#[derive(Debug, Clone)]
pub struct Projection<'a> {
	entity: &'a Entity,
	template: TimelineTemplate,
}

impl<'a> Projection<'a> {
	pub fn iter(&self) -> ProjectionIter<'_> {
		ProjectionIter {
			kind: self.entity.kind,
			events: self.entity.timeline.iter().enumerate(),
			template: &self.template,
			reached: HashSet::new(),
		}
	}

	pub fn template(&self) -> &TimelineTemplate {
		&self.template
	}

	/// Overall progress across the whole timeline.
	pub fn progress(&self) -> Progress {
		self.iter()
			.last()
			.map(|event| event.progress)
			.unwrap_or_else(|| Progress::new(0, self.template.total()))
	}

	/// Index of the current event: the most recent completed one.
	pub fn current(&self) -> Option<usize> {
		self.entity.timeline.iter().rposition(|e| e.is_completed)
	}

	/// Collects the projection into an owned, serializable view.
	pub fn to_view(&self) -> TimelineView {
		let events: Vec<DisplayEvent> = self.iter().collect();
		let progress = events
			.last()
			.map(|event| event.progress)
			.unwrap_or_else(|| Progress::new(0, self.template.total()));
		TimelineView {
			entity_id: self.entity.id.clone(),
			kind: self.entity.kind,
			status: self.entity.status,
			terminal: StatusRegistry::is_terminal(self.entity.kind, self.entity.status),
			steps: self.template.steps.clone(),
			current: self.current(),
			progress,
			events,
		}
	}
}

impl<'p> IntoIterator for &'p Projection<'_> {
	type Item = DisplayEvent;
	type IntoIter = ProjectionIter<'p>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Iterator over [`DisplayEvent`]s; cloning it forks the walk.
#[derive(Debug, Clone)]
pub struct ProjectionIter<'a> {
	kind: EntityKind,
	events: std::iter::Enumerate<std::slice::Iter<'a, TimelineEvent>>,
	template: &'a TimelineTemplate,
	reached: HashSet<Status>,
}

impl Iterator for ProjectionIter<'_> {
	type Item = DisplayEvent;

	fn next(&mut self) -> Option<Self::Item> {
		let (index, event) = self.events.next()?;
		let is_overlay = StatusRegistry::is_overlay(event.status);
		if event.is_completed && !is_overlay && self.template.contains(event.status) {
			self.reached.insert(event.status);
		}
		let meta = StatusRegistry::metadata(self.kind, event.status).unwrap_or(StatusMeta {
			icon: "circle",
			color_class: "bg-gray-100 text-gray-800",
			label: event.status.as_str(),
		});

		Some(DisplayEvent {
			index,
			status: event.status,
			label: meta.label,
			icon: meta.icon,
			color_class: meta.color_class,
			description: event.description.clone(),
			location: event.location.clone(),
			timestamp: event.timestamp,
			is_completed: event.is_completed,
			is_overlay,
			progress: Progress::new(self.reached.len(), self.template.total()),
		})
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.events.size_hint()
	}
}

/// Owned projection returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
	pub entity_id: String,
	pub kind: EntityKind,
	pub status: Status,
	pub terminal: bool,
	pub steps: Vec<Status>,
	pub current: Option<usize>,
	pub progress: Progress,
	pub events: Vec<DisplayEvent>,
}
