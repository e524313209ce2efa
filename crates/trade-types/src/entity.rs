//! Entity records tracked through a lifecycle.
//!
//! An [`Entity`] is an order, quote or shipment. The lifecycle engine only
//! reads and writes the status, timeline, timestamps and version; the
//! kind-specific payload (line items, quote terms, package and route details)
//! is carried through untouched.
//!
//! Records arrive as JSON snapshots whose status strings are only meaningful
//! together with the record kind, so deserialization goes through
//! [`EntityRecord`] and is checked against the entity invariants.

use crate::{EntityKind, LifecycleError, ShipmentStatus, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in an entity's append-only history.
///
/// Events without a timestamp describe milestones that are expected but not
/// yet reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
	/// The status reached (or expected).
	pub status: Status,
	/// Short human-readable text.
	pub description: String,
	/// Free-text location, used by shipments.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
	/// When the status was reached; `None` for expected milestones.
	pub timestamp: Option<DateTime<Utc>>,
	/// Whether the milestone has been reached.
	pub is_completed: bool,
}

impl TimelineEvent {
	/// A milestone reached at `at`.
	pub fn completed(
		status: Status,
		description: impl Into<String>,
		location: Option<String>,
		at: DateTime<Utc>,
	) -> Self {
		Self {
			status,
			description: description.into(),
			location,
			timestamp: Some(at),
			is_completed: true,
		}
	}

	/// A milestone that is expected but not yet reached.
	pub fn expected(status: Status, description: impl Into<String>) -> Self {
		Self {
			status,
			description: description.into(),
			location: None,
			timestamp: None,
			is_completed: false,
		}
	}
}

/// An order, quote or shipment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EntityRecord")]
pub struct Entity {
	/// Opaque unique identifier.
	pub id: String,
	/// Which lifecycle this record follows.
	pub kind: EntityKind,
	/// Current status, always a member of `kind`'s status set.
	pub status: Status,
	/// Append-only history.
	pub timeline: Vec<TimelineEvent>,
	/// Milestone path progress is measured against, fixed at creation.
	/// Empty means the kind's default path.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub milestones: Vec<Status>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	/// Incremented on every applied transition.
	pub version: u64,
	/// Kind-specific data, opaque to the lifecycle.
	#[serde(default)]
	pub payload: serde_json::Value,
}

impl Entity {
	/// Creates a record in its kind's initial status with a single creation event.
	pub fn new(kind: EntityKind, id: impl Into<String>, payload: serde_json::Value) -> Self {
		let now = Utc::now();
		let status = kind.initial_status();
		Self {
			id: id.into(),
			kind,
			status,
			timeline: vec![TimelineEvent::completed(
				status,
				format!("{} created", capitalize(kind.as_str())),
				None,
				now,
			)],
			milestones: Vec::new(),
			created_at: now,
			updated_at: now,
			version: 0,
			payload,
		}
	}

	/// Appends an expected milestone to the timeline and declares it on the
	/// milestone path.
	///
	/// The first declared milestone replaces the kind default with a path that
	/// starts at the current status. Only meant for building a new record;
	/// transitions never touch the path.
	pub fn with_expected(mut self, status: Status, description: impl Into<String>) -> Self {
		if self.milestones.is_empty() {
			self.milestones.push(self.status);
		}
		if !is_overlay(status) && !self.milestones.contains(&status) {
			self.milestones.push(status);
		}
		self.timeline.push(TimelineEvent::expected(status, description));
		self
	}

	/// The most recent completed event, if any.
	pub fn current_event(&self) -> Option<&TimelineEvent> {
		self.timeline.iter().rev().find(|e| e.is_completed)
	}

	/// Checks the record invariants.
	///
	/// The status and every timeline status must belong to the record kind,
	/// and completed events must carry a timestamp.
	pub fn validate(&self) -> Result<(), LifecycleError> {
		if self.status.kind() != self.kind {
			return Err(LifecycleError::UnknownStatus {
				kind: self.kind,
				status: self.status.to_string(),
			});
		}
		for (index, event) in self.timeline.iter().enumerate() {
			if event.status.kind() != self.kind {
				return Err(LifecycleError::UnknownStatus {
					kind: self.kind,
					status: event.status.to_string(),
				});
			}
			if event.is_completed && event.timestamp.is_none() {
				return Err(LifecycleError::MalformedRecord(format!(
					"timeline event {} of {} is completed but has no timestamp",
					index, self.id
				)));
			}
		}
		for milestone in &self.milestones {
			if milestone.kind() != self.kind || is_overlay(*milestone) {
				return Err(LifecycleError::MalformedRecord(format!(
					"{} is not a milestone of {}",
					milestone, self.kind
				)));
			}
		}
		Ok(())
	}
}

fn is_overlay(status: Status) -> bool {
	matches!(status, Status::Shipment(ShipmentStatus::Delayed))
}

fn capitalize(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Raw timeline event as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventRecord {
	pub status: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub location: Option<String>,
	#[serde(default)]
	pub timestamp: Option<DateTime<Utc>>,
	#[serde(default)]
	pub is_completed: bool,
}

/// Raw entity snapshot as it appears on the wire.
///
/// Dashboards have historically named the status field differently per kind
/// (`orderStatus` on orders), so both spellings are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
	pub id: String,
	pub kind: EntityKind,
	#[serde(alias = "orderStatus", alias = "shipmentStatus")]
	pub status: String,
	#[serde(default)]
	pub timeline: Vec<TimelineEventRecord>,
	#[serde(default)]
	pub milestones: Vec<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default)]
	pub version: u64,
	#[serde(default)]
	pub payload: serde_json::Value,
}

impl TryFrom<EntityRecord> for Entity {
	type Error = LifecycleError;

	fn try_from(record: EntityRecord) -> Result<Self, Self::Error> {
		let kind = record.kind;
		let status = Status::parse(kind, &record.status)?;
		let timeline = record
			.timeline
			.into_iter()
			.map(|event| {
				Ok(TimelineEvent {
					status: Status::parse(kind, &event.status)?,
					description: event.description,
					location: event.location,
					timestamp: event.timestamp,
					is_completed: event.is_completed,
				})
			})
			.collect::<Result<Vec<_>, LifecycleError>>()?;
		let milestones = record
			.milestones
			.iter()
			.map(|label| Status::parse(kind, label))
			.collect::<Result<Vec<_>, LifecycleError>>()?;

		let entity = Entity {
			id: record.id,
			kind,
			status,
			timeline,
			milestones,
			created_at: record.created_at,
			updated_at: record.updated_at,
			version: record.version,
			payload: record.payload,
		};
		entity.validate()?;
		Ok(entity)
	}
}
