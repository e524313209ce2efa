//! Static catalog of statuses per entity kind.
//!
//! The registry is the single lookup table for everything the lifecycle knows
//! about a status: whether it ends the lifecycle, where it sits in the partial
//! order, which dashboard bucket counts it and how dashboards render it.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use trade_types::{
	EntityKind, LifecycleError, OrderStatus, QuoteStatus, ShipmentStatus, Status,
};

/// Display metadata for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMeta {
	pub icon: &'static str,
	pub color_class: &'static str,
	pub label: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct StatusInfo {
	/// Position in the partial order; `None` for overlay statuses.
	rank: Option<u8>,
	terminal: bool,
	bucket: &'static str,
	meta: StatusMeta,
}

const fn info(
	rank: Option<u8>,
	terminal: bool,
	bucket: &'static str,
	icon: &'static str,
	color_class: &'static str,
	label: &'static str,
) -> StatusInfo {
	StatusInfo {
		rank,
		terminal,
		bucket,
		meta: StatusMeta {
			icon,
			color_class,
			label,
		},
	}
}

static TABLE: Lazy<HashMap<Status, StatusInfo>> = Lazy::new(|| {
	use OrderStatus as O;
	use QuoteStatus as Q;
	use ShipmentStatus as S;

	let rows: [(Status, StatusInfo); 22] = [
		// Orders
		(O::Pending.into(), info(Some(0), false, "pending", "clock", "bg-yellow-100 text-yellow-800", "Pending")),
		(O::Processing.into(), info(Some(1), false, "processing", "loader", "bg-blue-100 text-blue-800", "Processing")),
		(O::Confirmed.into(), info(Some(2), false, "processing", "check-circle", "bg-indigo-100 text-indigo-800", "Confirmed")),
		(O::Shipped.into(), info(Some(3), false, "shipped", "truck", "bg-purple-100 text-purple-800", "Shipped")),
		(O::Delivered.into(), info(Some(4), true, "delivered", "package-check", "bg-green-100 text-green-800", "Delivered")),
		(O::Cancelled.into(), info(Some(4), true, "cancelled", "x-circle", "bg-red-100 text-red-800", "Cancelled")),
		(O::Refunded.into(), info(Some(4), true, "refunded", "rotate-ccw", "bg-gray-100 text-gray-800", "Refunded")),
		// Quotes
		(Q::Pending.into(), info(Some(0), false, "pending", "clock", "bg-yellow-100 text-yellow-800", "Pending")),
		(Q::InReview.into(), info(Some(1), false, "in-review", "search", "bg-blue-100 text-blue-800", "In Review")),
		(Q::Quoted.into(), info(Some(2), false, "quoted", "file-text", "bg-indigo-100 text-indigo-800", "Quoted")),
		(Q::Negotiating.into(), info(Some(2), false, "negotiating", "message-square", "bg-orange-100 text-orange-800", "Negotiating")),
		(Q::Accepted.into(), info(Some(3), true, "accepted", "check-circle", "bg-green-100 text-green-800", "Accepted")),
		(Q::Rejected.into(), info(Some(3), true, "rejected", "x-circle", "bg-red-100 text-red-800", "Rejected")),
		(Q::Expired.into(), info(Some(3), true, "expired", "alert-circle", "bg-gray-100 text-gray-800", "Expired")),
		// Shipments
		(S::PendingPickup.into(), info(Some(0), false, "Pending Pickup", "package", "bg-yellow-100 text-yellow-800", "Pending Pickup")),
		(S::PickedUp.into(), info(Some(1), false, "Picked Up", "package-open", "bg-blue-100 text-blue-800", "Picked Up")),
		(S::InTransit.into(), info(Some(2), false, "In Transit", "truck", "bg-indigo-100 text-indigo-800", "In Transit")),
		(S::CustomsClearance.into(), info(Some(3), false, "Customs Clearance", "shield", "bg-purple-100 text-purple-800", "Customs Clearance")),
		(S::OutForDelivery.into(), info(Some(4), false, "Out for Delivery", "map-pin", "bg-cyan-100 text-cyan-800", "Out for Delivery")),
		(S::Delivered.into(), info(Some(5), true, "Delivered", "package-check", "bg-green-100 text-green-800", "Delivered")),
		(S::Delayed.into(), info(None, false, "Delayed", "alert-triangle", "bg-orange-100 text-orange-800", "Delayed")),
		(S::FailedDelivery.into(), info(Some(5), true, "Failed Delivery", "x-octagon", "bg-red-100 text-red-800", "Failed Delivery")),
	];
	rows.into_iter().collect()
});

fn lookup(status: Status) -> Option<&'static StatusInfo> {
	TABLE.get(&status)
}

/// Lookup functions over the status table.
pub struct StatusRegistry;

impl StatusRegistry {
	/// All statuses of `kind`, in declaration order.
	pub fn allowed_statuses(kind: EntityKind) -> Vec<Status> {
		kind.statuses()
	}

	/// Whether `status` belongs to `kind`.
	pub fn is_allowed(kind: EntityKind, status: Status) -> bool {
		status.kind() == kind && lookup(status).is_some()
	}

	/// Whether `status` ends the lifecycle of `kind`.
	///
	/// A status of another kind is never terminal for `kind`.
	pub fn is_terminal(kind: EntityKind, status: Status) -> bool {
		status.kind() == kind && lookup(status).is_some_and(|info| info.terminal)
	}

	/// Display metadata for a status of `kind`.
	pub fn metadata(kind: EntityKind, status: Status) -> Result<StatusMeta, LifecycleError> {
		match lookup(status) {
			Some(info) if status.kind() == kind => Ok(info.meta),
			_ => Err(LifecycleError::UnknownStatus {
				kind,
				status: status.to_string(),
			}),
		}
	}

	/// Position of a status in its kind's partial order.
	///
	/// Overlay statuses (shipment `Delayed`) have no rank.
	pub fn rank(status: Status) -> Option<u8> {
		lookup(status).and_then(|info| info.rank)
	}

	/// Whether the status is a flag on top of another position.
	pub fn is_overlay(status: Status) -> bool {
		lookup(status).is_some_and(|info| info.rank.is_none())
	}

	/// Dashboard bucket a status is counted under.
	pub fn bucket(status: Status) -> &'static str {
		lookup(status).map_or(status.as_str(), |info| info.bucket)
	}

	/// Every bucket of `kind`, deduplicated, in status declaration order.
	pub fn buckets(kind: EntityKind) -> Vec<&'static str> {
		let mut buckets: Vec<&'static str> = Vec::new();
		for status in kind.statuses() {
			let bucket = Self::bucket(status);
			if !buckets.contains(&bucket) {
				buckets.push(bucket);
			}
		}
		buckets
	}
}
