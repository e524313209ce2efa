//! Status enumerations for orders, quotes and shipments.
//!
//! Each entity kind owns a closed set of statuses. The string forms are
//! case-sensitive and must match what the dashboards and stored records use,
//! which is why every variant carries its literal label. Inbound strings are
//! normalized into the `Status` tagged union at the boundary via
//! [`Status::parse`].

use crate::LifecycleError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Declares a status enum together with its wire labels.
macro_rules! status_enum {
	(
		$(#[$meta:meta])*
		$name:ident {
			$( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		pub enum $name {
			$( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
		}

		impl $name {
			/// Every status of this kind, in declaration order.
			pub const ALL: &'static [$name] = &[$($name::$variant),+];

			/// Returns the exact wire label.
			pub fn as_str(&self) -> &'static str {
				match self {
					$($name::$variant => $label,)+
				}
			}

			/// Looks up a status by its exact wire label.
			pub fn from_label(label: &str) -> Option<Self> {
				match label {
					$($label => Some($name::$variant),)+
					_ => None,
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}
	};
}

status_enum! {
	/// Lifecycle status of a purchase order.
	OrderStatus {
		Pending => "Pending",
		Processing => "Processing",
		Confirmed => "Confirmed",
		Shipped => "Shipped",
		Delivered => "Delivered",
		Cancelled => "Cancelled",
		Refunded => "Refunded",
	}
}

status_enum! {
	/// Lifecycle status of a request for quotation.
	QuoteStatus {
		Pending => "pending",
		InReview => "in-review",
		Quoted => "quoted",
		Negotiating => "negotiating",
		Accepted => "accepted",
		Rejected => "rejected",
		Expired => "expired",
	}
}

status_enum! {
	/// Lifecycle status of a shipment.
	ShipmentStatus {
		PendingPickup => "Pending Pickup",
		PickedUp => "Picked Up",
		InTransit => "In Transit",
		CustomsClearance => "Customs Clearance",
		OutForDelivery => "Out for Delivery",
		Delivered => "Delivered",
		/// Overlay flag on top of the last known position, never an end-state.
		Delayed => "Delayed",
		FailedDelivery => "Failed Delivery",
	}
}

/// The kind of record tracked through a lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
	Order,
	Quote,
	Shipment,
}

impl EntityKind {
	/// Returns the singular lowercase name.
	pub fn as_str(&self) -> &'static str {
		match self {
			EntityKind::Order => "order",
			EntityKind::Quote => "quote",
			EntityKind::Shipment => "shipment",
		}
	}

	/// Returns an iterator over all kinds.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Order, Self::Quote, Self::Shipment].into_iter()
	}

	/// The status every new entity of this kind starts in.
	pub fn initial_status(&self) -> Status {
		match self {
			EntityKind::Order => Status::Order(OrderStatus::Pending),
			EntityKind::Quote => Status::Quote(QuoteStatus::Pending),
			EntityKind::Shipment => Status::Shipment(ShipmentStatus::PendingPickup),
		}
	}

	/// All statuses allowed for this kind, in declaration order.
	pub fn statuses(&self) -> Vec<Status> {
		match self {
			EntityKind::Order => OrderStatus::ALL.iter().copied().map(Status::Order).collect(),
			EntityKind::Quote => QuoteStatus::ALL.iter().copied().map(Status::Quote).collect(),
			EntityKind::Shipment => ShipmentStatus::ALL
				.iter()
				.copied()
				.map(Status::Shipment)
				.collect(),
		}
	}
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Accepts both singular and plural forms so REST path segments parse directly.
impl FromStr for EntityKind {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"order" | "orders" => Ok(Self::Order),
			"quote" | "quotes" => Ok(Self::Quote),
			"shipment" | "shipments" => Ok(Self::Shipment),
			_ => Err(()),
		}
	}
}

/// A status value tagged with the kind it belongs to.
///
/// Labels overlap between kinds ("Delivered" exists for orders and shipments,
/// "Pending" and "pending" differ only by case), so a bare string is never
/// enough to identify a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
	Order(OrderStatus),
	Quote(QuoteStatus),
	Shipment(ShipmentStatus),
}

impl Status {
	/// The kind this status belongs to.
	pub fn kind(&self) -> EntityKind {
		match self {
			Status::Order(_) => EntityKind::Order,
			Status::Quote(_) => EntityKind::Quote,
			Status::Shipment(_) => EntityKind::Shipment,
		}
	}

	/// Returns the exact wire label.
	pub fn as_str(&self) -> &'static str {
		match self {
			Status::Order(s) => s.as_str(),
			Status::Quote(s) => s.as_str(),
			Status::Shipment(s) => s.as_str(),
		}
	}

	/// Parses a wire label for the given kind.
	///
	/// Matching is case-sensitive; anything outside the kind's set is
	/// reported as [`LifecycleError::UnknownStatus`].
	pub fn parse(kind: EntityKind, label: &str) -> Result<Self, LifecycleError> {
		let status = match kind {
			EntityKind::Order => OrderStatus::from_label(label).map(Status::Order),
			EntityKind::Quote => QuoteStatus::from_label(label).map(Status::Quote),
			EntityKind::Shipment => ShipmentStatus::from_label(label).map(Status::Shipment),
		};
		status.ok_or_else(|| LifecycleError::UnknownStatus {
			kind,
			status: label.to_string(),
		})
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for Status {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl From<OrderStatus> for Status {
	fn from(status: OrderStatus) -> Self {
		Status::Order(status)
	}
}

impl From<QuoteStatus> for Status {
	fn from(status: QuoteStatus) -> Self {
		Status::Quote(status)
	}
}

impl From<ShipmentStatus> for Status {
	fn from(status: ShipmentStatus) -> Self {
		Status::Shipment(status)
	}
}

/// The role of the party requesting a lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
	/// The buyer who owns the order or quote request.
	Customer,
	/// The selling party fulfilling orders and issuing quotes.
	Supplier,
	/// Marketplace operator.
	Admin,
}

impl ActorRole {
	/// Privileged roles may drive ordinary forward transitions.
	pub fn is_privileged(&self) -> bool {
		matches!(self, Self::Supplier | Self::Admin)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ActorRole::Customer => "customer",
			ActorRole::Supplier => "supplier",
			ActorRole::Admin => "admin",
		}
	}
}

impl fmt::Display for ActorRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ActorRole {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"customer" | "buyer" => Ok(Self::Customer),
			"supplier" | "seller" => Ok(Self::Supplier),
			"admin" => Ok(Self::Admin),
			_ => Err(()),
		}
	}
}
