//! Storage-related types for the lifecycle system.

use crate::EntityKind;

/// Storage namespaces for the different entity collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Namespace for order records
	Orders,
	/// Namespace for quote records
	Quotes,
	/// Namespace for shipment records
	Shipments,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::Quotes => "quotes",
			StorageKey::Shipments => "shipments",
		}
	}

	/// The namespace holding records of the given kind.
	pub fn for_kind(kind: EntityKind) -> Self {
		match kind {
			EntityKind::Order => Self::Orders,
			EntityKind::Quote => Self::Quotes,
			EntityKind::Shipment => Self::Shipments,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_each_kind_has_its_own_namespace() {
		let namespaces: Vec<&str> = EntityKind::all()
			.map(|kind| StorageKey::for_kind(kind).as_str())
			.collect();
		assert_eq!(namespaces, vec!["orders", "quotes", "shipments"]);
	}
}
