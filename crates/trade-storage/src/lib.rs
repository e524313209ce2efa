//! Storage module for the trade lifecycle system.
//!
//! This module provides the abstraction the lifecycle core persists entity
//! snapshots through, with in-memory and file-based backends. Backends deal
//! in raw bytes under string keys; [`StorageService`] adds typed JSON access
//! on top.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use trade_types::{ConfigSchema, ImplementationRegistry};

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Keys have the form `namespace:id`. Implementations must be safe to share
/// between tasks.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, creating or overwriting the key.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists all live keys starting with `prefix`, in ascending order.
	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns (name, factory) pairs used to build the backend named in
/// `[storage] primary`.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// Values are serialized to JSON and stored under `namespace:id`.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value, creating or overwriting it.
	///
	/// Records never expire; entities are closed by status, not removed.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves every value in a namespace, ordered by id.
	///
	/// Keys that disappear between listing and reading are skipped.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let prefix = format!("{}:", namespace);
		let keys = self.backend.list_keys(&prefix).await?;
		let mut values = Vec::with_capacity(keys.len());
		for key in keys {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => values.push(
					serde_json::from_slice(&bytes)
						.map_err(|e| StorageError::Serialization(e.to_string()))?,
				),
				Err(StorageError::NotFound) => {
					tracing::debug!(key = %key, "Key vanished while listing namespace");
				},
				Err(e) => return Err(e),
			}
		}
		Ok(values)
	}

	/// Updates an existing value in storage.
	///
	/// Unlike [`StorageService::store`], this fails with
	/// [`StorageError::NotFound`] when the key does not exist yet.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = Self::key(namespace, id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}

		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Record {
		name: String,
		count: u32,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn test_typed_store_and_retrieve() {
		let storage = service();
		let record = Record {
			name: "steel coils".into(),
			count: 12,
		};
		storage.store("orders", "ord-1", &record).await.unwrap();

		let loaded: Record = storage.retrieve("orders", "ord-1").await.unwrap();
		assert_eq!(loaded, record);
		assert!(storage.exists("orders", "ord-1").await.unwrap());
		assert!(!storage.exists("quotes", "ord-1").await.unwrap());
	}

	#[tokio::test]
	async fn test_update_requires_existing_key() {
		let storage = service();
		let record = Record {
			name: "pallets".into(),
			count: 1,
		};
		let result = storage.update("orders", "missing", &record).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_retrieve_all_is_scoped_to_namespace() {
		let storage = service();
		for (ns, id, count) in [("orders", "b", 2), ("orders", "a", 1), ("quotes", "c", 3)] {
			let record = Record {
				name: id.to_string(),
				count,
			};
			storage.store(ns, id, &record).await.unwrap();
		}

		let orders: Vec<Record> = storage.retrieve_all("orders").await.unwrap();
		assert_eq!(orders.len(), 2);
		assert_eq!(orders[0].name, "a");
		assert_eq!(orders[1].name, "b");
	}
}
