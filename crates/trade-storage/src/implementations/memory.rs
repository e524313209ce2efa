//! In-memory storage backend.
//!
//! Useful for tests and single-process deployments where persistence across
//! restarts is not required.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use trade_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

/// In-memory storage implementation.
///
/// Keys are kept in a `BTreeMap` so prefix listings come back ordered.
pub struct MemoryStorage {
	store: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(BTreeMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), value);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.range(prefix.to_string()..)
			.take_while(|(key, _)| key.starts_with(prefix))
			.map(|(key, _)| key.clone())
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// No settings are accepted
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		let key = "orders:ord-1";
		let value = b"{\"status\":\"Pending\"}".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());
		assert!(!storage.exists("orders:ord-2").await.unwrap());
		assert!(matches!(
			storage.get_bytes("orders:ord-2").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_overwrite() {
		let storage = MemoryStorage::new();

		let key = "quotes:q-1";
		storage.set_bytes(key, b"v1".to_vec()).await.unwrap();
		storage.set_bytes(key, b"v2".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"v2".to_vec());
	}

	#[tokio::test]
	async fn test_list_keys_by_prefix() {
		let storage = MemoryStorage::new();
		for key in ["orders:2", "orders:1", "ordersx:3", "quotes:1"] {
			storage.set_bytes(key, vec![1]).await.unwrap();
		}

		let keys = storage.list_keys("orders:").await.unwrap();
		assert_eq!(keys, vec!["orders:1".to_string(), "orders:2".to_string()]);
	}

	#[test]
	fn test_factory_rejects_unknown_settings() {
		let config: toml::Value = toml::from_str("storage_path = \"./data\"").unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
		let empty: toml::Value = toml::from_str("").unwrap();
		assert!(create_storage(&empty).is_ok());
	}
}
