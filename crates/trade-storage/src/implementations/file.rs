//! File-based storage backend.
//!
//! Each namespace is a directory under the storage path and each record a
//! file inside it, prefixed with a fixed-size versioned header. Records are
//! never expired or removed.
//! Writes go to a temporary file first and are renamed into place, so a
//! reader never observes a half-written record.
//!
//! The storage directory is guarded by an exclusive advisory lock so that two
//! service processes cannot interleave writes to the same records.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use trade_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

const RECORD_EXTENSION: &str = "rec";
const LOCK_FILE: &str = ".lock";

/// Fixed-size record header.
///
/// Binary layout (32 bytes total):
/// - [0-3]: Magic bytes "TRDS"
/// - [4-5]: Version (u16, little-endian)
/// - [6-31]: Reserved
///
/// Version 1 files stored an expiry in bytes 6-13. It is no longer read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordHeader {
	version: u16,
}

impl RecordHeader {
	const MAGIC: &'static [u8; 4] = b"TRDS";
	const VERSION: u16 = 2;
	const SIZE: usize = 32;

	fn new() -> Self {
		Self {
			version: Self::VERSION,
		}
	}

	fn encode(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes
	}

	fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE || &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Missing record header".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported record version: {}",
				version
			)));
		}
		Ok(Self { version })
	}
}

/// Escapes a key component into a filesystem-safe, reversible name.
fn encode_component(raw: &str) -> String {
	urlencoding::encode(raw).into_owned()
}

fn decode_component(encoded: &str) -> Option<String> {
	urlencoding::decode(encoded).ok().map(|decoded| decoded.into_owned())
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	/// Held for the lifetime of the backend; dropping it releases the lock.
	_lock: std::fs::File,
}

impl FileStorage {
	/// Opens (creating if needed) a storage directory and takes its lock.
	pub fn open(base_path: PathBuf) -> Result<Self, StorageError> {
		std::fs::create_dir_all(&base_path).map_err(|e| StorageError::Backend(e.to_string()))?;
		let lock = std::fs::OpenOptions::new()
			.create(true)
			.truncate(false)
			.write(true)
			.open(base_path.join(LOCK_FILE))
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		lock.try_lock_exclusive().map_err(|e| {
			StorageError::Backend(format!(
				"Storage directory {} is in use by another process: {}",
				base_path.display(),
				e
			))
		})?;

		Ok(Self {
			base_path,
			_lock: lock,
		})
	}

	/// Splits `namespace:id` and maps it to `<base>/<namespace>/<id>.rec`.
	fn record_path(&self, key: &str) -> Result<PathBuf, StorageError> {
		let (namespace, id) = key
			.split_once(':')
			.ok_or_else(|| StorageError::Backend(format!("Malformed key: {}", key)))?;
		Ok(self
			.base_path
			.join(encode_component(namespace))
			.join(format!("{}.{}", encode_component(id), RECORD_EXTENSION)))
	}

	/// Reads a record, returning `None` when it is absent.
	async fn read_record(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
		let data = match fs::read(path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};
		RecordHeader::decode(&data)?;
		Ok(Some(data[RecordHeader::SIZE..].to_vec()))
	}

	/// Lists record files of one namespace directory.
	async fn namespace_records(dir: &Path) -> Result<Vec<(String, PathBuf)>, StorageError> {
		let mut entries = match fs::read_dir(dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut records = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(RECORD_EXTENSION)) {
				continue;
			}
			let Some(id) = path
				.file_stem()
				.and_then(|s| s.to_str())
				.and_then(decode_component)
			else {
				tracing::debug!("Skipping unreadable record name {:?}", path);
				continue;
			};
			records.push((id, path));
		}
		Ok(records)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.record_path(key)?;
		Self::read_record(&path)
			.await?
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.record_path(key)?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let mut file_data = Vec::with_capacity(RecordHeader::SIZE + value.len());
		file_data.extend_from_slice(&RecordHeader::new().encode());
		file_data.extend_from_slice(&value);

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.record_path(key)?;
		Ok(Self::read_record(&path).await?.is_some())
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		// Only namespace-scoped prefixes are supported
		let Some((namespace, id_prefix)) = prefix.split_once(':') else {
			return Err(StorageError::Backend(format!(
				"File storage lists by 'namespace:' prefix, got '{}'",
				prefix
			)));
		};

		let dir = self.base_path.join(encode_component(namespace));
		let mut keys = Vec::new();
		for (id, path) in Self::namespace_records(&dir).await? {
			if !id.starts_with(id_prefix) {
				continue;
			}
			match Self::read_record(&path).await {
				Ok(Some(_)) => keys.push(format!("{}:{}", namespace, id)),
				Ok(None) => {},
				Err(e) => tracing::warn!("Skipping unreadable record {:?}: {}", path, e),
			}
		}
		keys.sort();
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let optional_fields = vec![Field::new("storage_path", FieldType::String)];
		Schema::new(vec![], optional_fields).validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for records (default: "./data/entities")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/entities");

	Ok(Box::new(FileStorage::open(PathBuf::from(storage_path))?))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
