//! Main entry point for the trade lifecycle service.
//!
//! This binary loads the configuration, assembles the lifecycle core on top
//! of the configured storage backend and serves the dashboard and transition
//! endpoints over HTTP.

use clap::Parser;
use std::path::PathBuf;
use trade_config::Config;
use trade_core::{LifecycleBuilder, LifecycleFactories, LifecycleService};

mod apis;
mod server;

use trade_storage::implementations::file::create_storage as create_file_storage;
use trade_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the lifecycle service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "TRADE_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started trade lifecycle service");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let service = build_service(config.clone())?;

	match config.api.filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, service) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
				}
			}
		},
		None => {
			tracing::info!("API disabled, waiting for shutdown signal");
			tokio::signal::ctrl_c().await?;
		},
	}

	tracing::info!("Stopped trade lifecycle service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the lifecycle service with the available storage backends.
fn build_service(config: Config) -> Result<LifecycleService, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		trade_storage::StorageInterface,
		trade_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	Ok(LifecycleBuilder::new(config).build(LifecycleFactories { storage_factories })?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_parse() {
		let args = Args::parse_from(["trade-lifecycle", "-c", "custom.toml", "-l", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_macro() {
		use trade_storage::{StorageError, StorageInterface};

		let factories = create_factory_map!(
			StorageInterface,
			StorageError,
			"memory" => create_memory_storage,
			"file" => create_file_storage,
		);

		assert_eq!(factories.len(), 2);
		assert!(factories.contains_key("memory"));
		assert!(factories.contains_key("file"));
	}

	#[test]
	fn test_build_service_with_testing_config() {
		let service = build_service(Config::for_testing()).unwrap();
		assert_eq!(service.config().service.id, "trade-lifecycle-test");
	}

	#[tokio::test]
	async fn test_build_service_from_file_config() {
		let temp_dir = tempdir().unwrap();
		let data_dir = temp_dir.path().join("data");
		let config_path = temp_dir.path().join("config.toml");
		let config_content = format!(
			r#"
[service]
id = "file-backed"

[storage]
primary = "file"

[storage.implementations.file]
storage_path = "{}"

[api]
enabled = false
"#,
			data_dir.display()
		);
		std::fs::write(&config_path, config_content).unwrap();

		let config = Config::from_file(config_path.to_str().unwrap()).await.unwrap();
		let service = build_service(config).unwrap();
		assert_eq!(service.config().service.id, "file-backed");
		assert!(data_dir.exists());
	}
}
