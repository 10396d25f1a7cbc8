//! Main entry point for the barista ordering service.
//!
//! Loads the configuration, builds the order engine with the configured
//! catalog and CRM, starts the session cleanup task and serves the chat
//! gateway until interrupted.

use barista_config::Config;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod factory_registry;
mod server;

/// Command-line arguments for the barista service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
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

	tracing::info!("Started barista");

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.shop.name);

	let api_config = config.api.clone().filter(|api| api.enabled);
	let engine = Arc::new(factory_registry::build_engine_from_config(config)?);
	let cleanup = engine.start_session_cleanup();

	match api_config {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, Arc::clone(&engine)) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
				}
			}
		},
		None => {
			tracing::warn!("API server disabled, nothing will reach the engine");
			tokio::signal::ctrl_c().await?;
		},
	}

	cleanup.abort();
	tracing::info!("Stopped barista");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_defaults() {
		let args = Args::try_parse_from(["barista"]).unwrap();
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args =
			Args::try_parse_from(["barista", "--config", "shop.toml", "-l", "debug"]).unwrap();
		assert_eq!(args.config, PathBuf::from("shop.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[tokio::test]
	async fn test_build_engine_from_file() {
		let temp_dir = tempdir().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		std::fs::write(
			&config_path,
			r#"
[shop]
name = "Bean There"

[catalog]
primary = "memory"

[[catalog.implementations.memory.products]]
id = "1"
name = "Latte"
price = 250
category = "Coffee"

[api]
enabled = true
port = 3100
"#,
		)
		.unwrap();

		let config = Config::from_file(&config_path).await.unwrap();
		assert_eq!(config.api.as_ref().map(|api| api.port), Some(3100));
		assert!(factory_registry::build_engine_from_config(config).is_ok());
	}
}
