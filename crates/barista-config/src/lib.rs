//! Configuration module for the barista ordering service.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files and
//! validates that all required values are set and within bounds.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files, which is handy for keeping
//! the menu apart from deployment settings:
//! - Use `include = ["menu.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)
//!
//! ## Environment variables
//!
//! `${VAR}` and `${VAR:-default}` placeholders are resolved before parsing.
//! Credentials such as the CRM webhook URL are expected to come in this way.

mod loader;

use barista_types::SecretString;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the ordering service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Storefront identity and currency.
	pub shop: ShopConfig,
	/// Session store tuning.
	#[serde(default)]
	pub session: SessionConfig,
	/// Menu catalog backends.
	pub catalog: CatalogConfig,
	/// CRM webhook settings. Without a webhook URL, lead submission is disabled.
	#[serde(default)]
	pub crm: CrmConfig,
	/// HTTP chat gateway.
	pub api: Option<ApiConfig>,
}

/// Storefront identity and currency.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopConfig {
	/// Shop name used in greetings.
	pub name: String,
	/// ISO currency code sent to the CRM.
	#[serde(default = "default_currency")]
	pub currency: String,
	/// Symbol appended to amounts in chat messages.
	#[serde(default = "default_currency_symbol")]
	pub currency_symbol: String,
	/// Text shown for the "about" menu entry.
	#[serde(default)]
	pub about: String,
	/// Contact shown to customers when an order could not be submitted.
	#[serde(default)]
	pub support_contact: Option<String>,
}

fn default_currency() -> String {
	"RUB".to_string()
}

fn default_currency_symbol() -> String {
	"₽".to_string()
}

/// Session store tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
	/// Idle time after which an abandoned session is dropped.
	#[serde(default = "default_session_ttl_minutes")]
	pub ttl_minutes: u64,
	/// Interval between expiry sweeps.
	#[serde(default = "default_cleanup_interval_seconds")]
	pub cleanup_interval_seconds: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			ttl_minutes: default_session_ttl_minutes(),
			cleanup_interval_seconds: default_cleanup_interval_seconds(),
		}
	}
}

fn default_session_ttl_minutes() -> u64 {
	120
}

fn default_cleanup_interval_seconds() -> u64 {
	300
}

/// Menu catalog backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of catalog implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// CRM webhook settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrmConfig {
	/// Base webhook URL including its access token. Blank means disabled.
	#[serde(default)]
	pub webhook_url: Option<SecretString>,
	/// Timeout applied to every CRM request.
	#[serde(default = "default_crm_timeout")]
	pub timeout_seconds: u64,
	/// Lead source tag.
	#[serde(default = "default_source_id")]
	pub source_id: String,
	/// Unit-of-measure code attached to product rows.
	#[serde(default = "default_measure_code")]
	pub measure_code: u32,
	/// Unit-of-measure name attached to product rows.
	#[serde(default = "default_measure_name")]
	pub measure_name: String,
}

impl Default for CrmConfig {
	fn default() -> Self {
		Self {
			webhook_url: None,
			timeout_seconds: default_crm_timeout(),
			source_id: default_source_id(),
			measure_code: default_measure_code(),
			measure_name: default_measure_name(),
		}
	}
}

fn default_crm_timeout() -> u64 {
	15
}

fn default_source_id() -> String {
	"TELEGRAM".to_string()
}

fn default_measure_code() -> u32 {
	796
}

fn default_measure_name() -> String {
	"pcs".to_string()
}

impl CrmConfig {
	/// Returns true if lead submission can be attempted.
	pub fn is_enabled(&self) -> bool {
		self.webhook_url.is_some()
	}
}

/// Configuration for the HTTP chat gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds. Must exceed the CRM timeout, since a
	/// confirmation waits for the CRM.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	60
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following include directives.
	pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;
		loader.load_config(file_name).await
	}

	/// Blank optional secrets are treated as absent.
	fn normalize(&mut self) {
		self.crm.webhook_url = self.crm.webhook_url.take().and_then(SecretString::non_blank);
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		// Shop
		if self.shop.name.trim().is_empty() {
			return Err(ConfigError::Validation("Shop name cannot be empty".into()));
		}
		if self.shop.currency.len() != 3
			|| !self.shop.currency.chars().all(|c| c.is_ascii_uppercase())
		{
			return Err(ConfigError::Validation(format!(
				"Shop currency '{}' must be a 3-letter uppercase ISO code",
				self.shop.currency
			)));
		}

		// Session
		if self.session.ttl_minutes == 0 {
			return Err(ConfigError::Validation(
				"Session ttl_minutes must be greater than 0".into(),
			));
		}
		if self.session.ttl_minutes > 10080 {
			return Err(ConfigError::Validation(
				"Session ttl_minutes cannot exceed 10080 (7 days)".into(),
			));
		}
		if self.session.cleanup_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"Session cleanup_interval_seconds must be greater than 0".into(),
			));
		}
		if self.session.cleanup_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"Session cleanup_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		// Catalog
		if self.catalog.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one catalog implementation must be configured".into(),
			));
		}
		if self.catalog.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Catalog primary implementation cannot be empty".into(),
			));
		}
		if !self
			.catalog
			.implementations
			.contains_key(&self.catalog.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary catalog '{}' not found in implementations",
				self.catalog.primary
			)));
		}

		// CRM
		if self.crm.timeout_seconds == 0 || self.crm.timeout_seconds > 60 {
			return Err(ConfigError::Validation(
				"CRM timeout_seconds must be between 1 and 60".into(),
			));
		}
		if let Some(url) = &self.crm.webhook_url {
			let looks_like_url = url.with_exposed(|u| {
				let u = u.trim();
				u.starts_with("https://") || u.starts_with("http://")
			});
			if !looks_like_url {
				// Never echo the URL itself, it carries the access token
				return Err(ConfigError::Validation(
					"CRM webhook_url must be an http(s) URL".into(),
				));
			}
		}
		if self.crm.source_id.trim().is_empty() {
			return Err(ConfigError::Validation(
				"CRM source_id cannot be empty".into(),
			));
		}

		// API
		if let Some(ref api) = self.api {
			if api.enabled && api.timeout_seconds <= self.crm.timeout_seconds {
				return Err(ConfigError::Validation(format!(
					"API timeout_seconds ({}) must be greater than CRM timeout_seconds ({})",
					api.timeout_seconds, self.crm.timeout_seconds
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved first and the result is normalized
/// and validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let mut config: Config = toml::from_str(&resolved)?;
		config.normalize();
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[shop]
name = "Bean There"

[catalog]
primary = "memory"
[catalog.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("BARISTA_TEST_HOST", "localhost");
		std::env::set_var("BARISTA_TEST_PORT", "5432");

		let input = "host = \"${BARISTA_TEST_HOST}:${BARISTA_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("BARISTA_TEST_HOST");
		std::env::remove_var("BARISTA_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${BARISTA_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");

		let empty_default = "value = \"${BARISTA_MISSING_VAR:-}\"";
		assert_eq!(resolve_env_vars(empty_default).unwrap(), "value = \"\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${BARISTA_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("BARISTA_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = MINIMAL.parse().unwrap();

		assert_eq!(config.shop.currency, "RUB");
		assert_eq!(config.shop.currency_symbol, "₽");
		assert_eq!(config.session.ttl_minutes, 120);
		assert_eq!(config.crm.timeout_seconds, 15);
		assert_eq!(config.crm.measure_code, 796);
		assert!(!config.crm.is_enabled());
		assert!(config.api.is_none());
	}

	#[test]
	fn test_blank_webhook_disables_crm() {
		let config_str = format!(
			"{}\n[crm]\nwebhook_url = \"${{BARISTA_UNSET_WEBHOOK:-}}\"\n",
			MINIMAL
		);
		let config: Config = config_str.parse().unwrap();
		assert!(!config.crm.is_enabled());
	}

	#[test]
	fn test_webhook_from_env() {
		std::env::set_var("BARISTA_TEST_WEBHOOK", "https://shop.example/rest/1/abc/");

		let config_str = format!(
			"{}\n[crm]\nwebhook_url = \"${{BARISTA_TEST_WEBHOOK}}\"\nsource_id = \"WEB\"\n",
			MINIMAL
		);
		let config: Config = config_str.parse().unwrap();
		assert!(config.crm.is_enabled());
		assert_eq!(config.crm.source_id, "WEB");
		assert!(!format!("{:?}", config.crm).contains("abc"));

		std::env::remove_var("BARISTA_TEST_WEBHOOK");
	}

	#[test]
	fn test_invalid_webhook_scheme_rejected_without_echo() {
		let config_str = format!("{}\n[crm]\nwebhook_url = \"ftp://secret-token\"\n", MINIMAL);
		let err = Config::from_str(&config_str).unwrap_err();
		let message = err.to_string();
		assert!(message.contains("http(s) URL"));
		assert!(!message.contains("secret-token"));
	}

	#[test]
	fn test_primary_catalog_must_exist() {
		let config_str = r#"
[shop]
name = "Bean There"

[catalog]
primary = "google_sheets"
[catalog.implementations.memory]
"#;
		let err = Config::from_str(config_str).unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary catalog 'google_sheets' not found"));
	}

	#[test]
	fn test_session_bounds() {
		let config_str = format!("{}\n[session]\nttl_minutes = 0\n", MINIMAL);
		assert!(Config::from_str(&config_str)
			.unwrap_err()
			.to_string()
			.contains("ttl_minutes"));

		let config_str = format!("{}\n[session]\ncleanup_interval_seconds = 90000\n", MINIMAL);
		assert!(Config::from_str(&config_str)
			.unwrap_err()
			.to_string()
			.contains("86400"));
	}

	#[test]
	fn test_currency_code_validation() {
		let config_str = r#"
[shop]
name = "Bean There"
currency = "rub"

[catalog]
primary = "memory"
[catalog.implementations.memory]
"#;
		assert!(Config::from_str(config_str)
			.unwrap_err()
			.to_string()
			.contains("ISO code"));
	}

	#[test]
	fn test_api_timeout_must_exceed_crm_timeout() {
		let config_str = format!(
			"{}\n[crm]\ntimeout_seconds = 30\n\n[api]\nenabled = true\ntimeout_seconds = 20\n",
			MINIMAL
		);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("must be greater than CRM timeout_seconds"));
	}
}
