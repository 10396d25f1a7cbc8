//! Google Sheets catalog implementation.
//!
//! Reads the menu worksheet through the Sheets v4 `values` endpoint with an
//! API key. The first row is a header. Every lookup re-reads the sheet, so
//! menu edits show up without a restart.

use crate::{parse_row, CatalogError, CatalogFactory, CatalogInterface, CatalogRegistry};
use async_trait::async_trait;
use barista_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Product, Schema, SchemaError,
	SecretString,
};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Configuration for the Google Sheets catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSheetsConfig {
	/// Spreadsheet identifier from the sheet URL.
	pub spreadsheet_id: String,
	/// A1 range covering the menu columns, e.g. `Menu!A:J`.
	#[serde(default = "default_range")]
	pub range: String,
	/// API key with read access to the sheet.
	pub api_key: SecretString,
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Overrides the Sheets API endpoint.
	#[serde(default = "default_base_url")]
	pub base_url: String,
}

fn default_range() -> String {
	"Menu!A:J".to_string()
}

fn default_timeout_seconds() -> u64 {
	10
}

fn default_base_url() -> String {
	DEFAULT_BASE_URL.to_string()
}

/// Body of a `values.get` response. `values` is absent for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
	#[serde(default)]
	values: Vec<Vec<String>>,
}

/// Catalog reading products from a spreadsheet.
pub struct GoogleSheetsCatalog {
	config: GoogleSheetsConfig,
	client: reqwest::Client,
}

impl GoogleSheetsCatalog {
	pub fn new(config: GoogleSheetsConfig) -> Result<Self, CatalogError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_seconds))
			.build()
			.map_err(|e| CatalogError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self { config, client })
	}

	/// Builds the `values` URL. The API key is attached separately.
	fn values_url(&self) -> Result<reqwest::Url, CatalogError> {
		let mut url = reqwest::Url::parse(&self.config.base_url)
			.map_err(|e| CatalogError::Configuration(format!("Invalid base_url: {}", e)))?;
		url.path_segments_mut()
			.map_err(|_| CatalogError::Configuration("base_url cannot be a base".into()))?
			.pop_if_empty()
			.extend([
				self.config.spreadsheet_id.as_str(),
				"values",
				self.config.range.as_str(),
			]);
		Ok(url)
	}
}

/// Skips the header row and keeps every decodable product row.
fn products_from_values(values: Vec<Vec<String>>) -> Vec<Product> {
	values
		.iter()
		.skip(1)
		.filter_map(|row| parse_row(row))
		.collect()
}

/// Configuration schema for GoogleSheetsCatalog.
pub struct GoogleSheetsCatalogSchema;

impl ConfigSchema for GoogleSheetsCatalogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), SchemaError> {
		let non_empty = |v: &toml::Value| match v.as_str() {
			Some(s) if !s.trim().is_empty() => Ok(()),
			_ => Err("Value cannot be empty".to_string()),
		};

		let schema = Schema::new(
			vec![
				Field::new("spreadsheet_id", FieldType::String).with_validator(non_empty),
				Field::new("api_key", FieldType::String).with_validator(non_empty),
			],
			vec![
				Field::new("range", FieldType::String).with_validator(|v| match v.as_str() {
					Some(r) if r.contains('!') => Ok(()),
					_ => Err("range must name a worksheet, e.g. Menu!A:J".to_string()),
				}),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(60),
					},
				),
				Field::new("base_url", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(u) if u.starts_with("https://") || u.starts_with("http://") => Ok(()),
						_ => Err("base_url must be an http(s) URL".to_string()),
					}
				}),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl CatalogInterface for GoogleSheetsCatalog {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(GoogleSheetsCatalogSchema)
	}

	async fn load_products(&self) -> Result<Vec<Product>, CatalogError> {
		let url = self.values_url()?;
		let api_key = self.config.api_key.expose_secret();

		let response = self
			.client
			.get(url)
			.query(&[("key", api_key)])
			.send()
			.await
			.map_err(|e| CatalogError::Network(e.without_url().to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(CatalogError::Network(format!(
				"Sheets API answered with status {}",
				status
			)));
		}

		let body: ValueRange = response
			.json()
			.await
			.map_err(|e| CatalogError::Parse(e.without_url().to_string()))?;

		let products = products_from_values(body.values);
		tracing::debug!(products = products.len(), "Loaded menu sheet");
		Ok(products)
	}
}

/// Registry for the Google Sheets catalog implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "google_sheets";
	type Factory = CatalogFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn CatalogInterface>, CatalogError> {
			GoogleSheetsCatalogSchema.validate(config).map_err(|e| {
				CatalogError::Configuration(format!("Invalid google_sheets config: {}", e))
			})?;

			let sheets_config: GoogleSheetsConfig = config.clone().try_into().map_err(|e| {
				CatalogError::Configuration(format!("Invalid google_sheets config: {}", e))
			})?;

			Ok(Box::new(GoogleSheetsCatalog::new(sheets_config)?))
		}
	}
}

impl CatalogRegistry for Registry {}
