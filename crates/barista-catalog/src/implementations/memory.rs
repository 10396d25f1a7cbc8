//! In-memory catalog backed by products listed in the configuration.
//!
//! Useful for development, demos and tests where no spreadsheet is at hand.

use crate::{CatalogError, CatalogFactory, CatalogInterface, CatalogRegistry};
use async_trait::async_trait;
use barista_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Product, Schema, SchemaError, MAX_PRICE,
};
use serde::Deserialize;

/// Catalog serving a fixed product list.
pub struct MemoryCatalog {
	products: Vec<Product>,
}

impl MemoryCatalog {
	pub fn new(products: Vec<Product>) -> Self {
		Self { products }
	}
}

#[derive(Debug, Deserialize)]
struct MemoryCatalogConfig {
	#[serde(default)]
	products: Vec<Product>,
}

/// Configuration schema for MemoryCatalog.
pub struct MemoryCatalogSchema;

impl ConfigSchema for MemoryCatalogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), SchemaError> {
		let product = Schema::new(
			vec![
				Field::new("id", FieldType::String),
				Field::new("name", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(name) if !name.trim().is_empty() => Ok(()),
						_ => Err("Product name cannot be empty".to_string()),
					}
				}),
				Field::new(
					"price",
					FieldType::Integer {
						min: Some(0),
						max: Some(MAX_PRICE as i64),
					},
				),
				Field::new("category", FieldType::String),
			],
			vec![
				Field::new("description", FieldType::String),
				Field::new("calories", FieldType::Number),
				Field::new("proteins", FieldType::Number),
				Field::new("fats", FieldType::Number),
				Field::new("carbohydrates", FieldType::Number),
				Field::new("image_url", FieldType::String),
			],
		);

		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"products",
				FieldType::Array(Box::new(FieldType::Table(product))),
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl CatalogInterface for MemoryCatalog {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryCatalogSchema)
	}

	async fn load_products(&self) -> Result<Vec<Product>, CatalogError> {
		Ok(self.products.clone())
	}
}

/// Registry for the memory catalog implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = CatalogFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn CatalogInterface>, CatalogError> {
			MemoryCatalogSchema
				.validate(config)
				.map_err(|e| CatalogError::Configuration(format!("Invalid memory catalog config: {}", e)))?;

			let parsed: MemoryCatalogConfig = config
				.clone()
				.try_into()
				.map_err(|e| CatalogError::Configuration(format!("Invalid memory catalog config: {}", e)))?;

			tracing::debug!(products = parsed.products.len(), "Memory catalog ready");
			Ok(Box::new(MemoryCatalog::new(parsed.products)))
		}
	}
}

impl CatalogRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	const MENU: &str = r#"
[[products]]
id = "1"
name = "Latte"
description = "Espresso with steamed milk"
price = 250
calories = 120
category = "Coffee"

[[products]]
id = "2"
name = "Croissant"
price = 150
category = "Bakery"
"#;

	#[tokio::test]
	async fn test_factory_builds_catalog() {
		let config: toml::Value = toml::from_str(MENU).unwrap();
		let catalog = (Registry::factory())(&config).unwrap();

		let categories = catalog.list_categories().await.unwrap();
		assert_eq!(categories.len(), 2);

		let latte = catalog.find_product("lat").await.unwrap();
		assert_eq!(latte.len(), 1);
		assert_eq!(latte[0].calories, Some(120.0));

		let bakery = catalog.list_products_by_category("bakery").await.unwrap();
		assert_eq!(bakery, vec!["Croissant".to_string()]);
	}

	#[test]
	fn test_factory_rejects_product_without_price() {
		let config: toml::Value = toml::from_str(
			r#"
[[products]]
id = "1"
name = "Latte"
category = "Coffee"
"#,
		)
		.unwrap();

		let err = match (Registry::factory())(&config) {
			Err(e) => e,
			Ok(_) => panic!("expected configuration error"),
		};
		assert!(err.to_string().contains("products[0].price"));
	}

	#[test]
	fn test_factory_rejects_oversized_price() {
		let config: toml::Value = toml::from_str(
			r#"
[[products]]
id = "1"
name = "Gold Latte"
price = 10000000000
category = "Coffee"
"#,
		)
		.unwrap();

		let err = match (Registry::factory())(&config) {
			Err(e) => e,
			Ok(_) => panic!("expected configuration error"),
		};
		assert!(err.to_string().contains("greater than maximum"));
	}

	#[tokio::test]
	async fn test_empty_config_is_an_empty_menu() {
		let config = toml::Value::Table(toml::Table::new());
		let catalog = (Registry::factory())(&config).unwrap();
		assert!(catalog.load_products().await.unwrap().is_empty());
	}
}
