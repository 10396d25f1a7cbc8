//! Menu catalog module for the barista ordering service.
//!
//! The catalog is a read-only lookup of categories and products. Backends only
//! have to produce the full product list; category and name matching is shared
//! and case-insensitive. The [`CatalogService`] sits in front of the backend
//! and turns backend failures into empty results, so a flaky spreadsheet never
//! breaks a conversation.

use async_trait::async_trait;
use barista_types::{ConfigSchema, ImplementationRegistry, Product};
use std::collections::BTreeSet;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod google_sheets;
	pub mod memory;
}

mod rows;

pub use rows::{parse_row, MENU_COLUMNS};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// Error that occurs while talking to a remote catalog.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when catalog data cannot be decoded.
	#[error("Parse error: {0}")]
	Parse(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for menu catalog backends.
///
/// Implementations provide [`CatalogInterface::load_products`]; the lookup
/// methods have shared default implementations on top of it.
#[async_trait]
pub trait CatalogInterface: Send + Sync {
	/// Returns the configuration schema for this catalog implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Reads the full product list in catalog order.
	async fn load_products(&self) -> Result<Vec<Product>, CatalogError>;

	/// Distinct non-blank category labels.
	async fn list_categories(&self) -> Result<BTreeSet<String>, CatalogError> {
		Ok(categories_of(&self.load_products().await?))
	}

	/// Names of the products whose category contains `keyword`.
	async fn list_products_by_category(&self, keyword: &str) -> Result<Vec<String>, CatalogError> {
		Ok(names_in_category(&self.load_products().await?, keyword))
	}

	/// Products whose name contains `name`.
	async fn find_product(&self, name: &str) -> Result<Vec<Product>, CatalogError> {
		Ok(products_named(self.load_products().await?, name))
	}
}

/// Collects distinct category labels, ignoring blank ones.
pub fn categories_of(products: &[Product]) -> BTreeSet<String> {
	products
		.iter()
		.map(|p| p.category.trim())
		.filter(|c| !c.is_empty())
		.map(str::to_string)
		.collect()
}

/// Names of products whose category contains `keyword`, case-insensitively.
pub fn names_in_category(products: &[Product], keyword: &str) -> Vec<String> {
	let keyword = keyword.to_lowercase();
	products
		.iter()
		.filter(|p| p.category.to_lowercase().contains(&keyword))
		.map(|p| p.name.clone())
		.collect()
}

/// Products whose name contains `name`, case-insensitively, in catalog order.
pub fn products_named(products: Vec<Product>, name: &str) -> Vec<Product> {
	let name = name.to_lowercase();
	products
		.into_iter()
		.filter(|p| p.name.to_lowercase().contains(&name))
		.collect()
}

/// Type alias for catalog factory functions.
pub type CatalogFactory = fn(&toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError>;

/// Registry trait for catalog implementations.
pub trait CatalogRegistry: ImplementationRegistry<Factory = CatalogFactory> {}

/// Get all registered catalog implementations.
///
/// Returns a vector of (name, factory) tuples for all available catalog implementations.
pub fn get_all_implementations() -> Vec<(&'static str, CatalogFactory)> {
	use implementations::{google_sheets, memory};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(google_sheets::Registry::NAME, google_sheets::Registry::factory()),
	]
}

/// Catalog front used by the order engine.
///
/// Every lookup goes to the backend; errors are logged and reported as an
/// empty result.
pub struct CatalogService {
	backend: Box<dyn CatalogInterface>,
}

impl CatalogService {
	pub fn new(backend: Box<dyn CatalogInterface>) -> Self {
		Self { backend }
	}

	pub async fn list_categories(&self) -> BTreeSet<String> {
		self.backend
			.list_categories()
			.await
			.unwrap_or_else(|e| degraded("list_categories", e))
	}

	pub async fn list_products_by_category(&self, keyword: &str) -> Vec<String> {
		self.backend
			.list_products_by_category(keyword)
			.await
			.unwrap_or_else(|e| degraded("list_products_by_category", e))
	}

	pub async fn find_product(&self, name: &str) -> Vec<Product> {
		self.backend
			.find_product(name)
			.await
			.unwrap_or_else(|e| degraded("find_product", e))
	}

	/// First product matching `name`, if any.
	pub async fn first_product(&self, name: &str) -> Option<Product> {
		self.find_product(name).await.into_iter().next()
	}
}

fn degraded<T: Default>(operation: &str, error: CatalogError) -> T {
	tracing::warn!(operation, error = %error, "Catalog lookup failed, returning empty result");
	T::default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use barista_types::{Schema, SchemaError};

	fn product(name: &str, category: &str) -> Product {
		Product {
			id: name.to_lowercase(),
			name: name.to_string(),
			description: String::new(),
			price: 100,
			calories: None,
			proteins: None,
			fats: None,
			carbohydrates: None,
			image_url: None,
			category: category.to_string(),
		}
	}

	struct NoSchema;

	impl ConfigSchema for NoSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), SchemaError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	struct FailingCatalog;

	#[async_trait]
	impl CatalogInterface for FailingCatalog {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn load_products(&self) -> Result<Vec<Product>, CatalogError> {
			Err(CatalogError::Network("sheet unreachable".into()))
		}
	}

	#[test]
	fn test_category_matching_is_case_insensitive_substring() {
		let products = vec![
			product("Latte", "Hot coffee"),
			product("Iced Latte", "Cold coffee"),
			product("Croissant", "Bakery"),
		];

		assert_eq!(
			names_in_category(&products, "COFFEE"),
			vec!["Latte".to_string(), "Iced Latte".to_string()]
		);
		assert!(names_in_category(&products, "Tea").is_empty());
	}

	#[test]
	fn test_categories_are_distinct_and_skip_blank() {
		let products = vec![
			product("Latte", "Coffee"),
			product("Mocha", "Coffee"),
			product("Water", " "),
		];
		let categories = categories_of(&products);
		assert_eq!(categories.len(), 1);
		assert!(categories.contains("Coffee"));
	}

	#[test]
	fn test_find_product_keeps_catalog_order() {
		let products = vec![product("Iced Latte", "Cold"), product("Latte", "Hot")];
		let found = products_named(products, "latte");
		assert_eq!(found.len(), 2);
		assert_eq!(found[0].name, "Iced Latte");
	}

	#[tokio::test]
	async fn test_service_degrades_errors_to_empty() {
		let service = CatalogService::new(Box::new(FailingCatalog));

		assert!(service.list_categories().await.is_empty());
		assert!(service.list_products_by_category("Coffee").await.is_empty());
		assert!(service.find_product("Latte").await.is_empty());
		assert!(service.first_product("Latte").await.is_none());
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<&str> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["memory", "google_sheets"]);
	}
}
