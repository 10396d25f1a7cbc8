//! Factory registry for pluggable implementations.
//!
//! Collects every factory the binary links in, so implementations can be
//! chosen by name from the configuration.

use barista_catalog::CatalogFactory;
use barista_config::Config;
use barista_core::{CatalogFactories, EngineBuilder, OrderEngine};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Registry of all known implementation factories.
pub struct FactoryRegistry {
	pub catalog: HashMap<String, CatalogFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			catalog: HashMap::new(),
		}
	}

	pub fn register_catalog(&mut self, name: impl Into<String>, factory: CatalogFactory) {
		self.catalog.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, filling it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in barista_catalog::get_all_implementations() {
			tracing::debug!("Registering catalog implementation: {}", name);
			registry.register_catalog(name, factory);
		}

		registry
	})
}

/// Picks the factories named in a config section, failing on unknown names.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the order engine from configuration using the registered factories.
pub fn build_engine_from_config(config: Config) -> Result<OrderEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let catalog_factories =
		build_factories!(registry, config.catalog.implementations, catalog, "catalog");

	let engine = EngineBuilder::new(config).build(CatalogFactories { catalog_factories })?;
	Ok(engine)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registry_knows_all_catalogs() {
		let registry = get_registry();
		assert!(registry.catalog.contains_key("memory"));
		assert!(registry.catalog.contains_key("google_sheets"));
	}

	#[test]
	fn test_unknown_implementation_is_rejected() {
		let config: Config = r#"
[shop]
name = "Bean There"

[catalog]
primary = "airtable"
[catalog.implementations.airtable]
"#
		.parse()
		.unwrap();

		let err = build_engine_from_config(config).err().unwrap();
		let message = err.to_string();
		assert!(message.contains("Unknown catalog implementation 'airtable'"));
		assert!(message.contains("google_sheets, memory"));
	}

	#[test]
	fn test_builds_memory_engine() {
		let config: Config = r#"
[shop]
name = "Bean There"

[catalog]
primary = "memory"
[catalog.implementations.memory]
"#
		.parse()
		.unwrap();

		let engine = build_engine_from_config(config).unwrap();
		assert_eq!(engine.active_sessions(), 0);
	}
}
