//! Builder pattern for constructing order engines.
//!
//! Composes an [`OrderEngine`] from configuration: the catalog backend is
//! picked from factory functions keyed by implementation name, and the CRM
//! pipeline is wired up when a webhook is configured.

use crate::engine::{OrderEngine, SessionSettings};
use crate::view::Storefront;
use barista_catalog::{CatalogError, CatalogInterface, CatalogService};
use barista_config::Config;
use barista_crm::{LeadPipeline, LeadSettings, WebhookTransport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every catalog implementation the binary knows about.
pub struct CatalogFactories<CF> {
	pub catalog_factories: HashMap<String, CF>,
}

/// Builder for constructing an OrderEngine with a pluggable catalog.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine. Fails if the primary catalog cannot be created or the
	/// CRM client cannot be set up; a missing webhook only disables submission.
	pub fn build<CF>(self, factories: CatalogFactories<CF>) -> Result<OrderEngine, BuilderError>
	where
		CF: Fn(&toml::Value) -> Result<Box<dyn CatalogInterface>, CatalogError>,
	{
		let mut catalog_impls = HashMap::new();
		for (name, config) in &self.config.catalog.implementations {
			let Some(factory) = factories.catalog_factories.get(name) else {
				tracing::warn!(component = "catalog", implementation = %name, "Unknown implementation, skipping");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					catalog_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.catalog.primary == name;
					tracing::info!(component = "catalog", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "catalog",
						implementation = %name,
						error = %e,
						"Failed to create catalog implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create catalog implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_catalog = &self.config.catalog.primary;
		let catalog_backend = catalog_impls.remove(primary_catalog).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary catalog '{}' failed to load or has no registered implementation",
				primary_catalog
			))
		})?;
		let catalog = Arc::new(CatalogService::new(catalog_backend));

		let pipeline = self.build_pipeline()?;

		let shop = Storefront {
			name: self.config.shop.name.clone(),
			about: self.config.shop.about.clone(),
			currency_symbol: self.config.shop.currency_symbol.clone(),
			support_contact: self.config.shop.support_contact.clone(),
		};
		let settings = SessionSettings {
			ttl: Duration::from_secs(self.config.session.ttl_minutes * 60),
			cleanup_interval: Duration::from_secs(self.config.session.cleanup_interval_seconds),
		};

		Ok(OrderEngine::new(catalog, pipeline, shop, settings))
	}

	fn build_pipeline(&self) -> Result<Option<Arc<LeadPipeline>>, BuilderError> {
		let crm = &self.config.crm;
		let Some(webhook) = crm.webhook_url.clone() else {
			tracing::error!(
				component = "crm",
				"No CRM webhook configured, confirmed orders will not be submitted"
			);
			return Ok(None);
		};

		let transport = WebhookTransport::new(webhook, Duration::from_secs(crm.timeout_seconds))
			.map_err(|e| BuilderError::Config(format!("Failed to create CRM client: {}", e)))?;
		let settings = LeadSettings {
			source_id: crm.source_id.clone(),
			currency: self.config.shop.currency.clone(),
			currency_symbol: self.config.shop.currency_symbol.clone(),
			measure_code: crm.measure_code,
			measure_name: crm.measure_name.clone(),
		};

		tracing::info!(component = "crm", source_id = %crm.source_id, "Loaded");
		Ok(Some(Arc::new(LeadPipeline::new(Arc::new(transport), settings))))
	}
}
