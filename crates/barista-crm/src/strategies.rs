//! Strategies for attaching order lines to a created lead.
//!
//! The pipeline tries them in order and stops at the first success.

use crate::payload::{self, LeadSettings};
use crate::{CrmError, CrmTransport, LeadId};
use async_trait::async_trait;
use barista_types::Lead;

/// One way of getting the order lines onto a lead.
#[async_trait]
pub trait AttachStrategy: Send + Sync {
	/// Short name used in logs and receipts.
	fn name(&self) -> &'static str;

	async fn attach(
		&self,
		transport: &dyn CrmTransport,
		lead_id: LeadId,
		lead: &Lead,
	) -> Result<(), CrmError>;
}

/// Structured rows through `crm.lead.productrows.set`.
pub struct ProductRowsStrategy {
	settings: LeadSettings,
}

impl ProductRowsStrategy {
	pub fn new(settings: LeadSettings) -> Self {
		Self { settings }
	}
}

#[async_trait]
impl AttachStrategy for ProductRowsStrategy {
	fn name(&self) -> &'static str {
		"product_rows"
	}

	async fn attach(
		&self,
		transport: &dyn CrmTransport,
		lead_id: LeadId,
		lead: &Lead,
	) -> Result<(), CrmError> {
		let body = payload::productrows_set(lead_id, lead, &self.settings);
		// Any result, including an empty list, counts
		transport.call("crm.lead.productrows.set", body).await?;
		Ok(())
	}
}

/// The same rows wrapped in a `batch` call.
pub struct BatchStrategy {
	settings: LeadSettings,
}

impl BatchStrategy {
	pub fn new(settings: LeadSettings) -> Self {
		Self { settings }
	}
}

#[async_trait]
impl AttachStrategy for BatchStrategy {
	fn name(&self) -> &'static str {
		"batch"
	}

	async fn attach(
		&self,
		transport: &dyn CrmTransport,
		lead_id: LeadId,
		lead: &Lead,
	) -> Result<(), CrmError> {
		let body = payload::batch_productrows(lead_id, lead, &self.settings)?;
		transport.call("batch", body).await?;
		Ok(())
	}
}

/// Appends a plain-text breakdown to the lead's COMMENTS.
pub struct CommentAppendStrategy {
	settings: LeadSettings,
}

impl CommentAppendStrategy {
	pub fn new(settings: LeadSettings) -> Self {
		Self { settings }
	}
}

#[async_trait]
impl AttachStrategy for CommentAppendStrategy {
	fn name(&self) -> &'static str {
		"comment_append"
	}

	async fn attach(
		&self,
		transport: &dyn CrmTransport,
		lead_id: LeadId,
		lead: &Lead,
	) -> Result<(), CrmError> {
		let current = transport
			.call("crm.lead.get", payload::lead_get(lead_id))
			.await?;
		let existing = current
			.get("COMMENTS")
			.and_then(|c| c.as_str())
			.unwrap_or_default();

		let breakdown = payload::itemized_breakdown(lead, &self.settings);
		let comments = if existing.trim().is_empty() {
			breakdown
		} else {
			format!("{}\n\n{}", existing, breakdown)
		};

		transport
			.call(
				"crm.lead.update",
				payload::lead_update_comments(lead_id, &comments),
			)
			.await?;
		Ok(())
	}
}

/// The standard order: product rows, then batch, then comment append.
pub fn default_strategies(settings: &LeadSettings) -> Vec<Box<dyn AttachStrategy>> {
	vec![
		Box::new(ProductRowsStrategy::new(settings.clone())),
		Box::new(BatchStrategy::new(settings.clone())),
		Box::new(CommentAppendStrategy::new(settings.clone())),
	]
}
