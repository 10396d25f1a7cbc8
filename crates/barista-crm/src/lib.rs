//! CRM lead submission for the barista ordering service.
//!
//! A confirmed order is sent to a Bitrix-style CRM through its inbound webhook.
//! Submission creates the lead first; only that step decides success. The
//! order lines are then attached by an ordered list of strategies, each a
//! fallback for the previous one. Nothing here is idempotent and no
//! deduplication key is sent.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod payload;
pub mod pipeline;
pub mod strategies;
pub mod transport;

pub use payload::LeadSettings;
pub use pipeline::{LeadPipeline, LeadReceipt};
pub use strategies::{AttachStrategy, BatchStrategy, CommentAppendStrategy, ProductRowsStrategy};
pub use transport::WebhookTransport;

/// Errors that can occur while talking to the CRM.
#[derive(Debug, Error)]
pub enum CrmError {
	/// The CRM is not configured or the client could not be built.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// The request did not complete (connection failure, timeout).
	#[error("Transport error: {0}")]
	Transport(String),
	/// The CRM answered with a non-200 status or an error body.
	#[error("Remote error: {0}")]
	Remote(String),
	/// A success body without a `result` member.
	#[error("Response to {0} has no result")]
	MissingResult(String),
	/// `crm.lead.add` succeeded but returned no usable lead id.
	#[error("Invalid lead id in response: {0}")]
	InvalidLeadId(String),
	/// The last-resort comment update failed as well.
	#[error("Unstructured fallback failed: {0}")]
	UnstructuredFallbackFailure(String),
}

/// Identifier of a lead created in the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeadId(pub u64);

impl LeadId {
	/// Reads a lead id from a `crm.lead.add` result, which is either a number
	/// or a numeric string.
	pub fn from_result(result: &serde_json::Value) -> Result<Self, CrmError> {
		let parsed = match result {
			serde_json::Value::Number(n) => n.as_u64(),
			serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
			_ => None,
		};

		parsed
			.filter(|id| *id > 0)
			.map(LeadId)
			.ok_or_else(|| CrmError::InvalidLeadId(result.to_string()))
	}
}

impl fmt::Display for LeadId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Low-level access to the CRM REST methods.
///
/// `call` posts `payload` to the named method and returns the `result`
/// member of a successful response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmTransport: Send + Sync {
	async fn call(
		&self,
		method: &str,
		payload: serde_json::Value,
	) -> Result<serde_json::Value, CrmError>;
}
