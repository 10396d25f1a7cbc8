//! Lead submission pipeline.

use crate::payload::{self, LeadSettings};
use crate::strategies::{default_strategies, AttachStrategy};
use crate::{CrmError, CrmTransport, LeadId};
use barista_types::{mask_phone, Lead};
use std::sync::Arc;
use tracing::instrument;

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadReceipt {
	pub lead_id: LeadId,
	/// Strategy that attached the order lines, `None` if every one failed.
	pub attached_by: Option<&'static str>,
}

/// Creates a lead and attaches its lines.
pub struct LeadPipeline {
	transport: Arc<dyn CrmTransport>,
	settings: LeadSettings,
	strategies: Vec<Box<dyn AttachStrategy>>,
}

impl LeadPipeline {
	/// Pipeline with the standard attach strategies.
	pub fn new(transport: Arc<dyn CrmTransport>, settings: LeadSettings) -> Self {
		let strategies = default_strategies(&settings);
		Self::with_strategies(transport, settings, strategies)
	}

	pub fn with_strategies(
		transport: Arc<dyn CrmTransport>,
		settings: LeadSettings,
		strategies: Vec<Box<dyn AttachStrategy>>,
	) -> Self {
		Self {
			transport,
			settings,
			strategies,
		}
	}

	/// Submits `lead`.
	///
	/// Fails only if the lead itself could not be created. Attach failures
	/// are logged and reflected in [`LeadReceipt::attached_by`].
	#[instrument(skip_all, fields(conversation = %lead.conversation_id(), total = lead.total()))]
	pub async fn submit(&self, lead: &Lead) -> Result<LeadReceipt, CrmError> {
		let result = self
			.transport
			.call("crm.lead.add", payload::lead_add(lead, &self.settings))
			.await?;
		let lead_id = LeadId::from_result(&result)?;

		tracing::info!(
			lead_id = %lead_id,
			phone = %mask_phone(&lead.contact().phone),
			"Lead created"
		);

		let attached_by = self.attach_lines(lead_id, lead).await;
		Ok(LeadReceipt {
			lead_id,
			attached_by,
		})
	}

	async fn attach_lines(&self, lead_id: LeadId, lead: &Lead) -> Option<&'static str> {
		let mut last_error = None;

		for strategy in &self.strategies {
			match strategy
				.attach(self.transport.as_ref(), lead_id, lead)
				.await
			{
				Ok(()) => {
					tracing::info!(lead_id = %lead_id, strategy = strategy.name(), "Order lines attached");
					return Some(strategy.name());
				},
				Err(e) => {
					tracing::warn!(
						lead_id = %lead_id,
						strategy = strategy.name(),
						error = %e,
						"Attach strategy failed, trying next"
					);
					last_error = Some(e);
				},
			}
		}

		if let Some(e) = last_error {
			let failure = CrmError::UnstructuredFallbackFailure(e.to_string());
			tracing::error!(lead_id = %lead_id, error = %failure, "Order lines not attached to lead");
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::payload::tests::sample_lead;
	use crate::MockCrmTransport;
	use serde_json::{json, Value};
	use std::sync::Mutex;

	fn pipeline(transport: MockCrmTransport) -> LeadPipeline {
		LeadPipeline::new(Arc::new(transport), LeadSettings::default())
	}

	#[tokio::test]
	async fn test_lead_without_id_fails_after_one_call() {
		let mut transport = MockCrmTransport::new();
		transport
			.expect_call()
			.times(1)
			.returning(|_, _| Ok(json!(false)));

		let result = pipeline(transport).submit(&sample_lead()).await;
		assert!(matches!(result, Err(CrmError::InvalidLeadId(_))));
	}

	#[tokio::test]
	async fn test_create_failure_stops_pipeline() {
		let mut transport = MockCrmTransport::new();
		transport
			.expect_call()
			.withf(|method, _| method == "crm.lead.add")
			.times(1)
			.returning(|_, _| Err(CrmError::Remote("crm.lead.add answered with status 500".into())));

		let result = pipeline(transport).submit(&sample_lead()).await;
		assert!(matches!(result, Err(CrmError::Remote(_))));
	}

	#[tokio::test]
	async fn test_success_even_when_every_attach_fails() {
		let mut transport = MockCrmTransport::new();
		transport
			.expect_call()
			.withf(|method, _| method == "crm.lead.add")
			.times(1)
			.returning(|_, _| Ok(json!("77")));
		for method in ["crm.lead.productrows.set", "batch", "crm.lead.get"] {
			transport
				.expect_call()
				.withf(move |m, _| m == method)
				.times(1)
				.returning(|_, _| Err(CrmError::Transport("timed out".into())));
		}

		let receipt = pipeline(transport).submit(&sample_lead()).await.unwrap();
		assert_eq!(
			receipt,
			LeadReceipt {
				lead_id: LeadId(77),
				attached_by: None,
			}
		);
	}

	#[tokio::test]
	async fn test_batch_used_when_product_rows_fail() {
		let mut transport = MockCrmTransport::new();
		transport
			.expect_call()
			.withf(|method, _| method == "crm.lead.add")
			.returning(|_, _| Ok(json!(12)));
		transport
			.expect_call()
			.withf(|method, _| method == "crm.lead.productrows.set")
			.returning(|_, _| Err(CrmError::Remote("ACCESS_DENIED".into())));
		transport
			.expect_call()
			.withf(|method, body| method == "batch" && body["cmd"]["item_1"].is_string())
			.times(1)
			.returning(|_, _| Ok(json!({ "result": {}, "result_error": [] })));

		let receipt = pipeline(transport).submit(&sample_lead()).await.unwrap();
		assert_eq!(receipt.attached_by, Some("batch"));
	}

	#[tokio::test]
	async fn test_end_to_end_payload() {
		let calls: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
		let log = calls.clone();

		let mut transport = MockCrmTransport::new();
		transport.expect_call().returning(move |method, body| {
			log.lock().unwrap().push((method.to_string(), body));
			match method {
				"crm.lead.add" => Ok(json!(5)),
				_ => Ok(json!(true)),
			}
		});

		let receipt = pipeline(transport).submit(&sample_lead()).await.unwrap();
		assert_eq!(receipt.attached_by, Some("product_rows"));

		let calls = calls.lock().unwrap();
		assert_eq!(calls.len(), 2);

		let (method, body) = &calls[0];
		assert_eq!(method, "crm.lead.add");
		assert_eq!(body["fields"]["PHONE"][0]["VALUE"], "+79990001122");
		assert!(body["fields"]["TITLE"].as_str().unwrap().contains("650"));

		let (method, body) = &calls[1];
		assert_eq!(method, "crm.lead.productrows.set");
		assert_eq!(body["id"], 5);
	}
}
