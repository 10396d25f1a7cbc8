//! Inbound-webhook transport.

use crate::{CrmError, CrmTransport};
use async_trait::async_trait;
use barista_types::SecretString;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Posts JSON to `<webhook>/<method>`.
///
/// The webhook URL embeds the access token, so it never appears in errors or
/// logs.
pub struct WebhookTransport {
	base_url: SecretString,
	client: reqwest::Client,
}

impl WebhookTransport {
	pub fn new(base_url: SecretString, timeout: Duration) -> Result<Self, CrmError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| CrmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self { base_url, client })
	}

	fn endpoint(&self, method: &str) -> String {
		self.base_url
			.with_exposed(|base| format!("{}/{}", base.trim().trim_end_matches('/'), method))
	}
}

#[async_trait]
impl CrmTransport for WebhookTransport {
	async fn call(&self, method: &str, payload: Value) -> Result<Value, CrmError> {
		tracing::debug!(method, "Calling CRM");

		let response = self
			.client
			.post(self.endpoint(method))
			.json(&payload)
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					CrmError::Transport(format!("{} timed out", method))
				} else {
					CrmError::Transport(e.without_url().to_string())
				}
			})?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| CrmError::Transport(e.without_url().to_string()))?;

		interpret_response(method, status, &body)
	}
}

/// Maps an HTTP answer to the `result` member or a typed error.
pub(crate) fn interpret_response(
	method: &str,
	status: StatusCode,
	body: &str,
) -> Result<Value, CrmError> {
	let parsed: Option<Value> = serde_json::from_str(body).ok();

	if let Some(error) = parsed.as_ref().and_then(|v| v.get("error")) {
		let description = parsed
			.as_ref()
			.and_then(|v| v.get("error_description"))
			.and_then(Value::as_str)
			.unwrap_or("");
		let code = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
		return Err(CrmError::Remote(format!(
			"{} failed with {} ({}): {}",
			method, code, status, description
		)));
	}

	if status != StatusCode::OK {
		return Err(CrmError::Remote(format!("{} answered with status {}", method, status)));
	}

	let Some(mut body) = parsed else {
		return Err(CrmError::Remote(format!("{} returned a non-JSON body", method)));
	};

	body.get_mut("result")
		.map(Value::take)
		.ok_or_else(|| CrmError::MissingResult(method.to_string()))
}
