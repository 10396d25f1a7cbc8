//! Checkout and order submission.

use super::{TurnContext, TurnResult};
use crate::checkout::{validate_address, validate_name, validate_phone};
use crate::session::{OrderSession, OrderState};
use crate::view::{self, Storefront};
use crate::TurnError;
use barista_crm::LeadPipeline;
use barista_types::{ContactDetails, Lead, LeadError};
use std::sync::Arc;
use tracing::instrument;

/// Collects contact details and submits the order.
pub struct OrderHandler {
	/// Absent when no CRM endpoint is configured.
	pipeline: Option<Arc<LeadPipeline>>,
	shop: Arc<Storefront>,
}

impl OrderHandler {
	pub fn new(pipeline: Option<Arc<LeadPipeline>>, shop: Arc<Storefront>) -> Self {
		Self { pipeline, shop }
	}

	/// Starts checkout from the cart hub. An empty cart never gets past here.
	pub fn begin(&self, session: &mut OrderSession) -> TurnResult {
		if !session.state.is_cart_hub() {
			return Err(TurnError::NotAvailable);
		}
		if session.cart.is_empty() {
			return Err(TurnError::EmptyCart);
		}

		session.state = OrderState::EnteringName;
		Ok(vec![view::name_prompt()])
	}

	pub fn enter_name(&self, session: &mut OrderSession, text: &str) -> TurnResult {
		let name = validate_name(text)?;
		session.state = OrderState::EnteringPhone { name };
		Ok(vec![view::phone_prompt()])
	}

	pub fn enter_phone(&self, session: &mut OrderSession, name: String, text: &str) -> TurnResult {
		let phone = validate_phone(text)?;
		session.state = OrderState::EnteringAddress { name, phone };
		Ok(vec![view::address_prompt()])
	}

	pub fn enter_address(
		&self,
		session: &mut OrderSession,
		name: String,
		phone: String,
		text: &str,
	) -> TurnResult {
		let address = validate_address(text)?;
		let contact = ContactDetails {
			name,
			phone,
			address,
		};
		let review = view::confirmation(&contact, &session.cart, &self.shop);

		session.state = OrderState::ConfirmingOrder { contact };
		Ok(vec![review])
	}

	/// Submits the order. On success the session is marked submitted with an
	/// empty cart; on any failure it stays in confirmation so the user can
	/// retry without typing everything again.
	#[instrument(skip_all, fields(conversation = %ctx.conversation))]
	pub async fn confirm(&self, session: &mut OrderSession, ctx: &TurnContext) -> TurnResult {
		let OrderState::ConfirmingOrder { contact } = &session.state else {
			return Err(TurnError::NotAvailable);
		};

		let lead = Lead::new(
			ctx.conversation,
			ctx.username.clone(),
			contact.clone(),
			&session.cart,
		)
		.map_err(|e| match e {
			LeadError::EmptyCart => TurnError::EmptyCart,
		})?;

		let Some(pipeline) = &self.pipeline else {
			tracing::warn!("Order confirmed but CRM submission is not configured");
			return Err(TurnError::SubmissionDisabled);
		};

		let receipt = pipeline.submit(&lead).await.map_err(|e| {
			tracing::error!(error = %e, "Order submission failed");
			TurnError::Submission(e.to_string())
		})?;

		tracing::info!(
			lead_id = %receipt.lead_id,
			attached_by = receipt.attached_by.unwrap_or("none"),
			total = lead.total(),
			"Order submitted"
		);

		session.cart.clear();
		session.state = OrderState::Submitted;
		Ok(vec![view::submitted(&receipt)])
	}
}
