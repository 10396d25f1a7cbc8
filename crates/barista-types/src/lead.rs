//! Lead snapshot types.
//!
//! A lead is the frozen view of a finished order session that is sent to the
//! CRM. It is built once per confirmation and never mutated afterwards.

use crate::{Cart, ConversationId, LineItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building a lead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeadError {
	#[error("Cannot build a lead from an empty cart")]
	EmptyCart,
}

/// Contact and delivery details collected during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
	/// Customer name as typed.
	pub name: String,
	/// Normalized phone number with a leading `+`.
	pub phone: String,
	/// Delivery address as typed.
	pub address: String,
}

/// Immutable order snapshot submitted to the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
	conversation_id: ConversationId,
	username: Option<String>,
	contact: ContactDetails,
	items: Vec<LineItem>,
	created_at: DateTime<Utc>,
}

impl Lead {
	/// Freezes the cart and contact details into a lead.
	pub fn new(
		conversation_id: ConversationId,
		username: Option<String>,
		contact: ContactDetails,
		cart: &Cart,
	) -> Result<Self, LeadError> {
		Self::with_timestamp(conversation_id, username, contact, cart, Utc::now())
	}

	/// Same as [`Lead::new`] with an explicit creation time.
	pub fn with_timestamp(
		conversation_id: ConversationId,
		username: Option<String>,
		contact: ContactDetails,
		cart: &Cart,
		created_at: DateTime<Utc>,
	) -> Result<Self, LeadError> {
		if cart.is_empty() {
			return Err(LeadError::EmptyCart);
		}

		Ok(Self {
			conversation_id,
			username: username.filter(|u| !u.trim().is_empty()),
			contact,
			items: cart.snapshot(),
			created_at,
		})
	}

	pub fn conversation_id(&self) -> ConversationId {
		self.conversation_id
	}

	pub fn username(&self) -> Option<&str> {
		self.username.as_deref()
	}

	pub fn contact(&self) -> &ContactDetails {
		&self.contact
	}

	pub fn items(&self) -> &[LineItem] {
		&self.items
	}

	pub fn created_at(&self) -> DateTime<Utc> {
		self.created_at
	}

	/// Grand total over the snapshot lines.
	pub fn total(&self) -> u64 {
		crate::cart::sum_subtotals(self.items.iter())
	}

	/// Total number of units in the snapshot.
	pub fn item_count(&self) -> u64 {
		self.items.iter().map(|item| u64::from(item.quantity)).sum()
	}
}
