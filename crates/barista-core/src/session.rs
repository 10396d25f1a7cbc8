//! Order session state.

use barista_types::{Cart, ContactDetails, LineItem, Product};
use serde::Serialize;
use std::fmt;

/// Where a conversation is in the order flow. Each state carries exactly the
/// data collected so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OrderState {
	#[default]
	BrowsingCategories,
	BrowsingProducts {
		category: String,
	},
	SelectingQuantity {
		pending: Product,
		/// The user asked to type the quantity.
		awaiting_custom: bool,
	},
	CartReview,
	EditingQuantity {
		index: usize,
	},
	EnteringName,
	EnteringPhone {
		name: String,
	},
	EnteringAddress {
		name: String,
		phone: String,
	},
	ConfirmingOrder {
		contact: ContactDetails,
	},
	/// The order was accepted; the session is reset right after.
	Submitted,
}

/// Data-free mirror of [`OrderState`] reported to the chat front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
	BrowsingCategories,
	BrowsingProducts,
	SelectingQuantity,
	CartReview,
	EditingQuantity,
	EnteringName,
	EnteringPhone,
	EnteringAddress,
	ConfirmingOrder,
	Submitted,
}

impl fmt::Display for StateKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			StateKind::BrowsingCategories => "browsing_categories",
			StateKind::BrowsingProducts => "browsing_products",
			StateKind::SelectingQuantity => "selecting_quantity",
			StateKind::CartReview => "cart_review",
			StateKind::EditingQuantity => "editing_quantity",
			StateKind::EnteringName => "entering_name",
			StateKind::EnteringPhone => "entering_phone",
			StateKind::EnteringAddress => "entering_address",
			StateKind::ConfirmingOrder => "confirming_order",
			StateKind::Submitted => "submitted",
		};
		f.write_str(s)
	}
}

impl OrderState {
	pub fn kind(&self) -> StateKind {
		match self {
			OrderState::BrowsingCategories => StateKind::BrowsingCategories,
			OrderState::BrowsingProducts { .. } => StateKind::BrowsingProducts,
			OrderState::SelectingQuantity { .. } => StateKind::SelectingQuantity,
			OrderState::CartReview => StateKind::CartReview,
			OrderState::EditingQuantity { .. } => StateKind::EditingQuantity,
			OrderState::EnteringName => StateKind::EnteringName,
			OrderState::EnteringPhone { .. } => StateKind::EnteringPhone,
			OrderState::EnteringAddress { .. } => StateKind::EnteringAddress,
			OrderState::ConfirmingOrder { .. } => StateKind::ConfirmingOrder,
			OrderState::Submitted => StateKind::Submitted,
		}
	}

	/// States in which the cart can be edited or checked out.
	pub fn is_cart_hub(&self) -> bool {
		matches!(self, OrderState::CartReview | OrderState::EditingQuantity { .. })
	}
}

/// One conversation's order in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSession {
	pub state: OrderState,
	pub cart: Cart,
}

impl OrderSession {
	pub fn kind(&self) -> StateKind {
		self.state.kind()
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			state: self.kind(),
			lines: self.cart.snapshot(),
			total: self.cart.total(),
			item_count: self.cart.item_count(),
		}
	}
}

/// Read-only view of a session for inspection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
	pub state: StateKind,
	pub lines: Vec<LineItem>,
	pub total: u64,
	pub item_count: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new_session_starts_browsing_with_empty_cart() {
		let session = OrderSession::default();
		assert_eq!(session.kind(), StateKind::BrowsingCategories);
		assert!(session.cart.is_empty());
	}

	#[test]
	fn test_state_kind_display_matches_serialization() {
		let kind = StateKind::ConfirmingOrder;
		assert_eq!(kind.to_string(), "confirming_order");
		assert_eq!(serde_json::to_value(kind).unwrap(), "confirming_order");
	}

	#[test]
	fn test_cart_hub_states() {
		assert!(OrderState::CartReview.is_cart_hub());
		assert!(OrderState::EditingQuantity { index: 0 }.is_cart_hub());
		assert!(!OrderState::EnteringName.is_cart_hub());
	}
}
