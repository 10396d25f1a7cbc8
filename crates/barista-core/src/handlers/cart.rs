//! Cart review and editing.

use super::TurnResult;
use crate::checkout::parse_quantity;
use crate::session::{OrderSession, OrderState};
use crate::view::{self, Instruction, Storefront};
use crate::TurnError;
use barista_types::CartError;
use std::sync::Arc;

/// Handles the cart hub: viewing, removing, editing and clearing lines.
pub struct CartHandler {
	shop: Arc<Storefront>,
}

impl CartHandler {
	pub fn new(shop: Arc<Storefront>) -> Self {
		Self { shop }
	}

	/// Itemized cart. Allowed from any state.
	pub fn show(&self, session: &mut OrderSession) -> Vec<Instruction> {
		session.state = OrderState::CartReview;
		vec![view::cart_detail(&session.cart, &self.shop)]
	}

	/// Item count and total. Allowed from any state.
	pub fn summary(&self, session: &mut OrderSession) -> Vec<Instruction> {
		session.state = OrderState::CartReview;
		vec![view::cart_summary(&session.cart, &self.shop)]
	}

	pub fn clear(&self, session: &mut OrderSession) -> TurnResult {
		require_hub(session)?;

		session.cart.clear();
		session.state = OrderState::CartReview;
		tracing::debug!("Cart cleared");
		Ok(vec![
			Instruction::text("Cart cleared."),
			view::cart_detail(&session.cart, &self.shop),
		])
	}

	/// Removes a line; later lines move up one position.
	pub fn remove(&self, session: &mut OrderSession, index: usize) -> TurnResult {
		require_hub(session)?;

		let removed = session.cart.remove(index)?;
		session.state = OrderState::CartReview;
		Ok(vec![
			Instruction::text(format!("{} removed from the cart.", removed.product.name)),
			view::cart_detail(&session.cart, &self.shop),
		])
	}

	pub fn start_edit(&self, session: &mut OrderSession, index: usize) -> TurnResult {
		require_hub(session)?;

		let item = session.cart.get(index).ok_or(CartError::IndexOutOfRange {
			index,
			len: session.cart.len(),
		})?;
		let prompt = view::edit_quantity_prompt(item);

		session.state = OrderState::EditingQuantity { index };
		Ok(vec![prompt])
	}

	/// Typed quantity for the line being edited. Returns to the cart.
	pub fn apply_edit(&self, session: &mut OrderSession, index: usize, text: &str) -> TurnResult {
		let quantity = parse_quantity(text)?;
		let item = session.cart.set_quantity(index, quantity)?;
		let updated = format!("Updated: {} is now x{}", item.product.name, item.quantity);

		session.state = OrderState::CartReview;
		Ok(vec![
			Instruction::text(updated),
			view::cart_detail(&session.cart, &self.shop),
		])
	}
}

fn require_hub(session: &OrderSession) -> Result<(), TurnError> {
	if session.state.is_cart_hub() {
		Ok(())
	} else {
		Err(TurnError::NotAvailable)
	}
}
