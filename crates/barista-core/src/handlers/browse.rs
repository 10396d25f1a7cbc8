//! Menu browsing and product selection.

use super::TurnResult;
use crate::checkout::parse_quantity;
use crate::session::{OrderSession, OrderState};
use crate::view::{self, Instruction, Storefront};
use crate::TurnError;
use barista_catalog::CatalogService;
use barista_types::Product;
use std::sync::Arc;

/// Handles categories, products and quantity selection.
pub struct BrowseHandler {
	catalog: Arc<CatalogService>,
	shop: Arc<Storefront>,
}

impl BrowseHandler {
	pub fn new(catalog: Arc<CatalogService>, shop: Arc<Storefront>) -> Self {
		Self { catalog, shop }
	}

	pub fn start(&self) -> Vec<Instruction> {
		vec![view::welcome(&self.shop)]
	}

	pub fn about(&self) -> Vec<Instruction> {
		vec![view::about(&self.shop)]
	}

	/// Shows the categories. Allowed from any state; the cart is kept.
	pub async fn open_menu(&self, session: &mut OrderSession) -> Vec<Instruction> {
		let categories = self.catalog.list_categories().await;
		session.state = OrderState::BrowsingCategories;
		vec![view::categories(&categories)]
	}

	pub async fn select_category(&self, session: &mut OrderSession, category: &str) -> TurnResult {
		if !matches!(
			session.state,
			OrderState::BrowsingCategories | OrderState::BrowsingProducts { .. }
		) {
			return Err(TurnError::NotAvailable);
		}

		let names = self.catalog.list_products_by_category(category).await;
		tracing::debug!(category, products = names.len(), "Category selected");

		session.state = OrderState::BrowsingProducts {
			category: category.to_string(),
		};
		Ok(vec![view::products(category, &names)])
	}

	/// Makes the named product the pending selection, replacing any earlier one.
	pub async fn select_product(&self, session: &mut OrderSession, name: &str) -> TurnResult {
		if !matches!(
			session.state,
			OrderState::BrowsingProducts { .. } | OrderState::SelectingQuantity { .. }
		) {
			return Err(TurnError::NotAvailable);
		}

		let product = self
			.catalog
			.first_product(name)
			.await
			.ok_or_else(|| TurnError::ProductNotFound(name.to_string()))?;

		let card = view::product_card(&product, &self.shop);
		session.state = OrderState::SelectingQuantity {
			pending: product,
			awaiting_custom: false,
		};
		Ok(vec![card])
	}

	/// Adds the pending product with a quick-pick quantity.
	pub fn choose_quantity(&self, session: &mut OrderSession, quantity: i64) -> TurnResult {
		let pending = pending_product(session)?;
		self.add_pending(session, pending, quantity)
	}

	pub fn request_custom_quantity(&self, session: &mut OrderSession) -> TurnResult {
		let OrderState::SelectingQuantity {
			pending,
			awaiting_custom,
		} = &mut session.state
		else {
			return Err(TurnError::NoPendingSelection);
		};

		*awaiting_custom = true;
		Ok(vec![view::custom_quantity_prompt(pending)])
	}

	/// Typed quantity after "other quantity".
	pub fn custom_quantity(&self, session: &mut OrderSession, text: &str) -> TurnResult {
		let pending = pending_product(session)?;
		let quantity = parse_quantity(text)?;
		self.add_pending(session, pending, quantity)
	}

	fn add_pending(&self, session: &mut OrderSession, product: Product, quantity: i64) -> TurnResult {
		let item = session.cart.add(product, quantity)?.clone();
		session.state = OrderState::CartReview;

		tracing::debug!(
			product = %item.product.name,
			quantity = item.quantity,
			lines = session.cart.len(),
			"Added to cart"
		);
		Ok(view::added_to_cart(&item, &session.cart, &self.shop))
	}
}

fn pending_product(session: &OrderSession) -> Result<Product, TurnError> {
	match &session.state {
		OrderState::SelectingQuantity { pending, .. } => Ok(pending.clone()),
		_ => Err(TurnError::NoPendingSelection),
	}
}
