//! Turn inputs and choice tokens.
//!
//! A choice travels through the chat front-end as a short token such as
//! `product_Latte` or `remove_1`. Tokens parse into [`Choice`] and render back
//! with `Display`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One incoming chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
	/// The conversation was (re)started.
	Start,
	/// Free text typed by the user.
	Text(String),
	/// A button press.
	Choice(Choice),
}

/// A discrete menu choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
	/// Open the menu categories.
	Menu,
	About,
	/// Back to the categories to add another item.
	AddMore,
	ReturnCategories,
	ShowCart,
	ShowCartSummary,
	ClearCart,
	Category(String),
	Product(String),
	/// Quick-pick quantity for the pending product, within [`QUICK_PICK`].
	Quantity(i64),
	/// Ask for a typed quantity for the pending product.
	CustomQuantity,
	Remove(usize),
	EditQuantity(usize),
	/// Start checkout.
	Checkout,
	/// Confirm and submit the order.
	Confirm,
}

/// Token that does not name any choice.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown choice token: {0}")]
pub struct UnknownChoice(pub String);

const CATEGORY: &str = "category_";
const PRODUCT: &str = "product_";
const QUANTITY: &str = "quantity_";
const REMOVE: &str = "remove_";
const EDIT_QUANTITY: &str = "editqty_";

/// Quantities offered as buttons. Larger amounts go through `custom_quantity`.
pub const QUICK_PICK: std::ops::RangeInclusive<i64> = 1..=9;

impl FromStr for Choice {
	type Err = UnknownChoice;

	fn from_str(token: &str) -> Result<Self, Self::Err> {
		let unknown = || UnknownChoice(token.to_string());

		let choice = match token {
			"menu" => Choice::Menu,
			"about" => Choice::About,
			"add_more" => Choice::AddMore,
			"return_categories" => Choice::ReturnCategories,
			"show_cart" => Choice::ShowCart,
			"show_cart_summary" => Choice::ShowCartSummary,
			"clear_cart" => Choice::ClearCart,
			"custom_quantity" => Choice::CustomQuantity,
			"purchase" => Choice::Checkout,
			"confirm_order" => Choice::Confirm,
			_ => {
				if let Some(label) = token.strip_prefix(CATEGORY).filter(|s| !s.is_empty()) {
					Choice::Category(label.to_string())
				} else if let Some(name) = token.strip_prefix(PRODUCT).filter(|s| !s.is_empty()) {
					Choice::Product(name.to_string())
				} else if let Some(n) = token.strip_prefix(QUANTITY) {
					let n: i64 = n.parse().map_err(|_| unknown())?;
					if !QUICK_PICK.contains(&n) {
						return Err(unknown());
					}
					Choice::Quantity(n)
				} else if let Some(i) = token.strip_prefix(REMOVE) {
					Choice::Remove(i.parse().map_err(|_| unknown())?)
				} else if let Some(i) = token.strip_prefix(EDIT_QUANTITY) {
					Choice::EditQuantity(i.parse().map_err(|_| unknown())?)
				} else {
					return Err(unknown());
				}
			},
		};

		Ok(choice)
	}
}

impl fmt::Display for Choice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Choice::Menu => f.write_str("menu"),
			Choice::About => f.write_str("about"),
			Choice::AddMore => f.write_str("add_more"),
			Choice::ReturnCategories => f.write_str("return_categories"),
			Choice::ShowCart => f.write_str("show_cart"),
			Choice::ShowCartSummary => f.write_str("show_cart_summary"),
			Choice::ClearCart => f.write_str("clear_cart"),
			Choice::CustomQuantity => f.write_str("custom_quantity"),
			Choice::Checkout => f.write_str("purchase"),
			Choice::Confirm => f.write_str("confirm_order"),
			Choice::Category(label) => write!(f, "{}{}", CATEGORY, label),
			Choice::Product(name) => write!(f, "{}{}", PRODUCT, name),
			Choice::Quantity(n) => write!(f, "{}{}", QUANTITY, n),
			Choice::Remove(i) => write!(f, "{}{}", REMOVE, i),
			Choice::EditQuantity(i) => write!(f, "{}{}", EDIT_QUANTITY, i),
		}
	}
}
