//! Display instructions sent back to the chat front-end.

use crate::input::QUICK_PICK;
use crate::session::StateKind;
use crate::{Choice, TurnError};
use barista_crm::LeadReceipt;
use barista_types::{format_amount, Cart, CartError, ContactDetails, LineItem, Product};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Shop details used when rendering messages.
#[derive(Debug, Clone)]
pub struct Storefront {
	pub name: String,
	pub about: String,
	pub currency_symbol: String,
	pub support_contact: Option<String>,
}

impl Storefront {
	fn amount(&self, value: u64) -> String {
		format_amount(value, &self.currency_symbol)
	}
}

/// A labelled button carrying a choice token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
	pub label: String,
	pub token: String,
}

impl Button {
	pub fn new(label: impl Into<String>, choice: Choice) -> Self {
		Self {
			label: label.into(),
			token: choice.to_string(),
		}
	}
}

/// Rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Menu {
	pub rows: Vec<Vec<Button>>,
}

impl Menu {
	fn row(mut self, buttons: Vec<Button>) -> Self {
		self.rows.push(buttons);
		self
	}

	fn single(self, label: impl Into<String>, choice: Choice) -> Self {
		self.row(vec![Button::new(label, choice)])
	}
}

/// One message to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
	pub text: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub menu: Option<Menu>,
}

impl Instruction {
	pub fn text(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			image: None,
			menu: None,
		}
	}

	pub fn with_menu(mut self, menu: Menu) -> Self {
		self.menu = Some(menu);
		self
	}

	pub fn with_image(mut self, image: Option<String>) -> Self {
		self.image = image;
		self
	}
}

/// Everything produced by one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
	pub messages: Vec<Instruction>,
	pub state: StateKind,
}

fn main_menu() -> Menu {
	Menu::default()
		.single("Make an order", Choice::Menu)
		.single("About the shop", Choice::About)
}

fn back_to_menu() -> Menu {
	Menu::default().single("Back to menu", Choice::ReturnCategories)
}

pub fn welcome(shop: &Storefront) -> Instruction {
	Instruction::text(format!(
		"Welcome to {}! Browse the menu and order in a few taps.",
		shop.name
	))
	.with_menu(main_menu())
}

pub fn about(shop: &Storefront) -> Instruction {
	let text = if shop.about.trim().is_empty() {
		shop.name.clone()
	} else {
		shop.about.clone()
	};
	Instruction::text(text).with_menu(main_menu())
}

pub fn categories(categories: &BTreeSet<String>) -> Instruction {
	if categories.is_empty() {
		return Instruction::text("The menu is not available right now. Please try again later.")
			.with_menu(Menu::default().single("Cart", Choice::ShowCart));
	}

	let menu = categories
		.iter()
		.fold(Menu::default(), |menu, category| {
			menu.single(category.clone(), Choice::Category(category.clone()))
		})
		.single("Cart", Choice::ShowCart);

	Instruction::text("Choose a category:").with_menu(menu)
}

pub fn products(category: &str, names: &[String]) -> Instruction {
	if names.is_empty() {
		return Instruction::text(format!("There is nothing in {} yet.", category))
			.with_menu(back_to_menu());
	}

	let menu = names
		.iter()
		.fold(Menu::default(), |menu, name| {
			menu.single(name.clone(), Choice::Product(name.clone()))
		})
		.single("Back", Choice::ReturnCategories);

	Instruction::text(format!("{}:", category)).with_menu(menu)
}

/// Product card with the quantity quick-pick.
pub fn product_card(product: &Product, shop: &Storefront) -> Instruction {
	let mut text = product.name.clone();
	if !product.description.trim().is_empty() {
		let _ = write!(text, "\n{}", product.description.trim());
	}
	let _ = write!(text, "\nPrice: {}", shop.amount(product.price));
	if let Some(nutrition) = product.nutrition_summary() {
		let _ = write!(text, "\nNutrition: {}", nutrition);
	}
	text.push_str("\n\nHow many would you like?");

	let quick_pick = QUICK_PICK
		.collect::<Vec<i64>>()
		.chunks(3)
		.fold(Menu::default(), |menu, chunk| {
			menu.row(
				chunk
					.iter()
					.map(|n| Button::new(n.to_string(), Choice::Quantity(*n)))
					.collect(),
			)
		})
		.single("Other quantity", Choice::CustomQuantity)
		.single("Back", Choice::ReturnCategories);

	Instruction::text(text)
		.with_image(product.image_url.clone())
		.with_menu(quick_pick)
}

pub fn custom_quantity_prompt(product: &Product) -> Instruction {
	Instruction::text(format!("How many {} would you like? Type a number.", product.name))
}

fn line_text(item: &LineItem, shop: &Storefront) -> String {
	format!(
		"{}. {} x{} = {}",
		item.index + 1,
		item.product.name,
		item.quantity,
		shop.amount(item.subtotal())
	)
}

/// Short summary with the next steps.
pub fn cart_summary(cart: &Cart, shop: &Storefront) -> Instruction {
	Instruction::text(format!(
		"In your cart: {} items\nOrder total: {}\nWhat next?",
		cart.item_count(),
		shop.amount(cart.total())
	))
	.with_menu(
		Menu::default()
			.single("Add more", Choice::AddMore)
			.single("Show cart", Choice::ShowCart)
			.single("Checkout", Choice::Checkout),
	)
}

pub fn added_to_cart(item: &LineItem, cart: &Cart, shop: &Storefront) -> Vec<Instruction> {
	vec![
		Instruction::text(format!(
			"Added to cart: {} x{}",
			item.product.name, item.quantity
		)),
		cart_summary(cart, shop),
	]
}

/// Itemized cart with per-line controls.
pub fn cart_detail(cart: &Cart, shop: &Storefront) -> Instruction {
	if cart.is_empty() {
		return Instruction::text("Your cart is empty.").with_menu(back_to_menu());
	}

	let mut text = String::from("Your cart:\n");
	for item in cart.lines() {
		let _ = writeln!(text, "{}", line_text(item, shop));
	}
	let _ = write!(text, "\nTotal: {}", shop.amount(cart.total()));

	let menu = cart
		.lines()
		.fold(Menu::default(), |menu, item| {
			menu.row(vec![
				Button::new(
					format!("Remove {}", item.product.name),
					Choice::Remove(item.index),
				),
				Button::new("Change quantity", Choice::EditQuantity(item.index)),
			])
		})
		.single("Clear cart", Choice::ClearCart)
		.single("Back", Choice::ShowCartSummary);

	Instruction::text(text).with_menu(menu)
}

pub fn edit_quantity_prompt(item: &LineItem) -> Instruction {
	Instruction::text(format!(
		"Enter the new quantity for {} (now x{}):",
		item.product.name, item.quantity
	))
}

pub fn name_prompt() -> Instruction {
	Instruction::text("Please enter your name:")
		.with_menu(Menu::default().single("Back to cart", Choice::ShowCartSummary))
}

pub fn phone_prompt() -> Instruction {
	Instruction::text("Please enter your phone number in the format +7XXXXXXXXXX:")
}

pub fn address_prompt() -> Instruction {
	Instruction::text("Phone saved. Now enter the delivery address:")
}

/// Review of everything that will be submitted.
pub fn confirmation(contact: &ContactDetails, cart: &Cart, shop: &Storefront) -> Instruction {
	let mut text = format!(
		"Delivery details:\n\nName: {}\nPhone: {}\nAddress: {}\n\n",
		contact.name, contact.phone, contact.address
	);
	for item in cart.lines() {
		let _ = writeln!(text, "{}", line_text(item, shop));
	}
	let _ = write!(
		text,
		"Total: {}\n\nReady to place the order?",
		shop.amount(cart.total())
	);

	Instruction::text(text).with_menu(
		Menu::default()
			.single("Confirm order", Choice::Confirm)
			.single("Back to cart", Choice::ShowCart),
	)
}

pub fn submitted(receipt: &LeadReceipt) -> Instruction {
	Instruction::text(format!(
		"Your order has been placed! Order number: {}. We will call you to confirm delivery.",
		receipt.lead_id
	))
	.with_menu(main_menu())
}

fn contact_hint(shop: &Storefront) -> String {
	match &shop.support_contact {
		Some(contact) => format!(" or contact us at {}", contact),
		None => " or contact the shop".to_string(),
	}
}

/// User-facing message for a rejected turn.
pub fn apology(error: &TurnError, shop: &Storefront) -> Instruction {
	match error {
		TurnError::Validation(prompt) => Instruction::text(prompt.clone()),
		TurnError::NoPendingSelection => {
			Instruction::text("Please pick a product first.").with_menu(back_to_menu())
		},
		TurnError::ProductNotFound(name) => Instruction::text(format!(
			"Sorry, \"{}\" is not on the menu any more.",
			name
		))
		.with_menu(back_to_menu()),
		TurnError::Cart(CartError::IndexOutOfRange { .. }) => {
			Instruction::text("That item is no longer in your cart.")
				.with_menu(Menu::default().single("Show cart", Choice::ShowCart))
		},
		TurnError::Cart(CartError::InvalidQuantity(_)) => {
			Instruction::text(crate::checkout::quantity_hint())
		},
		TurnError::EmptyCart => Instruction::text("Your cart is empty. Add something first.")
			.with_menu(back_to_menu()),
		TurnError::NotAvailable => Instruction::text("This action is not available right now."),
		TurnError::ExpectedChoice => Instruction::text("Please use the menu buttons."),
		TurnError::SubmissionDisabled => Instruction::text(format!(
			"Orders cannot be placed online right now. Please try again later{}.",
			contact_hint(shop)
		)),
		TurnError::Submission(_) => Instruction::text(format!(
			"We could not place your order. Your details are saved, please try again later{}.",
			contact_hint(shop)
		))
		.with_menu(
			Menu::default()
				.single("Try again", Choice::Confirm)
				.single("Back to cart", Choice::ShowCart),
		),
	}
}
