//! Cart model.
//!
//! A cart is an ordered list of line items in insertion order. Identical
//! products are never merged: adding the same product twice yields two lines.
//! Line indices are display positions and are renumbered after every removal.
//! Totals are computed on every read and never cached. They saturate at
//! `u64::MAX` instead of wrapping.

use crate::Product;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of units a single line may hold.
pub const MAX_QUANTITY: i64 = 999;

/// Errors that can occur when mutating a cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
	/// The referenced line does not exist (any more).
	#[error("Line {index} is out of range (cart has {len} lines)")]
	IndexOutOfRange { index: usize, len: usize },
	/// The quantity is not a positive integer up to [`MAX_QUANTITY`].
	#[error("Quantity must be between 1 and {MAX_QUANTITY}, got {0}")]
	InvalidQuantity(i64),
}

/// One product-plus-quantity entry in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
	/// Current zero-based position of the line in the cart.
	pub index: usize,
	/// Snapshot of the selected product.
	pub product: Product,
	/// Number of units, always at least 1.
	pub quantity: u32,
}

impl LineItem {
	/// Unit price multiplied by quantity.
	pub fn subtotal(&self) -> u64 {
		self.product.price.saturating_mul(u64::from(self.quantity))
	}
}

/// Ordered collection of line items owned by one order session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
	items: Vec<LineItem>,
}

/// Converts a caller-supplied quantity into a valid unit count.
fn checked_quantity(quantity: i64) -> Result<u32, CartError> {
	if !(1..=MAX_QUANTITY).contains(&quantity) {
		return Err(CartError::InvalidQuantity(quantity));
	}
	u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity(quantity))
}

/// Saturating sum of line subtotals.
pub(crate) fn sum_subtotals<'a>(items: impl Iterator<Item = &'a LineItem>) -> u64 {
	items.fold(0, |total, item| total.saturating_add(item.subtotal()))
}

impl Cart {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a new line for `product`.
	pub fn add(&mut self, product: Product, quantity: i64) -> Result<&LineItem, CartError> {
		let quantity = checked_quantity(quantity)?;
		let index = self.items.len();
		self.items.push(LineItem {
			index,
			product,
			quantity,
		});
		Ok(&self.items[index])
	}

	/// Removes the line at `index` and returns it.
	///
	/// Lines after the removed one shift down by one position.
	pub fn remove(&mut self, index: usize) -> Result<LineItem, CartError> {
		if index >= self.items.len() {
			return Err(CartError::IndexOutOfRange {
				index,
				len: self.items.len(),
			});
		}

		let removed = self.items.remove(index);
		for (position, item) in self.items.iter_mut().enumerate().skip(index) {
			item.index = position;
		}
		Ok(removed)
	}

	/// Replaces the quantity of the line at `index`.
	pub fn set_quantity(&mut self, index: usize, quantity: i64) -> Result<&LineItem, CartError> {
		let quantity = checked_quantity(quantity)?;
		let len = self.items.len();
		let item = self
			.items
			.get_mut(index)
			.ok_or(CartError::IndexOutOfRange { index, len })?;
		item.quantity = quantity;
		Ok(item)
	}

	/// Removes every line.
	pub fn clear(&mut self) {
		self.items.clear();
	}

	/// Sum of unit price times quantity over all lines.
	pub fn total(&self) -> u64 {
		sum_subtotals(self.items.iter())
	}

	/// Sum of quantities over all lines.
	pub fn item_count(&self) -> u64 {
		self.items.iter().map(|item| u64::from(item.quantity)).sum()
	}

	/// Number of lines.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Returns the line at `index`, if any.
	pub fn get(&self, index: usize) -> Option<&LineItem> {
		self.items.get(index)
	}

	/// Iterates over the lines in cart order.
	pub fn lines(&self) -> impl Iterator<Item = &LineItem> {
		self.items.iter()
	}

	/// Owned copy of the current lines.
	pub fn snapshot(&self) -> Vec<LineItem> {
		self.items.clone()
	}
}
