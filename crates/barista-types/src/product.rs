//! Catalog product types.

use serde::{Deserialize, Serialize};

/// Highest unit price a catalog may publish.
pub const MAX_PRICE: u64 = u32::MAX as u64;

/// A menu product as published by the catalog.
///
/// Products are immutable snapshots: the cart stores its own copy, so a later
/// menu edit never changes what a customer already picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	/// Catalog identifier of the product.
	pub id: String,
	/// Display name, also used as the lookup key when a product is selected.
	pub name: String,
	/// Free-form description shown on the product card.
	#[serde(default)]
	pub description: String,
	/// Unit price in the smallest currency unit.
	pub price: u64,
	/// Energy value in kcal.
	#[serde(default)]
	pub calories: Option<f64>,
	/// Proteins in grams.
	#[serde(default)]
	pub proteins: Option<f64>,
	/// Fats in grams.
	#[serde(default)]
	pub fats: Option<f64>,
	/// Carbohydrates in grams.
	#[serde(default)]
	pub carbohydrates: Option<f64>,
	/// Image reference (URL) for the product card.
	#[serde(default)]
	pub image_url: Option<String>,
	/// Category label the product is listed under.
	pub category: String,
}

impl Product {
	/// Returns true if at least one nutritional value is known.
	pub fn has_nutrition(&self) -> bool {
		self.calories.is_some()
			|| self.proteins.is_some()
			|| self.fats.is_some()
			|| self.carbohydrates.is_some()
	}

	/// Formats the known nutritional values, e.g. `kcal 120, P 5, F 3, C 10`.
	///
	/// Returns `None` when no value is present.
	pub fn nutrition_summary(&self) -> Option<String> {
		let parts: Vec<String> = [
			("kcal", self.calories),
			("P", self.proteins),
			("F", self.fats),
			("C", self.carbohydrates),
		]
		.into_iter()
		.filter_map(|(label, value)| value.map(|v| format!("{} {}", label, v)))
		.collect();

		if parts.is_empty() {
			None
		} else {
			Some(parts.join(", "))
		}
	}
}

#[cfg(test)]
pub(crate) fn sample(name: &str, price: u64) -> Product {
	Product {
		id: name.to_lowercase(),
		name: name.to_string(),
		description: String::new(),
		price,
		calories: None,
		proteins: None,
		fats: None,
		carbohydrates: None,
		image_url: None,
		category: "Coffee".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_nutrition_summary_skips_missing_values() {
		let mut latte = sample("Latte", 250);
		assert!(!latte.has_nutrition());
		assert_eq!(latte.nutrition_summary(), None);

		latte.calories = Some(120.0);
		latte.carbohydrates = Some(10.5);
		assert!(latte.has_nutrition());
		assert_eq!(latte.nutrition_summary().unwrap(), "kcal 120, C 10.5");
	}

	#[test]
	fn test_deserialize_from_toml_with_defaults() {
		let product: Product = toml::from_str(
			r#"
id = "1"
name = "Croissant"
price = 150
category = "Bakery"
"#,
		)
		.unwrap();

		assert_eq!(product.price, 150);
		assert!(product.description.is_empty());
		assert!(product.image_url.is_none());
	}
}
