//! Menu sheet row decoding.

use barista_types::{Product, MAX_PRICE};

/// Number of columns a menu row must have to be considered.
///
/// Order: id, name, description, price, calories, proteins, fats,
/// carbohydrates, image url, category.
pub const MENU_COLUMNS: usize = 10;

/// Decodes one data row of the menu sheet.
///
/// Returns `None` for short rows and for rows without a name or a usable
/// price. Nutrition cells that are blank or not numeric are left unset.
pub fn parse_row(row: &[String]) -> Option<Product> {
	if row.len() < MENU_COLUMNS {
		return None;
	}

	let name = row[1].trim();
	if name.is_empty() {
		return None;
	}

	let Some(price) = parse_price(&row[3]) else {
		tracing::warn!(product = name, price = %row[3], "Skipping menu row with unusable price");
		return None;
	};

	let image_url = Some(row[8].trim())
		.filter(|url| !url.is_empty())
		.map(str::to_string);

	Some(Product {
		id: row[0].trim().to_string(),
		name: name.to_string(),
		description: row[2].trim().to_string(),
		price,
		calories: parse_number(&row[4]),
		proteins: parse_number(&row[5]),
		fats: parse_number(&row[6]),
		carbohydrates: parse_number(&row[7]),
		image_url,
		category: row[9].trim().to_string(),
	})
}

/// Parses a decimal cell, accepting a comma as decimal separator.
fn parse_number(cell: &str) -> Option<f64> {
	let cell = cell.trim();
	if cell.is_empty() {
		return None;
	}
	cell.replace(',', ".")
		.parse::<f64>()
		.ok()
		.filter(|v| v.is_finite())
}

/// Prices are whole currency units; fractional cells are rounded.
/// Anything above [`MAX_PRICE`] is unusable.
fn parse_price(cell: &str) -> Option<u64> {
	let cell = cell.trim();
	let price = match cell.parse::<u64>() {
		Ok(price) => price,
		Err(_) => parse_number(cell)
			.filter(|v| *v >= 0.0 && *v <= MAX_PRICE as f64)
			.map(|v| v.round() as u64)?,
	};
	(price <= MAX_PRICE).then_some(price)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(cells: &[&str]) -> Vec<String> {
		cells.iter().map(|c| c.to_string()).collect()
	}

	#[test]
	fn test_full_row() {
		let product = parse_row(&row(&[
			"7",
			" Latte ",
			"Espresso with milk",
			"250",
			"120",
			"5,5",
			"",
			"10",
			"https://img.example/latte.png",
			"Coffee",
		]))
		.unwrap();

		assert_eq!(product.id, "7");
		assert_eq!(product.name, "Latte");
		assert_eq!(product.price, 250);
		assert_eq!(product.calories, Some(120.0));
		assert_eq!(product.proteins, Some(5.5));
		assert_eq!(product.fats, None);
		assert_eq!(product.image_url.as_deref(), Some("https://img.example/latte.png"));
		assert_eq!(product.category, "Coffee");
	}

	#[test]
	fn test_short_row_ignored() {
		assert!(parse_row(&row(&["1", "Latte", "", "250", "", "", "", "", ""])).is_none());
	}

	#[test]
	fn test_unusable_price_or_name_ignored() {
		assert!(parse_row(&row(&["1", "Latte", "", "free", "", "", "", "", "", "Coffee"])).is_none());
		assert!(parse_row(&row(&["1", "Latte", "", "-5", "", "", "", "", "", "Coffee"])).is_none());
		assert!(parse_row(&row(&["1", " ", "", "250", "", "", "", "", "", "Coffee"])).is_none());
	}

	#[test]
	fn test_oversized_price_ignored() {
		for price in ["1e19", "18446744073709551615", "4294967296"] {
			assert!(
				parse_row(&row(&["1", "Gold Latte", "", price, "", "", "", "", "", "Coffee"])).is_none(),
				"accepted {}",
				price
			);
		}

		let product =
			parse_row(&row(&["1", "Gold Latte", "", "4294967295", "", "", "", "", "", "Coffee"]))
				.unwrap();
		assert_eq!(product.price, MAX_PRICE);
	}

	#[test]
	fn test_fractional_price_rounded() {
		let product =
			parse_row(&row(&["1", "Tea", "", "149,6", "", "", "", "", "", "Tea"])).unwrap();
		assert_eq!(product.price, 150);
		assert!(product.image_url.is_none());
	}
}
