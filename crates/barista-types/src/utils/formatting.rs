//! String formatting utilities.
//!
//! Provides money formatting for customer-facing text and masking of personal
//! data before it reaches the logs.

/// Formats an amount in the smallest currency unit with its symbol.
///
/// ```
/// assert_eq!(barista_types::format_amount(650, "₽"), "650 ₽");
/// ```
pub fn format_amount(amount: u64, symbol: &str) -> String {
	if symbol.is_empty() {
		amount.to_string()
	} else {
		format!("{} {}", amount, symbol)
	}
}

/// Masks the middle of a phone number for log output.
///
/// Keeps the first 4 and last 2 characters, e.g. `+799******22`. Short
/// inputs are fully masked.
pub fn mask_phone(phone: &str) -> String {
	let chars: Vec<char> = phone.chars().collect();
	if chars.len() <= 6 {
		return "*".repeat(chars.len());
	}

	let head: String = chars[..4].iter().collect();
	let tail: String = chars[chars.len() - 2..].iter().collect();
	format!("{}{}{}", head, "*".repeat(chars.len() - 6), tail)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_format_amount() {
		assert_eq!(format_amount(0, "₽"), "0 ₽");
		assert_eq!(format_amount(1250, ""), "1250");
	}

	#[test]
	fn test_mask_phone() {
		assert_eq!(mask_phone("+79990001122"), "+799******22");
		assert_eq!(mask_phone("123"), "***");
	}
}
