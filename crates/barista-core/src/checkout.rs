//! Checkout field validation.
//!
//! Lengths are counted in characters after trimming.

use crate::TurnError;
use barista_types::MAX_QUANTITY;

const MIN_NAME_CHARS: usize = 2;
const MIN_ADDRESS_CHARS: usize = 5;

/// Normalizes a Russian mobile number to `+7XXXXXXXXXX`.
///
/// Accepts `+7` followed by 10 digits, or 11 digits starting with `8` or `7`.
/// Anything else yields `None`.
pub fn normalize_phone(input: &str) -> Option<String> {
	let phone = input.trim();
	let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

	if let Some(rest) = phone.strip_prefix("+7") {
		return (rest.len() == 10 && all_digits(rest)).then(|| phone.to_string());
	}

	if phone.len() == 11 && all_digits(phone) && (phone.starts_with('8') || phone.starts_with('7')) {
		return Some(format!("+7{}", &phone[1..]));
	}

	None
}

pub fn validate_name(input: &str) -> Result<String, TurnError> {
	let name = input.trim();
	if name.chars().count() < MIN_NAME_CHARS {
		return Err(TurnError::Validation(format!(
			"Please enter your name (at least {} characters).",
			MIN_NAME_CHARS
		)));
	}
	Ok(name.to_string())
}

pub fn validate_phone(input: &str) -> Result<String, TurnError> {
	normalize_phone(input).ok_or_else(|| {
		TurnError::Validation(
			"Please enter a valid phone number, for example +79991234567 or 89991234567.".into(),
		)
	})
}

pub fn validate_address(input: &str) -> Result<String, TurnError> {
	let address = input.trim();
	if address.chars().count() < MIN_ADDRESS_CHARS {
		return Err(TurnError::Validation(format!(
			"Please enter a delivery address (at least {} characters).",
			MIN_ADDRESS_CHARS
		)));
	}
	Ok(address.to_string())
}

/// Parses a typed quantity. Only whole numbers from 1 to [`MAX_QUANTITY`] pass.
pub fn parse_quantity(input: &str) -> Result<i64, TurnError> {
	input
		.trim()
		.parse::<i64>()
		.ok()
		.filter(|q| (1..=MAX_QUANTITY).contains(q))
		.ok_or_else(|| TurnError::Validation(quantity_hint()))
}

pub(crate) fn quantity_hint() -> String {
	format!("Please enter a whole number from 1 to {}.", MAX_QUANTITY)
}
