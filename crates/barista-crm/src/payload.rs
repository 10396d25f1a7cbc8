//! Request bodies for the CRM lead methods.

use crate::{CrmError, LeadId};
use barista_types::{format_amount, Lead, LineItem};
use serde_json::{json, Map, Value};
use std::fmt::Write;

/// Shop-level values stamped on every lead.
#[derive(Debug, Clone)]
pub struct LeadSettings {
	pub source_id: String,
	pub currency: String,
	pub currency_symbol: String,
	pub measure_code: u32,
	pub measure_name: String,
}

impl Default for LeadSettings {
	fn default() -> Self {
		Self {
			source_id: "TELEGRAM".to_string(),
			currency: "RUB".to_string(),
			currency_symbol: "₽".to_string(),
			measure_code: 796,
			measure_name: "pcs".to_string(),
		}
	}
}

/// Lead title, e.g. `Order from Ann (650 ₽)`.
pub fn lead_title(lead: &Lead, settings: &LeadSettings) -> String {
	format!(
		"Order from {} ({})",
		lead.contact().name,
		format_amount(lead.total(), &settings.currency_symbol)
	)
}

fn item_line(item: &LineItem, symbol: &str) -> String {
	format!(
		"• {} x{} = {}",
		item.product.name,
		item.quantity,
		format_amount(item.subtotal(), symbol)
	)
}

/// Long-form COMMENTS block sent with the new lead.
pub fn lead_comments(lead: &Lead, settings: &LeadSettings) -> String {
	let symbol = &settings.currency_symbol;
	let contact = lead.contact();
	let mut out = String::new();

	let _ = writeln!(out, "Order time: {}", lead.created_at().format("%Y-%m-%d %H:%M:%S UTC"));
	let _ = writeln!(out, "Conversation: {}", lead.conversation_id());
	if let Some(username) = lead.username() {
		let _ = writeln!(out, "Username: @{}", username.trim_start_matches('@'));
	}
	let _ = writeln!(out, "Name: {}", contact.name);
	let _ = writeln!(out, "Phone: {}", contact.phone);
	let _ = writeln!(out, "Address: {}", contact.address);
	out.push_str("\nOrder:\n");
	for item in lead.items() {
		let _ = writeln!(out, "{}", item_line(item, symbol));
	}
	let _ = write!(out, "\nTotal: {}", format_amount(lead.total(), symbol));

	out
}

/// Itemized breakdown appended to COMMENTS when structured rows could not be
/// attached. Nutrition is included for products that have it.
pub fn itemized_breakdown(lead: &Lead, settings: &LeadSettings) -> String {
	let symbol = &settings.currency_symbol;
	let mut out = String::from("Order lines:\n");

	for item in lead.items() {
		let _ = write!(
			out,
			"{}. {} x{} @ {} = {}",
			item.index + 1,
			item.product.name,
			item.quantity,
			format_amount(item.product.price, symbol),
			format_amount(item.subtotal(), symbol)
		);
		if let Some(nutrition) = item.product.nutrition_summary() {
			let _ = write!(out, " ({})", nutrition);
		}
		out.push('\n');
	}
	let _ = write!(
		out,
		"Items: {}, grand total: {}",
		lead.item_count(),
		format_amount(lead.total(), symbol)
	);

	out
}

/// Body for `crm.lead.add`.
pub fn lead_add(lead: &Lead, settings: &LeadSettings) -> Value {
	let contact = lead.contact();
	json!({
		"fields": {
			"TITLE": lead_title(lead, settings),
			"NAME": contact.name,
			"PHONE": [{ "VALUE": contact.phone, "VALUE_TYPE": "WORK" }],
			"COMMENTS": lead_comments(lead, settings),
			"SOURCE_ID": settings.source_id,
			"CURRENCY_ID": settings.currency,
			"OPPORTUNITY": lead.total(),
		}
	})
}

/// One product row per line item.
pub fn product_rows(lead: &Lead, settings: &LeadSettings) -> Vec<Value> {
	lead.items()
		.iter()
		.map(|item| {
			json!({
				"PRODUCT_NAME": item.product.name,
				"PRICE": item.product.price,
				"QUANTITY": item.quantity,
				"CUSTOMIZED": "Y",
				"MEASURE_CODE": settings.measure_code,
				"MEASURE_NAME": settings.measure_name,
			})
		})
		.collect()
}

/// Body for `crm.lead.productrows.set`.
pub fn productrows_set(lead_id: LeadId, lead: &Lead, settings: &LeadSettings) -> Value {
	json!({
		"id": lead_id.0,
		"rows": product_rows(lead, settings),
	})
}

/// Body for `batch` with one `crm.lead.productrows.set` command per line.
///
/// `productrows.set` replaces the whole row set, so command `item_<i>` carries
/// rows `0..=i`. Commands run in order and the last one leaves every row in
/// place even if an earlier one failed.
pub fn batch_productrows(
	lead_id: LeadId,
	lead: &Lead,
	settings: &LeadSettings,
) -> Result<Value, CrmError> {
	let mut commands = Map::new();

	for last in 0..lead.items().len() {
		let mut pairs = vec![("id".to_string(), lead_id.to_string())];
		for (row, item) in lead.items()[..=last].iter().enumerate() {
			pairs.extend([
				(format!("rows[{}][PRODUCT_NAME]", row), item.product.name.clone()),
				(format!("rows[{}][PRICE]", row), item.product.price.to_string()),
				(format!("rows[{}][QUANTITY]", row), item.quantity.to_string()),
				(format!("rows[{}][CUSTOMIZED]", row), "Y".to_string()),
				(format!("rows[{}][MEASURE_CODE]", row), settings.measure_code.to_string()),
				(format!("rows[{}][MEASURE_NAME]", row), settings.measure_name.clone()),
			]);
		}

		let command = format!("crm.lead.productrows.set?{}", encode_query(&pairs)?);
		commands.insert(format!("item_{}", last), Value::String(command));
	}

	Ok(json!({ "halt": 0, "cmd": commands }))
}

/// Form-encodes `pairs` the same way a query string is encoded.
fn encode_query(pairs: &[(String, String)]) -> Result<String, CrmError> {
	let mut url = reqwest::Url::parse("http://localhost/")
		.map_err(|e| CrmError::Configuration(format!("Query encoder: {}", e)))?;
	url.query_pairs_mut().extend_pairs(pairs);
	Ok(url.query().unwrap_or_default().to_string())
}

/// Body for `crm.lead.get`.
pub fn lead_get(lead_id: LeadId) -> Value {
	json!({ "id": lead_id.0 })
}

/// Body for `crm.lead.update` replacing COMMENTS.
pub fn lead_update_comments(lead_id: LeadId, comments: &str) -> Value {
	json!({
		"id": lead_id.0,
		"fields": { "COMMENTS": comments },
	})
}
