//! Configuration validation utilities.
//!
//! Pluggable implementations receive their settings as raw TOML tables. This
//! module provides a small schema language to check those tables (required
//! and optional fields, types, integer bounds, nested tables and custom
//! validators) before an implementation is constructed.

use thiserror::Error;

/// Errors that can occur during schema validation.
#[derive(Debug, Error)]
pub enum SchemaError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

impl SchemaError {
	/// Prefixes the field path with `parent`, used when reporting errors from
	/// nested tables.
	fn nested_in(self, parent: &str) -> Self {
		match self {
			SchemaError::MissingField(f) => SchemaError::MissingField(format!("{}.{}", parent, f)),
			SchemaError::InvalidValue { field, message } => SchemaError::InvalidValue {
				field: format!("{}.{}", parent, field),
				message,
			},
			SchemaError::TypeMismatch {
				field,
				expected,
				actual,
			} => SchemaError::TypeMismatch {
				field: format!("{}.{}", parent, field),
				expected,
				actual,
			},
		}
	}
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// An integer value with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// An integer or float value.
	Number,
	Boolean,
	/// An array whose elements all have the given type.
	Array(Box<FieldType>),
	/// A nested table with its own schema.
	Table(Schema),
}

/// Custom validator run after the type check succeeded.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	///
	/// The closure returns an error message when the value is unacceptable.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), SchemaError> {
		validate_field_type(&self.name, value, &self.field_type)?;

		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| SchemaError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Validation schema for a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Unknown keys are accepted. Required fields must be present; optional
	/// fields are only checked when present.
	pub fn validate(&self, config: &toml::Value) -> Result<(), SchemaError> {
		let table = config.as_table().ok_or_else(|| SchemaError::TypeMismatch {
			field: "root".to_string(),
			expected: "table".to_string(),
			actual: config.type_str().to_string(),
		})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| SchemaError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn mismatch(field_name: &str, expected: &str, value: &toml::Value) -> SchemaError {
	SchemaError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), SchemaError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch(field_name, "string", value));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(SchemaError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}
			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(SchemaError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
		FieldType::Number => {
			if !(value.is_integer() || value.is_float()) {
				return Err(mismatch(field_name, "number", value));
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch(field_name, "boolean", value));
			}
		},
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| mismatch(field_name, "array", value))?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		},
		FieldType::Table(schema) => {
			schema
				.validate(value)
				.map_err(|e| e.nested_in(field_name))?;
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
///
/// Each pluggable implementation exposes one so that its table can be checked
/// before construction.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), SchemaError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn product_schema() -> Schema {
		Schema::new(
			vec![
				Field::new("name", FieldType::String),
				Field::new(
					"price",
					FieldType::Integer {
						min: Some(0),
						max: None,
					},
				),
			],
			vec![Field::new("calories", FieldType::Number)],
		)
	}

	#[test]
	fn test_nested_array_of_tables() {
		let schema = Schema::new(
			vec![Field::new(
				"products",
				FieldType::Array(Box::new(FieldType::Table(product_schema()))),
			)],
			vec![],
		);

		let ok: toml::Value = toml::from_str(
			r#"
[[products]]
name = "Latte"
price = 250
calories = 120.5
"#,
		)
		.unwrap();
		assert!(schema.validate(&ok).is_ok());

		let missing: toml::Value = toml::from_str(
			r#"
[[products]]
name = "Latte"
"#,
		)
		.unwrap();
		let err = schema.validate(&missing).unwrap_err();
		assert_eq!(err.to_string(), "Missing required field: products[0].price");
	}

	#[test]
	fn test_integer_bounds_and_custom_validator() {
		let schema = Schema::new(
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(60),
				},
			)],
			vec![Field::new("range", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(r) if r.contains('!') => Ok(()),
					_ => Err("range must name a worksheet".to_string()),
				}
			})],
		);

		let too_big: toml::Value = toml::from_str("timeout_seconds = 90").unwrap();
		assert!(matches!(
			schema.validate(&too_big),
			Err(SchemaError::InvalidValue { .. })
		));

		let bad_range: toml::Value =
			toml::from_str("timeout_seconds = 10\nrange = \"A1:J\"").unwrap();
		let err = schema.validate(&bad_range).unwrap_err();
		assert!(err.to_string().contains("worksheet"));

		let wrong_type: toml::Value = toml::from_str("timeout_seconds = \"ten\"").unwrap();
		assert!(matches!(
			schema.validate(&wrong_type),
			Err(SchemaError::TypeMismatch { .. })
		));
	}
}
