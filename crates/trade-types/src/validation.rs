//! Configuration validation utilities.
//!
//! Backend implementations receive their settings as raw TOML tables. This
//! module lets each backend describe the fields it understands so that a bad
//! configuration is rejected at startup with a precise message instead of
//! surfacing later as a runtime failure.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has a value outside its allowed range.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong TOML type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// An unrecognized key was supplied.
	#[error("Unknown field: {0}")]
	UnknownField(String),
}

/// The type of a configuration field.
#[derive(Debug, Clone)]
pub enum FieldType {
	String,
	/// An integer with optional inclusive bounds.
	Integer {
		min: Option<i64>,
		max: Option<i64>,
	},
	Boolean,
}

/// A named field in a configuration schema.
#[derive(Debug, Clone)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
		}
	}
}

/// Required and optional fields accepted by one backend table.
///
/// Keys outside both lists are rejected so that typos do not silently fall
/// back to defaults.
#[derive(Debug, Clone)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			check_field(&field.name, value, &field.field_type)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(&field.name, value, &field.field_type)?;
			}
		}

		for key in table.keys() {
			let known = self
				.required
				.iter()
				.chain(self.optional.iter())
				.any(|f| &f.name == key);
			if !known {
				return Err(ValidationError::UnknownField(key.clone()));
			}
		}

		Ok(())
	}
}

fn check_field(
	field_name: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	let mismatch = |expected: &str| ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch("string"));
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch("boolean"));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(|| mismatch("integer"))?;
			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}
			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_schema() -> Schema {
		Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String),
				Field::new(
					"event_capacity",
					FieldType::Integer {
						min: Some(0),
						max: None,
					},
				),
			],
		)
	}

	#[test]
	fn test_accepts_known_fields() {
		let config: toml::Value = toml::from_str("storage_path = \"./data\"\nevent_capacity = 60").unwrap();
		assert!(sample_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_rejects_wrong_type() {
		let config: toml::Value = toml::from_str("storage_path = 5").unwrap();
		let err = sample_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::TypeMismatch { .. }));
	}

	#[test]
	fn test_rejects_out_of_range() {
		let config: toml::Value = toml::from_str("event_capacity = -1").unwrap();
		let err = sample_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("less than minimum"));
	}

	#[test]
	fn test_rejects_unknown_and_missing() {
		let config: toml::Value = toml::from_str("storage_pth = \"./data\"").unwrap();
		assert!(matches!(
			sample_schema().validate(&config),
			Err(ValidationError::UnknownField(_))
		));

		let schema = Schema::new(vec![Field::new("storage_path", FieldType::String)], vec![]);
		let empty: toml::Value = toml::from_str("").unwrap();
		assert!(matches!(
			schema.validate(&empty),
			Err(ValidationError::MissingField(_))
		));
	}
}
