//! Decoded scope state.
//!
//! A [`StateMapping`] keeps the full decoded payload so that fields the prediction DSL never touches
//! (including nested structures) survive re-encoding, while every field the DSL reads or writes goes
//! through the closed [`Value`] variant.

use core::fmt::{self, Display, Formatter};
use serde_json::{Map, Number, Value as Json};

/// A scalar state field as seen by the prediction DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Boolean(bool),
	Integer(i64),
	Float(f64),
	String(String),
}

impl Value {
	/// [`None`] for `null`, arrays and objects.
	#[must_use]
	pub fn from_json(json: &Json) -> Option<Self> {
		match json {
			Json::Bool(boolean) => Some(Self::Boolean(*boolean)),
			Json::Number(number) => Some(match number.as_i64() {
				Some(integer) => Self::Integer(integer),
				None => Self::Float(number.as_f64()?),
			}),
			Json::String(string) => Some(Self::String(string.clone())),
			Json::Null | Json::Array(_) | Json::Object(_) => None,
		}
	}

	/// Non-finite floats have no JSON representation and become `null`.
	#[must_use]
	pub fn to_json(&self) -> Json {
		match self {
			Value::Boolean(boolean) => Json::Bool(*boolean),
			Value::Integer(integer) => Json::Number((*integer).into()),
			Value::Float(float) => Number::from_f64(*float).map_or(Json::Null, Json::Number),
			Value::String(string) => Json::String(string.clone()),
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Boolean(boolean) => boolean.fmt(f),
			Value::Integer(integer) => integer.fmt(f),
			Value::Float(float) => float.fmt(f),
			Value::String(string) => f.write_str(string),
		}
	}
}

/// Logical truthiness of a raw field, absent fields being falsy.
fn truthy(json: Option<&Json>) -> bool {
	match json {
		None | Some(Json::Null) => false,
		Some(Json::Bool(boolean)) => *boolean,
		Some(Json::Number(number)) => number.as_f64().map_or(false, |number| number != 0.0 && !number.is_nan()),
		Some(Json::String(string)) => !string.is_empty(),
		Some(Json::Array(_) | Json::Object(_)) => true,
	}
}

/// Field name → value mapping decoded from a scope payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateMapping(Map<String, Json>);

impl StateMapping {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a payload, which must be a JSON object.
	///
	/// # Errors
	///
	/// Iff `payload` is not syntactically valid JSON or not an object.
	pub fn from_payload(payload: &str) -> Result<Self, String> {
		match serde_json::from_str(payload) {
			Ok(Json::Object(map)) => Ok(Self(map)),
			Ok(other) => Err(format!("expected an object payload but found {}", kind(&other))),
			Err(error) => Err(error.to_string()),
		}
	}

	/// Compact JSON, field order preserved.
	#[must_use]
	pub fn to_payload(&self) -> String {
		Json::Object(self.0.clone()).to_string()
	}

	#[must_use]
	pub fn get(&self, field: &str) -> Option<Value> {
		self.0.get(field).and_then(Value::from_json)
	}

	pub fn set(&mut self, field: &str, value: &Value) {
		self.0.insert(field.to_owned(), value.to_json());
	}

	/// Replaces the field with the logical negation of its current value.
	pub fn toggle(&mut self, field: &str) {
		let negated = !truthy(self.0.get(field));
		self.set(field, &Value::Boolean(negated));
	}

	/// Adds `delta` to the field, which counts as `0` when absent or not numeric.
	///
	/// Integer overflow continues in floating point.
	pub fn offset(&mut self, field: &str, delta: i64) {
		#[allow(clippy::cast_precision_loss)]
		let value = match self.get(field) {
			Some(Value::Integer(current)) => current.checked_add(delta).map_or_else(|| Value::Float(current as f64 + delta as f64), Value::Integer),
			Some(Value::Float(current)) => Value::Float(current + delta as f64),
			_ => Value::Integer(delta),
		};
		self.set(field, &value);
	}

	/// Adds `delta` to the field in floating point, the field counting as `0` when absent or not numeric.
	pub fn offset_float(&mut self, field: &str, delta: f64) {
		#[allow(clippy::cast_precision_loss)]
		let current = match self.get(field) {
			Some(Value::Integer(current)) => current as f64,
			Some(Value::Float(current)) => current,
			_ => 0.0,
		};
		self.set(field, &Value::Float(current + delta));
	}

	/// The text a bound element shows for `field`, if the field exists.
	#[must_use]
	pub fn display(&self, field: &str) -> Option<String> {
		self.0.get(field).map(|json| match Value::from_json(json) {
			Some(value) => value.to_string(),
			None if json.is_null() => String::new(),
			None => json.to_string(),
		})
	}

}

fn kind(json: &Json) -> &'static str {
	match json {
		Json::Null => "null",
		Json::Bool(_) => "a boolean",
		Json::Number(_) => "a number",
		Json::String(_) => "a string",
		Json::Array(_) => "an array",
		Json::Object(_) => "an object",
	}
}
