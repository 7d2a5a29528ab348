use super::stringify::json_as_string;
use anyhow::{bail, Result};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
	Array(Vec<JsonValue>),
	Boolean(bool),
	Null,
	Num(f64),
	Object(BTreeMap<String, JsonValue>),
	Str(String),
}

impl JsonValue {
	pub fn type_as_str(&self) -> &str {
		use JsonValue::*;
		match self {
			Array(_) => "array",
			Boolean(_) => "boolean",
			Null => "null",
			Num(_) => "number",
			Object(_) => "object",
			Str(_) => "string",
		}
	}
	pub fn as_string(&self) -> Result<String> {
		json_as_string(self)
	}
	pub fn empty_object() -> JsonValue {
		JsonValue::Object(BTreeMap::new())
	}
	pub fn assign_object(&mut self, object: JsonValue) -> Result<()> {
		if let JsonValue::Object(self_tree) = self {
			if let JsonValue::Object(object_tree) = object {
				for entry in object_tree.into_iter() {
					self_tree.insert(entry.0, entry.1);
				}
				Ok(())
			} else {
				bail!("object must be a JSON object")
			}
		} else {
			bail!("self must be a JSON object")
		}
	}
}

impl From<&str> for JsonValue {
	fn from(input: &str) -> Self {
		JsonValue::Str(input.to_string())
	}
}

impl From<String> for JsonValue {
	fn from(input: String) -> Self {
		JsonValue::Str(input)
	}
}

impl From<bool> for JsonValue {
	fn from(input: bool) -> Self {
		JsonValue::Boolean(input)
	}
}

impl From<f64> for JsonValue {
	fn from(input: f64) -> Self {
		JsonValue::Num(input)
	}
}

impl From<i32> for JsonValue {
	fn from(input: i32) -> Self {
		JsonValue::Num(input as f64)
	}
}

impl<T> From<Vec<(&str, T)>> for JsonValue
where
	JsonValue: From<T>,
{
	fn from(input: Vec<(&str, T)>) -> Self {
		JsonValue::Object(BTreeMap::from_iter(
			input
				.into_iter()
				.map(|(key, value)| (key.to_string(), JsonValue::from(value))),
		))
	}
}

impl<T> From<Vec<T>> for JsonValue
where
	JsonValue: From<T>,
{
	fn from(input: Vec<T>) -> Self {
		JsonValue::Array(Vec::from_iter(input.into_iter().map(JsonValue::from)))
	}
}
