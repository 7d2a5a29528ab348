use super::TileJsonValue;
use crate::json::JsonValue;
use anyhow::{Result, bail};
use std::collections::BTreeMap;

/// A map storing string keys and their associated typed JSON values.
///
/// By default, this map includes the key `"tilejson"` with a default value of
/// `"3.0.0"`, mirroring a typical `TileJSON` requirement.
#[derive(Clone, Debug, PartialEq)]
pub struct TileJsonValues(BTreeMap<String, TileJsonValue>);

impl TileJsonValues {
	/// Inserts a key-value pair into the internal `BTreeMap`,
	/// converting the [`JsonValue`] into a [`TileJsonValue`].
	///
	/// # Errors
	///
	/// Returns an error if the provided `JsonValue` cannot be converted into
	/// a `TileJsonValue` (e.g., out-of-range numeric value).
	pub fn insert(&mut self, key: &str, value: &JsonValue) -> Result<()> {
		self.0.insert(key.to_owned(), TileJsonValue::try_from(value)?);
		Ok(())
	}

	/// Returns a reference to the inner `str` value if this key exists as a string variant,
	/// otherwise returns `None`.
	///
	/// This method does **not** copy or clone data, returning a `&str` slice instead.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(|v| v.get_str())
	}

	/// Returns a cloned `String` if this key exists as a string variant,
	/// otherwise returns `None`.
	///
	/// This method *does* allocate, returning an owned `String`.
	pub fn get_string(&self, key: &str) -> Option<String> {
		self.0.get(key).and_then(|v| v.get_str().map(ToOwned::to_owned))
	}

	/// Returns a `i64` if this key exists as an integer variant, otherwise returns `None`.
	pub fn get_integer(&self, key: &str) -> Option<i64> {
		self.0.get(key).and_then(TileJsonValue::get_integer)
	}

	/// Checks if the given `key` is either absent or references a list (`Vec<String>`).
	/// Returns an error if it is present but not a list.
	pub fn check_optional_list(&self, key: &str) -> Result<()> {
		if let Some(value) = self.0.get(key)
			&& !value.is_list()
		{
			bail!("Item '{key}' is a '{}' and not a 'List'", value.get_type());
		}
		Ok(())
	}

	/// Checks if the given `key` is either absent or references a string.
	/// Returns an error if it is present but not a string.
	pub fn check_optional_string(&self, key: &str) -> Result<()> {
		if let Some(value) = self.0.get(key)
			&& !value.is_string()
		{
			bail!("Item '{key}' is '{}' and not a 'String'", value.get_type());
		}
		Ok(())
	}

	/// Checks if the given `key` is either absent or references a integer (`i64`).
	/// Returns an error if it is present but not a integer.
	pub fn check_optional_integer(&self, key: &str) -> Result<()> {
		if let Some(value) = self.0.get(key)
			&& !value.is_integer()
		{
			bail!("Item '{key}' is '{}' and not a 'Integer'", value.get_type());
		}
		Ok(())
	}

	/// Returns an iterator over `(String, JsonValue)` pairs, where
	/// each `JsonValue` is the generic form of the stored [`TileJsonValue`].
	///
	/// Use this to transform `TileJsonValues` back into a generic JSON structure.
	pub fn iter_json_values(&self) -> impl Iterator<Item = (String, JsonValue)> + '_ {
		self.0.iter().map(|(k, v)| (k.clone(), v.as_json_value()))
	}

	/// Updates or inserts a byte (`u8`) for the given `key`.
	/// The provided `update` closure receives the current value (if any)
	/// and returns the new integer value to be stored.
	pub fn update_integer<F>(&mut self, key: &str, update: F)
	where
		F: FnOnce(Option<i64>) -> i64,
	{
		let new_val = update(self.0.get(key).and_then(TileJsonValue::get_integer));
		self.0.insert(key.to_owned(), TileJsonValue::Integer(new_val));
	}

	pub fn set<T>(&mut self, key: &str, value: T)
	where
		TileJsonValue: From<T>,
	{
		self.0.insert(key.to_owned(), TileJsonValue::from(value));
	}

	/// Removes the value associated with `key`, returning `true` if it was present.
	pub fn remove(&mut self, key: &str) -> bool {
		self.0.remove(key).is_some()
	}
}

impl Default for TileJsonValues {
	/// By default, we create a map with one key: `"tilejson"`,
	/// initialized to the string `"3.0.0"`.
	fn default() -> Self {
		let mut map = BTreeMap::new();
		map.insert("tilejson".to_string(), TileJsonValue::String("3.0.0".to_owned()));
		TileJsonValues(map)
	}
}
