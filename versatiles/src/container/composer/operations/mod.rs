mod pbf_update_properties;

use crate::{types::Blob, utils::YamlWrapper};
use anyhow::{bail, Context, Result};
use std::fmt::Debug;

/// The `TileComposerOperation` trait defines the interface for operations that can be applied
/// to tiles in the Composer module.
pub trait TileComposerOperation: Debug + Send + Sync {
	/// Creates a new instance of the operation from the provided YAML configuration.
	///
	/// # Arguments
	///
	/// * `def` - A reference to a `YamlWrapper` containing the configuration.
	///
	/// # Returns
	///
	/// * `Result<Self>` - The constructed operation or an error if the configuration is invalid.
	fn new(def: &YamlWrapper) -> Result<Self>
	where
		Self: Sized;

	/// Runs the operation on the provided blob.
	///
	/// # Arguments
	///
	/// * `blob` - A reference to the `Blob` to be processed.
	///
	/// # Returns
	///
	/// * `Result<Option<Blob>>` - The processed blob or an error if processing failed.
	fn run(&self, blob: &Blob) -> Result<Option<Blob>>;
}

/// Creates a new tile composer operation based on the provided YAML configuration.
///
/// # Arguments
///
/// * `def` - A reference to a `YamlWrapper` containing the configuration.
///
/// # Returns
///
/// * `Result<Box<dyn TileComposerOperation>>` - The constructed operation or an error if the configuration is invalid.
pub fn new_tile_composer_operation(def: &YamlWrapper) -> Result<Box<dyn TileComposerOperation>> {
	let action = def.hash_get_str("action").context("while parsing action")?;

	match action {
		"pbf_replace_properties" => Ok(Box::new(
			pbf_update_properties::PBFReplacePropertiesOperation::new(def)
				.with_context(|| format!("Failed parsing action '{action}'"))?,
		)),
		_ => bail!("operation '{action}' is unknown"),
	}
}
