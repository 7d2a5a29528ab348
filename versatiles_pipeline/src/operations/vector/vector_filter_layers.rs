use crate::{
	PipelineFactory,
	operations::vector::traits::{RunnerTrait, build_transform},
	traits::{OperationFactoryTrait, OperationTrait, TransformOperationFactoryTrait},
	vpl::VPLNode,
};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use versatiles_core::tilejson::TileJSON;
use versatiles_geometry::vector_tile::VectorTile;

#[derive(versatiles_derive::VPLDecode, Clone, Debug)]
/// Filters vector tile layers based on a comma-separated list of layer names.
struct Args {
	/// Comma‑separated list of layer names that should be removed from the tiles, e.g.: filter="pois,ocean".
	filter: String,

	/// If set, inverts the filter logic (i.e., keeps only layers matching the filter).
	invert: Option<bool>,
}

#[derive(Debug)]
struct Runner {
	layer_set: HashSet<String>,
	invert: bool,
}

impl Runner {
	pub fn from_args(args: Args) -> Self {
		let layer_set: HashSet<String> = args.filter.split(',').map(|s| s.trim().to_string()).collect();

		Self {
			layer_set,
			invert: args.invert.unwrap_or(false),
		}
	}
}

impl RunnerTrait for Runner {
	fn run(&self, mut tile: VectorTile) -> Result<VectorTile> {
		tile
			.layers
			.retain(|layer| self.layer_set.contains(&layer.name) == self.invert);

		Ok(tile)
	}
	fn update_tilejson(&self, tilejson: &mut TileJSON) {
		tilejson
			.vector_layers
			.0
			.retain(|name, _| self.layer_set.contains(name) == self.invert);
	}
}

pub struct Factory {}

impl OperationFactoryTrait for Factory {
	fn get_docs(&self) -> String {
		Args::get_docs()
	}
	fn get_tag_name(&self) -> &str {
		"vector_filter_layers"
	}
}

#[async_trait]
impl TransformOperationFactoryTrait for Factory {
	async fn build<'a>(
		&self,
		vpl_node: VPLNode,
		source: Box<dyn OperationTrait>,
		_factory: &'a PipelineFactory,
	) -> Result<Box<dyn OperationTrait>> {
		let args = Args::from_vpl_node(&vpl_node)?;

		build_transform::<Runner>(source, Runner::from_args(args)).await
	}
}
