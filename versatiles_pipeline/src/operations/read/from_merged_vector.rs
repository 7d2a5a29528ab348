//! # from_merged_vector operation
//!
//! Blends *multiple* **vector tile** sources by **concatenating layers** that
//! share the same name.  
//!  
//! * Sources are evaluated **in order** – later sources append their features
//!   after earlier ones within a layer.  
//! * All sources must provide Mapbox Vector Tiles (`*.mvt`).  
//! * The output is *always* a vector pyramid; raster data are not supported.
//!
//! The file contains:
//! 1. [`Args`] – the VPL/CLI parameters,  
//! 2. [`Operation`] – the runtime implementation,  
//! 3. Unit tests that verify layer merging, tile‐JSON updates, and
//!    pyramid handling.

use crate::{
	PipelineFactory,
	helpers::pack_vector_tile_stream,
	operations::read::traits::ReadOperationTrait,
	traits::*,
	vpl::{VPLNode, VPLPipeline},
};
use anyhow::{Result, bail, ensure};
use async_trait::async_trait;
use futures::{
	StreamExt,
	future::{BoxFuture, join_all},
	stream,
};
use imageproc::image::DynamicImage;
use std::collections::HashMap;
use versatiles_core::{tilejson::TileJSON, *};
use versatiles_geometry::vector_tile::{VectorTile, VectorTileLayer};

#[derive(versatiles_derive::VPLDecode, Clone, Debug)]
/// Merges multiple vector tile sources.
/// Each resulting tile will contain all the features and properties from all the sources.
struct Args {
	/// All tile sources must provide vector tiles.
	sources: Vec<VPLPipeline>,
}

/// [`OperationTrait`] implementation that merges vector tiles “on the fly.”
///
/// * Keeps only metadata in memory; actual tile data stream straight through.  
/// * Performs no disk I/O itself – it relies entirely on the child pipelines.
#[derive(Debug)]
struct Operation {
	parameters: TilesReaderParameters,
	sources: Vec<Box<dyn OperationTrait>>,
	tilejson: TileJSON,
	traversal: Traversal,
}

/// Combine several `VectorTile`s by merging layers with identical names.
///
/// If multiple sources provide a layer called `"roads"`, all road features
/// end up in the same output layer; layers unique to a source are copied as‐is.
fn merge_vector_tiles(tiles: Vec<VectorTile>) -> Result<VectorTile> {
	let mut layers = HashMap::<String, VectorTileLayer>::new();
	for tile in tiles.into_iter() {
		for new_layer in tile.layers {
			if let Some(layer) = layers.get_mut(&new_layer.name) {
				layer.add_from_layer(new_layer)?;
			} else {
				layers.insert(new_layer.name.clone(), new_layer);
			}
		}
	}
	Ok(VectorTile::new(layers.into_values().collect()))
}

impl ReadOperationTrait for Operation {
	fn build(
		vpl_node: VPLNode,
		factory: &PipelineFactory,
	) -> BoxFuture<'_, Result<Box<dyn OperationTrait>, anyhow::Error>>
	where
		Self: Sized + OperationTrait,
	{
		Box::pin(async move {
			let args = Args::from_vpl_node(&vpl_node)?;
			let sources = join_all(args.sources.into_iter().map(|c| factory.build_pipeline(c)))
				.await
				.into_iter()
				.collect::<Result<Vec<_>>>()?;

			ensure!(sources.len() > 1, "must have at least two sources");

			let mut tilejson = TileJSON::default();
			let first_parameters = sources.first().unwrap().parameters();
			let tile_format = first_parameters.tile_format;
			let tile_compression = first_parameters.tile_compression;
			let mut pyramid = TileBBoxPyramid::new_empty();
			let mut traversal = Traversal::new_any();

			for source in sources.iter() {
				tilejson.merge(source.tilejson())?;

				traversal.intersect(source.traversal())?;

				let parameters = source.parameters();
				pyramid.include_bbox_pyramid(&parameters.bbox_pyramid);

				ensure!(
					parameters.tile_format.get_type() == TileType::Vector,
					"all sources must be vector tiles"
				);
			}

			let parameters = TilesReaderParameters::new(tile_format, tile_compression, pyramid);
			tilejson.update_from_reader_parameters(&parameters);

			Ok(Box::new(Self {
				tilejson,
				parameters,
				sources,
				traversal,
			}) as Box<dyn OperationTrait>)
		})
	}
}

#[async_trait]
impl OperationTrait for Operation {
	/// Reader parameters (format, compression, pyramid) for the merged result.
	fn parameters(&self) -> &TilesReaderParameters {
		&self.parameters
	}

	/// `TileJSON` after combining metadata from every source.
	fn tilejson(&self) -> &TileJSON {
		&self.tilejson
	}

	fn traversal(&self) -> &Traversal {
		&self.traversal
	}

	/// Stream packed vector tiles intersecting `bbox`.
	async fn get_tile_stream(&self, bbox: TileBBox) -> Result<TileStream> {
		pack_vector_tile_stream(self.get_vector_stream(bbox).await, &self.parameters)
	}

	/// Always errors – raster output is not supported.
	async fn get_image_stream(&self, _bbox: TileBBox) -> Result<TileStream<DynamicImage>> {
		bail!("this operation does not support image data");
	}

	/// Stream merged vector tiles for every coordinate in `bbox`.
	async fn get_vector_stream(&self, bbox: TileBBox) -> Result<TileStream<VectorTile>> {
		let bboxes: Vec<TileBBox> = bbox.clone().iter_bbox_grid(32).collect();

		Ok(TileStream::from_streams(
			stream::iter(bboxes).map(move |bbox| async move {
				let mut tiles = TileBBoxContainer::<Vec<VectorTile>>::new_default(bbox);

				for source in self.sources.iter() {
					source
						.get_vector_stream(bbox)
						.await
						.unwrap()
						.for_each_sync(|(coord, tile)| {
							tiles.get_mut(&coord).unwrap().push(tile);
						})
						.await;
				}

				TileStream::from_vec(
					tiles
						.into_iter()
						.filter_map(|(c, v)| {
							if v.is_empty() {
								None
							} else {
								Some((c, merge_vector_tiles(v).unwrap()))
							}
						})
						.collect(),
				)
			}),
			1,
		))
	}
}

pub struct Factory {}

impl OperationFactoryTrait for Factory {
	fn get_docs(&self) -> String {
		Args::get_docs()
	}
	fn get_tag_name(&self) -> &str {
		"from_merged_vector"
	}
}

#[async_trait]
impl ReadOperationFactoryTrait for Factory {
	async fn build<'a>(&self, vpl_node: VPLNode, factory: &'a PipelineFactory) -> Result<Box<dyn OperationTrait>> {
		Operation::build(vpl_node, factory).await
	}
}
