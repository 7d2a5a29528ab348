use crate::{
	container::{
		composer::{Factory, OperationTrait, ReadableOperationTrait},
		get_reader, TilesReader, TilesReaderParameters,
	},
	types::TileStream,
	utils::YamlWrapper,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{channel::mpsc::channel, lock::Mutex, SinkExt};
use std::{fmt::Debug, sync::Arc};
use tokio::task::JoinHandle;
use versatiles_core::types::{Blob, TileBBox, TileCoord3};
use versatiles_derive::YamlParser;

#[derive(YamlParser)]
/// Reads a tile source, such as a VersaTiles container.
struct Arguments {
	/// The filename of the tile container, e.g., "world.versatiles".
	filename: String,
}

/// The `ReadOperation` struct represents an operation that replaces properties in PBF tiles
/// based on a mapping provided in a CSV file.
pub struct Operation {
	args: Arguments,
	parameters: TilesReaderParameters,
	reader: Arc<Mutex<Box<dyn TilesReader>>>,
}

impl Operation {
	async fn read_stream(&self, bbox: TileBBox) -> TileStream {
		let (mut tx, rx) = channel::<(TileCoord3, Blob)>(64);
		let reader = self.reader.clone();

		let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
			let mut reader = reader.lock().await;
			let mut tile_stream = reader.get_bbox_tile_stream(bbox).await;

			while let Some(entry) = tile_stream.next().await {
				if tx.send(entry).await.is_err() {
					// If the receiver is dropped, break the loop
					break;
				}
			}
			Ok(())
		});

		// Optionally, you can handle the JoinHandle to ensure the task completes correctly
		tokio::spawn(async {
			if let Err(e) = handle.await {
				eprintln!("Task failed: {:?}", e);
			}
		});

		TileStream::from_stream(Box::pin(rx))
	}
}

#[async_trait]
impl OperationTrait for Operation {
	fn get_docs() -> String {
		Arguments::generate_docs()
	}

	fn get_parameters(&self) -> &TilesReaderParameters {
		&self.parameters
	}

	fn get_id() -> &'static str {
		"read"
	}

	async fn get_meta(&self) -> Result<Option<Blob>> {
		self.reader.lock().await.get_meta()
	}

	async fn get_tile_data(&self, coord: &TileCoord3) -> Result<Option<Blob>> {
		self.reader.lock().await.get_tile_data(coord).await
	}

	async fn get_bbox_tile_stream(&self, bbox: TileBBox) -> TileStream {
		self.read_stream(bbox).await
	}
}

#[async_trait]
impl ReadableOperationTrait for Operation {
	/// Creates a new `ReadOperation` from the provided YAML configuration.
	///
	/// # Arguments
	///
	/// * `yaml` - A reference to a `YamlWrapper` containing the configuration.
	///
	/// # Returns
	///
	/// * `Result<ReadOperation>` - The constructed operation or an error if the configuration is invalid.
	async fn new(yaml: YamlWrapper, factory: &Factory) -> Result<Self>
	where
		Self: Sized,
	{
		let args = Arguments::from_yaml(&yaml.hash_get_value("arg")?)?;

		let reader = get_reader(&factory.get_absolute_str(&args.filename)).await?;
		let parameters = reader.get_parameters().clone();

		Ok(Operation {
			args,
			parameters,
			reader: Arc::new(Mutex::new(reader)),
		})
	}
}

impl Debug for Operation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReadOperation")
			.field("filename", &self.args.filename)
			.finish()
	}
}
