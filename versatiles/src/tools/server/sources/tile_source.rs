use super::{super::utils::Url, SourceResponse};
use anyhow::{Result, ensure};
use std::{fmt::Debug, sync::Arc};
use tokio::sync::Mutex;
use versatiles_core::{Blob, TileCompression, TileCoord3, TilesReaderTrait, utils::TargetCompression};

// TileSource struct definition
#[derive(Clone)]
pub struct TileSource {
	pub prefix: Url,
	pub id: String,
	reader: Arc<Mutex<Box<dyn TilesReaderTrait>>>,
	pub tile_mime: String,
	pub compression: TileCompression,
}

impl TileSource {
	// Constructor function for creating a TileSource instance
	pub fn from(reader: Box<dyn TilesReaderTrait>, id: &str) -> Result<TileSource> {
		let parameters = reader.parameters();
		let tile_mime = parameters.tile_format.as_mime_str().to_string();
		let compression = parameters.tile_compression;

		Ok(TileSource {
			prefix: Url::new(&format!("/tiles/{id}/")).as_dir(),
			id: id.to_owned(),
			reader: Arc::new(Mutex::new(reader)),
			tile_mime,
			compression,
		})
	}

	pub async fn get_source_name(&self) -> String {
		let reader = self.reader.lock().await;
		reader.source_name().to_owned()
	}

	// Retrieve the tile data as an HTTP response
	pub async fn get_data(&self, url: &Url, _accept: &TargetCompression) -> Result<Option<SourceResponse>> {
		let parts: Vec<String> = url.as_vec();

		if parts.len() >= 3 {
			// Parse the tile coordinates
			let z = parts[0].parse::<u8>();
			let x = parts[1].parse::<u32>();
			let y: String = parts[2].chars().take_while(|c| c.is_numeric()).collect();
			let y = y.parse::<u32>();

			// Check for parsing errors
			ensure!(z.is_ok(), "value for z is not a number");
			ensure!(x.is_ok(), "value for x is not a number");
			ensure!(y.is_ok(), "value for y is not a number");

			// Create a TileCoord3 instance
			let coord = TileCoord3::new(x?, y?, z?)?;

			log::debug!("get tile, prefix: {}, coord: {}", self.prefix, coord.as_json());

			// Get tile data
			let reader = self.reader.lock().await;
			let tile = reader.get_tile_data(&coord).await;
			drop(reader);

			// If tile data is not found, return a not found response
			if tile.is_err() {
				return Ok(None);
			}

			// If tile data is not found, return a not found response
			return if let Some(tile) = tile? {
				Ok(SourceResponse::new_some(tile, &self.compression, &self.tile_mime))
			} else {
				Ok(None)
			};
		} else if (parts[0] == "meta.json") || (parts[0] == "tiles.json") {
			// Get metadata
			let tile_json = self.build_tile_json().await?;

			return Ok(SourceResponse::new_some(
				tile_json,
				&TileCompression::Uncompressed,
				"application/json",
			));
		}

		// If the request is unknown, return a not found response
		Ok(None)
	}

	async fn build_tile_json(&self) -> Result<Blob> {
		let reader = self.reader.lock().await;
		let mut tilejson = reader.tilejson().clone();
		tilejson.update_from_reader_parameters(reader.parameters());

		let tiles_url = format!("{}{{z}}/{{x}}/{{y}}", self.prefix.as_string());
		tilejson.set_list("tiles", vec![tiles_url])?;

		Ok(tilejson.into())
	}
}

// Debug implementation for TileSource
impl Debug for TileSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TileSource")
			.field("reader", &self.reader)
			.field("tile_mime", &self.tile_mime)
			.field("compression", &self.compression)
			.finish()
	}
}
