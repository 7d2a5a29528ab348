use napi_derive::napi;
use versatiles_container::TileSourceMetadata;

/// Tile source metadata describing output characteristics
#[napi(object)]
#[derive(Clone)]
pub struct SourceMetadata {
	/// Tile format (e.g., "png", "jpg", "mvt")
	pub tile_format: String,
	/// Tile compression (e.g., "gzip", "brotli", "uncompressed")
	pub tile_compression: String,
	/// Minimum zoom level available
	pub min_zoom: u8,
	/// Maximum zoom level available
	pub max_zoom: u8,
}

impl From<&TileSourceMetadata> for SourceMetadata {
	fn from(params: &TileSourceMetadata) -> Self {
		Self {
			tile_format: format!("{:?}", params.tile_format).to_lowercase(),
			tile_compression: format!("{:?}", params.tile_compression).to_lowercase(),
			min_zoom: params.bbox_pyramid.get_level_min().unwrap_or(0),
			max_zoom: params.bbox_pyramid.get_level_max().unwrap_or(0),
		}
	}
}
