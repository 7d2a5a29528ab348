use anyhow::{Result, bail};
use versatiles_core::TileFormat;

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PMTilesType {
	UNKNOWN = 0x0,
	MVT = 0x1,
	PNG = 0x2,
	JPEG = 0x3,
	WEBP = 0x4,
	AVIF = 0x5,
}

impl PMTilesType {
	pub fn from_u8(value: u8) -> Result<Self> {
		match value {
			0 => Ok(PMTilesType::UNKNOWN),
			1 => Ok(PMTilesType::MVT),
			2 => Ok(PMTilesType::PNG),
			3 => Ok(PMTilesType::JPEG),
			4 => Ok(PMTilesType::WEBP),
			5 => Ok(PMTilesType::AVIF),
			_ => bail!("Unknown value {value} for PMTiles type"),
		}
	}
	pub fn from_value(value: TileFormat) -> Result<Self> {
		use TileFormat::*;
		Ok(match value {
			AVIF => PMTilesType::AVIF,
			BIN => bail!("PMTiles does not support BIN"),
			GEOJSON => bail!("PMTiles does not support GEOJSON"),
			JPG => PMTilesType::JPEG,
			JSON => bail!("PMTiles does not support JSON"),
			MVT => PMTilesType::MVT,
			PNG => PMTilesType::PNG,
			SVG => bail!("PMTiles does not support SVG"),
			TOPOJSON => bail!("PMTiles does not support TOPOJSON"),
			WEBP => PMTilesType::WEBP,
		})
	}
	pub fn as_value(&self) -> Result<TileFormat> {
		use TileFormat::*;
		Ok(match self {
			PMTilesType::UNKNOWN => BIN,
			PMTilesType::MVT => MVT,
			PMTilesType::PNG => PNG,
			PMTilesType::JPEG => JPG,
			PMTilesType::WEBP => WEBP,
			PMTilesType::AVIF => AVIF,
		})
	}
}
