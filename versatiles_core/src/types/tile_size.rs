//! Defines the `TileSize` enum representing supported raster or vector tile sizes.

use std::fmt::Debug;

use anyhow::{Result, bail};

/// Represents the pixel dimensions of a map tile.
/// Currently supports 256×256 and 512×512 tiles.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TileSize {
	/// Represents a tile size of 256×256 pixels.
	Size256,
	/// Represents a tile size of 512×512 pixels.
	Size512,
}

impl TileSize {
	/// Constructs a `TileSize` from a `u16` value.
	///
	/// # Arguments
	///
	/// * `size` - The pixel dimension (256 or 512)
	///
	/// # Errors
	///
	/// Returns an error if the size is not 256 or 512.
	///
	/// # Examples
	///
	/// ```
	/// use versatiles_core::TileSize;
	///
	/// let size = TileSize::new(256).unwrap();
	/// assert_eq!(size.size(), 256);
	///
	/// assert!(TileSize::new(128).is_err());
	/// ```
	pub fn new(size: u16) -> Result<Self> {
		match size {
			256 => Ok(Self::Size256),
			512 => Ok(Self::Size512),
			_ => bail!("Invalid tile size: {size}. Supported sizes are 256 or 512."),
		}
	}

	/// Returns the size of the tile in pixels.
	///
	/// # Examples
	///
	/// ```
	/// use versatiles_core::TileSize;
	///
	/// assert_eq!(TileSize::Size256.size(), 256);
	/// assert_eq!(TileSize::Size512.size(), 512);
	/// ```
	#[must_use]
	pub fn size(&self) -> u16 {
		match self {
			TileSize::Size256 => 256,
			TileSize::Size512 => 512,
		}
	}
}

impl Debug for TileSize {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "TileSize({})", self.size())
	}
}
