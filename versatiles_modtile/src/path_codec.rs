//! Bijective mapping between tile identity and filesystem path.
//!
//! Two layouts are supported, chosen per [`PathCodec`] instance rather than
//! at compile time (the original selects one via a build-time `#ifdef`, but
//! nothing here prevents a single process from serving both a hashed and a
//! flat-mode tree, so the choice is a runtime field):
//!
//! - [`PathMode::Hashed`] clusters `16×16` tile neighborhoods into shared
//!   leaf directories by spreading the low 4 bits of `x` and `y` across 5
//!   path components.
//! - [`PathMode::Flat`] lays tiles out directly as `z/x/y.png`.

use crate::{MAX_ZOOM, METATILE, NO_LAYER};
use std::path::{Path, PathBuf};

/// Identifies one tile (or, when `x`/`y` are rounded to the metatile boundary, the metatile
/// containing it — see [`TileKey::to_meta_key`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
	pub style: String,
	pub z: u32,
	pub x: u32,
	pub y: u32,
	pub layer: u32,
}

impl TileKey {
	/// Construct a `TileKey`, validating the style name and coordinate range.
	pub fn new(style: impl Into<String>, z: u32, x: u32, y: u32, layer: u32) -> Result<Self, String> {
		let style = style.into();
		if style.is_empty() || style.len() > 40 {
			return Err(format!("style name {style:?} must be 1..=40 bytes"));
		}
		if style.contains('/') {
			return Err(format!("style name {style:?} must not contain '/'"));
		}
		if !validate(x, y, z) {
			return Err(format!("coordinates out of range: x={x} y={y} z={z}"));
		}
		Ok(TileKey { style, z, x, y, layer })
	}

	/// Derive the `MetaKey` containing this tile: `x`/`y` with the low `log2(METATILE)` bits cleared.
	pub fn to_meta_key(&self) -> TileKey {
		let mask = METATILE - 1;
		TileKey {
			style: self.style.clone(),
			z: self.z,
			x: self.x & !mask,
			y: self.y & !mask,
			layer: self.layer,
		}
	}

	/// Offset of this tile within its containing metatile's sub-tile grid.
	pub fn meta_offset(&self) -> u32 {
		let mask = METATILE - 1;
		(self.x & mask) * METATILE + (self.y & mask)
	}

	fn ext_infix(&self) -> String {
		if self.layer == NO_LAYER {
			String::new()
		} else {
			format!(".{}", self.layer)
		}
	}
}

/// `0 ≤ z ≤ MAX_ZOOM ∧ 0 ≤ x,y < 2^z`.
pub fn validate(x: u32, y: u32, z: u32) -> bool {
	if z > MAX_ZOOM {
		return false;
	}
	let limit = 1u32 << z;
	x < limit && y < limit
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
	Hashed,
	Flat,
}

/// Encodes/decodes tile and metatile filesystem paths under a configured `tile_dir`.
#[derive(Debug, Clone)]
pub struct PathCodec {
	tile_dir: PathBuf,
	mode: PathMode,
}

/// `hash[i] = ((x & 0xF) << 4) | (y & 0xF)`, shifting both right by 4 bits each round.
/// Index 4 is the most-significant nibble pair, index 0 the least — this ordering is what
/// makes the resulting directory tree cluster spatially-adjacent tiles together.
fn hash_bytes(mut x: u32, mut y: u32) -> [u8; 5] {
	let mut hash = [0u8; 5];
	for slot in &mut hash {
		*slot = (((x & 0xf) << 4) | (y & 0xf)) as u8;
		x >>= 4;
		y >>= 4;
	}
	hash
}

fn unhash_bytes(hash: [u8; 5]) -> (u32, u32) {
	let mut x = 0u32;
	let mut y = 0u32;
	for byte in hash.iter().rev() {
		x = (x << 4) | ((byte & 0xf0) >> 4) as u32;
		y = (y << 4) | (byte & 0x0f) as u32;
	}
	(x, y)
}

impl PathCodec {
	pub fn new(tile_dir: impl Into<PathBuf>, mode: PathMode) -> Self {
		PathCodec { tile_dir: tile_dir.into(), mode }
	}

	/// Filesystem path for a single tile's `.png` body.
	pub fn tile_path(&self, key: &TileKey) -> PathBuf {
		self.build_path(key.x, key.y, key.z, &key.style, &key.ext_infix(), "png")
	}

	/// Filesystem path for the metatile containing `key`, plus the sub-tile offset within it.
	pub fn meta_path(&self, key: &TileKey) -> (PathBuf, u32) {
		let meta = key.to_meta_key();
		let offset = key.meta_offset();
		let path = self.build_path(meta.x, meta.y, meta.z, &meta.style, &meta.ext_infix(), "meta");
		(path, offset)
	}

	fn build_path(&self, x: u32, y: u32, z: u32, style: &str, infix: &str, ext: &str) -> PathBuf {
		let mut path = self.tile_dir.join(style).join(z.to_string());
		match self.mode {
			PathMode::Flat => {
				path.push(x.to_string());
				path.push(format!("{y}{infix}.{ext}"));
			}
			PathMode::Hashed => {
				let hash = hash_bytes(x, y);
				path.push(hash[4].to_string());
				path.push(hash[3].to_string());
				path.push(hash[2].to_string());
				path.push(hash[1].to_string());
				path.push(format!("{}{infix}.{ext}", hash[0]));
			}
		}
		path
	}

	/// Parse a path produced by [`Self::tile_path`] or [`Self::meta_path`] back into a `TileKey`.
	///
	/// Accepts both the `.png` and `.meta` extensions, and the optional `.{layer}` infix.
	/// Rejects out-of-range coordinates. This is a hand-written grammar parser over
	/// `/`-delimited segments, not a transliteration of any particular C `sscanf` format.
	pub fn parse_path(&self, path: &Path) -> Result<TileKey, String> {
		let rel = path
			.strip_prefix(&self.tile_dir)
			.map_err(|_| format!("path {path:?} is not under tile_dir {:?}", self.tile_dir))?;
		let components: Vec<&str> = rel
			.components()
			.map(|c| c.as_os_str().to_str().ok_or_else(|| "path contains non-UTF8 component".to_string()))
			.collect::<Result<_, _>>()?;

		let expected_len = match self.mode {
			PathMode::Flat => 4,
			PathMode::Hashed => 7,
		};
		if components.len() != expected_len {
			return Err(format!(
				"path {path:?} has {} components, expected {expected_len} for {:?} mode",
				components.len(),
				self.mode
			));
		}

		let style = components[0].to_string();
		let z: u32 = components[1].parse().map_err(|_| format!("bad zoom segment {:?}", components[1]))?;

		let filename = *components.last().unwrap();
		let (stem, ext) = filename.rsplit_once('.').ok_or_else(|| format!("filename {filename:?} has no extension"))?;
		if ext != "png" && ext != "meta" {
			return Err(format!("unrecognized extension {ext:?} in {filename:?}"));
		}

		let (last_segment, layer) = match stem.split_once('.') {
			Some((num, layer_str)) => {
				let layer: u32 = layer_str.parse().map_err(|_| format!("bad layer segment {layer_str:?}"))?;
				(num, layer)
			}
			None => (stem, NO_LAYER),
		};

		let (x, y) = match self.mode {
			PathMode::Flat => {
				let x: u32 = components[2].parse().map_err(|_| format!("bad x segment {:?}", components[2]))?;
				let y: u32 = last_segment.parse().map_err(|_| format!("bad y segment {last_segment:?}"))?;
				(x, y)
			}
			PathMode::Hashed => {
				let mut hash = [0u8; 5];
				for (i, slot) in [4usize, 3, 2, 1].into_iter().enumerate() {
					hash[slot] = components[2 + i]
						.parse::<u8>()
						.map_err(|_| format!("bad hash segment {:?}", components[2 + i]))?;
				}
				hash[0] = last_segment.parse().map_err(|_| format!("bad hash tail {last_segment:?}"))?;
				unhash_bytes(hash)
			}
		};

		if !validate(x, y, z) {
			return Err(format!("parsed coordinates out of range: x={x} y={y} z={z}"));
		}

		Ok(TileKey { style, z, x, y, layer })
	}

	/// Create all parent directories of `path`'s file component, tolerating existing directories
	/// and failing if an intermediate component exists as a non-directory.
	pub fn mkdirp(path: &Path) -> std::io::Result<()> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn key(style: &str, z: u32, x: u32, y: u32, layer: u32) -> TileKey {
		TileKey::new(style, z, x, y, layer).unwrap()
	}

	#[test]
	fn validate_accepts_in_range() {
		assert!(validate(0, 0, 0));
		assert!(validate(3, 7, 3)); // z=3 -> limit 8
		assert!(!validate(8, 0, 3));
		assert!(!validate(0, 0, MAX_ZOOM + 1));
	}

	#[test]
	fn flat_roundtrip() {
		let codec = PathCodec::new("/tiles", PathMode::Flat);
		let k = key("default", 5, 10, 20, NO_LAYER);
		let path = codec.tile_path(&k);
		assert_eq!(path, Path::new("/tiles/default/5/10/20.png"));
		let parsed = codec.parse_path(&path).unwrap();
		assert_eq!(parsed, k);
	}

	#[test]
	fn flat_roundtrip_with_layer() {
		let codec = PathCodec::new("/tiles", PathMode::Flat);
		let k = key("bike", 5, 10, 20, 3);
		let path = codec.tile_path(&k);
		assert_eq!(path, Path::new("/tiles/bike/5/10/20.3.png"));
		let parsed = codec.parse_path(&path).unwrap();
		assert_eq!(parsed, k);
	}

	#[test]
	fn hashed_roundtrip() {
		let codec = PathCodec::new("/tiles", PathMode::Hashed);
		for (x, y, z) in [(1u32, 3u32, 2u32), (12345, 54321, 17), (0, 0, 0)] {
			let k = key("default", z, x, y, NO_LAYER);
			let path = codec.tile_path(&k);
			let parsed = codec.parse_path(&path).unwrap();
			assert_eq!(parsed, k, "roundtrip failed for x={x} y={y} z={z}, path={path:?}");
		}
	}

	#[test]
	fn hashed_path_matches_original_layout() {
		// hash[i] = ((x & 0xf) << 4) | (y & 0xf), shifting both right 4 bits each round.
		let codec = PathCodec::new("/tiles", PathMode::Hashed);
		let k = key("default", 10, 0x12, 0x34, NO_LAYER);
		let path = codec.tile_path(&k);
		// x=0x12=00010010, y=0x34=00110100
		// byte0: ((0x12&0xf)<<4)|(0x34&0xf) = (0x2<<4)|0x4 = 0x24 = 36
		// x>>=4 -> 0x1, y>>=4 -> 0x3; byte1 = (0x1<<4)|0x3 = 0x13 = 19
		// x>>=4 -> 0, y>>=4 -> 0; byte2..4 = 0
		assert_eq!(path, Path::new("/tiles/default/10/0/0/0/19/36.png"));
	}

	#[test]
	fn meta_path_rounds_to_meta_boundary() {
		let codec = PathCodec::new("/tiles", PathMode::Flat);
		let k = key("default", 8, 17, 22, NO_LAYER); // x=17 -> meta x = 16 (8*2), y=22 -> meta y=16
		let (path, offset) = codec.meta_path(&k);
		assert_eq!(path, Path::new("/tiles/default/8/16/16.meta"));
		assert_eq!(offset, (17 % METATILE) * METATILE + (22 % METATILE));
	}

	#[test]
	fn meta_path_parses_back_to_meta_key() {
		let codec = PathCodec::new("/tiles", PathMode::Hashed);
		let k = key("default", 12, 100, 200, NO_LAYER);
		let (path, _offset) = codec.meta_path(&k);
		let parsed = codec.parse_path(&path).unwrap();
		assert_eq!(parsed, k.to_meta_key());
	}

	#[test]
	fn parse_rejects_wrong_component_count() {
		let codec = PathCodec::new("/tiles", PathMode::Flat);
		assert!(codec.parse_path(Path::new("/tiles/default/5/10.png")).is_err());
	}

	#[test]
	fn parse_rejects_bad_extension() {
		let codec = PathCodec::new("/tiles", PathMode::Flat);
		assert!(codec.parse_path(Path::new("/tiles/default/5/10/20.jpg")).is_err());
	}

	#[test]
	fn parse_rejects_out_of_range_coords() {
		let codec = PathCodec::new("/tiles", PathMode::Flat);
		// z=2 => limit 4, x=10 is out of range
		assert!(codec.parse_path(Path::new("/tiles/default/2/10/1.png")).is_err());
	}

	#[test]
	fn style_validation_rejects_slash_and_length() {
		assert!(TileKey::new("a/b", 0, 0, 0, NO_LAYER).is_err());
		assert!(TileKey::new("x".repeat(41), 0, 0, 0, NO_LAYER).is_err());
		assert!(TileKey::new("", 0, 0, 0, NO_LAYER).is_err());
	}
}
