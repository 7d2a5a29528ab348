use crate::{TileBBox, TileCoord3};
use anyhow::{Result, bail};

/// Converts between 2‑D tile space and its position along a **Hilbert
/// space‑filling curve**.
///
/// A Hilbert curve maps the tile grid at a given zoom level to a single
/// 64‑bit integer while largely preserving spatial locality.  
/// This is valuable for compact storage and range queries on tiled data.
///
/// The trait is implemented for:
/// * [`TileBBox`] – uses the south‑west corner of the bounding box.
/// * [`TileCoord3`] – a single `(z, x, y)` tile coordinate.
///
/// Implementors must guarantee that  
/// `Self::from_hilbert_index(idx)?.get_hilbert_index()? == idx`.
///
/// # Errors
/// Propagates conversion errors if the zoom level exceeds 31 or the
/// coordinates lie outside `[0, 2ᶻ − 1]`.
///
/// # Examples
/// ```
/// use versatiles_core::{TileCoord3, utils::HilbertIndex};
///
/// let coord = TileCoord3::new(5, 3, 3)?;
/// let idx = coord.get_hilbert_index()?;
/// assert_eq!(TileCoord3::from_hilbert_index(idx)?, coord);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub trait HilbertIndex {
	/// Returns the 64‑bit Hilbert index corresponding to `self`.
	fn get_hilbert_index(&self) -> Result<u64>;
	/// Reconstructs an instance from a 64‑bit Hilbert index produced by
	/// [`HilbertIndex::get_hilbert_index`].
	///
	/// # Errors
	/// Fails when `index` cannot be mapped to valid tile coordinates
	/// (e.g. if it would imply a zoom level ≥ 32).
	fn from_hilbert_index(index: u64) -> Result<Self>
	where
		Self: Sized;
}

impl HilbertIndex for TileBBox {
	fn get_hilbert_index(&self) -> Result<u64> {
		coord_to_index(self.x_min, self.y_min, self.level)
	}
	fn from_hilbert_index(index: u64) -> Result<Self> {
		let coord = index_to_coord(index)?;
		TileBBox::new(coord.level, coord.x, coord.y, coord.x, coord.y)
	}
}

impl HilbertIndex for TileCoord3 {
	fn get_hilbert_index(&self) -> Result<u64> {
		coord_to_index(self.x, self.y, self.level)
	}
	fn from_hilbert_index(index: u64) -> Result<Self> {
		index_to_coord(index)
	}
}

/// Encodes a Web‑Mercator tile coordinate `(x, y, z)` into its position
/// along the 64‑bit Hilbert space‑filling curve used by this crate.
///
/// * `x`, `y` – tile coordinates in the inclusive range `0..2ᶻ − 1`.
/// * `z` – zoom level (`0‒31`).  
///
/// Lower zoom levels occupy the lower portion of the 64‑bit range so that
/// indices remain strictly increasing with zoom.
///
/// # Errors
/// * **`"tile zoom exceeds 64-bit limit"`** – `z ≥ 32`
/// * **`"tile x/y outside zoom level bounds"`** – any coordinate ≥ `2ᶻ`
///
/// # Implementation notes
/// The function is a direct port of the canonical Hilbert algorithm that
/// traverses the curve iteratively while keeping an accumulator for the
/// number of tiles contained in all previous zoom levels.
fn coord_to_index(x: u32, y: u32, z: u8) -> Result<u64> {
	if z >= 32 {
		bail!("tile zoom exceeds 64-bit limit");
	}

	let n = 1u32 << z;
	if x >= n || y >= n {
		bail!("tile x/y outside zoom level bounds");
	}

	let mut acc: i64 = 0;
	for t_z in 0..(z as i64) {
		acc += 1i64 << (t_z * 2)
	}

	let mut tx: i64 = x as i64;
	let mut ty: i64 = y as i64;
	let mut d: i64 = 0;
	let mut s: i64 = n as i64 / 2;
	while s > 0 {
		let rx: u8 = if (tx & s) > 0 { 1 } else { 0 };
		let ry: u8 = if (ty & s) > 0 { 1 } else { 0 };
		d += s * s * ((3 * rx) ^ ry) as i64;
		rotate(s, &mut tx, &mut ty, rx, ry);
		s /= 2;
	}

	Ok((acc + d) as u64)
}

#[doc(hidden)]
/// In‑place rotation/reflection helper for the Hilbert algorithm.
///
/// Given the quadrant bits `rx`/`ry`, it mutates the partial tile
/// coordinate `(tx, ty)` within a square of size `s × s` to follow the
/// Hilbert orientation rules described in Hamilton (1996).
///
/// Not part of the public API; exposed only for unit tests.
fn rotate(s: i64, tx: &mut i64, ty: &mut i64, rx: u8, ry: u8) {
	if ry == 0 {
		if rx == 1 {
			*tx = s - 1 - *tx;
			*ty = s - 1 - *ty;
		}
		std::mem::swap(tx, ty);
	}
}

/// Decodes a 64‑bit Hilbert index back into its `(x, y, z)` tile
/// coordinate.
///
/// This is the inverse of [`coord_to_index`]. The algorithm incrementally
/// subtracts the tile counts of successive zoom levels until it finds the
/// level that contains the given index.
///
/// # Errors
/// Returns **`"tile zoom exceeds 64-bit limit"`** when the index would
/// require a zoom level ≥ 32.
fn index_to_coord(index: u64) -> Result<TileCoord3> {
	let mut acc = 0;
	for t_z in 0..32 {
		let num_tiles = (1 << t_z) * (1 << t_z);
		if acc + num_tiles > index {
			let n = 1 << t_z;
			let mut t = index - acc;
			let mut tx: i64 = 0;
			let mut ty: i64 = 0;

			let mut s: i64 = 1;
			while s < n {
				let rx = ((t / 2) & 1) as u8;
				let ry = ((t ^ (rx as u64)) & 1) as u8;
				rotate(s, &mut tx, &mut ty, rx, ry);
				if rx == 1 {
					tx += s;
				}
				if ry == 1 {
					ty += s;
				}
				t /= 4;
				s *= 2;
			}

			return TileCoord3::new(t_z, tx as u32, ty as u32);
		}
		acc += num_tiles;
	}
	bail!("tile zoom exceeds 64-bit limit".to_string())
}
