//! Error taxonomy for the tile-serving core.
//!
//! Most of the rest of this crate's sibling crates propagate errors with
//! `anyhow::Result`, but several call sites here (`ServeEngine`,
//! `MetaStore::read`) need to branch on error *kind* rather than just log a
//! message — so these two error types are plain enums via `thiserror`
//! instead.

use std::path::PathBuf;
use thiserror::Error;

/// Distinct failure kinds for [`crate::meta_store::MetaStore::read`].
///
/// Kept distinct (rather than one generic `IoFailure`) so callers can fall
/// back from a missing/invalid metatile to a flat-mode probe, per spec §4.2.
#[derive(Debug, Error)]
pub enum MetaStoreError {
	#[error("failed to open metatile {path:?}: {source}")]
	Open { path: PathBuf, #[source] source: std::io::Error },

	#[error("failed to read metatile {path:?}: {source}")]
	Read { path: PathBuf, #[source] source: std::io::Error },

	#[error("metatile {path:?} header too short: got {got} bytes, need at least {needed}")]
	HeaderTooShort { path: PathBuf, got: usize, needed: usize },

	#[error("metatile {path:?} magic mismatch")]
	MagicMismatch { path: PathBuf },

	#[error("metatile {path:?} bad count: got {got}, expected {expected}")]
	CountMismatch { path: PathBuf, got: u32, expected: u32 },

	#[error("metatile {path:?} seek error at offset {offset}: {source}")]
	Seek { path: PathBuf, offset: u64, #[source] source: std::io::Error },

	#[error("sub-tile index {index} out of range (count {count})")]
	IndexOutOfRange { index: u32, count: u32 },
}

impl MetaStoreError {
	/// Whether this failure should make the caller fall back to reading the flat tile store,
	/// as opposed to being a hard I/O error unrelated to the metatile format.
	pub fn is_fallback_eligible(&self) -> bool {
		!matches!(self, MetaStoreError::Read { .. })
	}
}

/// Error taxonomy from spec §7, covering the whole crate.
#[derive(Debug, Error)]
pub enum ModTileError {
	#[error("invalid path: {0}")]
	InvalidPath(String),

	#[error("coordinate out of range: x={x} y={y} z={z}")]
	CoordinateOutOfRange { x: u32, y: u32, z: u32 },

	#[error("I/O failure: {0}")]
	IoFailure(#[from] std::io::Error),

	#[error("metatile header invalid: {0}")]
	MetaHeaderInvalid(#[from] MetaStoreError),

	#[error("render socket failure: {0}")]
	RenderSocketFailure(String),

	#[error("render daemon timed out")]
	RenderTimeout,

	#[error("render daemon reported failure (NOT_DONE)")]
	RenderNegative,

	#[error("could not acquire lock")]
	LockUnavailable,

	#[error("client throttled")]
	Throttled,
}
