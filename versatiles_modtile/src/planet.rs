//! Tracks the age of the underlying planet data, used to widen cache lifetimes once the
//! data backing a style is known to be old and unlikely to change again soon.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::{PLANET_INTERVAL_SECS, PLANET_REFRESH_INTERVAL_SECS};

struct Cached {
	timestamp: SystemTime,
	read_at: SystemTime,
}

/// Caches the mtime of `tile_dir/planet-timestamp`, re-reading it at most once per
/// [`PLANET_REFRESH_INTERVAL_SECS`] so a busy server doesn't stat the file on every request.
pub struct PlanetTimestampCache {
	path: PathBuf,
	cached: Mutex<Option<Cached>>,
}

impl PlanetTimestampCache {
	pub fn new(tile_dir: impl AsRef<Path>) -> PlanetTimestampCache {
		PlanetTimestampCache { path: tile_dir.as_ref().join("planet-timestamp"), cached: Mutex::new(None) }
	}

	/// The planet data's last-known refresh time. Falls back to "3 days ago" when the
	/// timestamp file is absent or unreadable, per spec §4.6 — this degrades cache lifetimes
	/// toward the conservative (short) end rather than failing the request.
	pub fn timestamp(&self) -> SystemTime {
		let now = SystemTime::now();
		let mut guard = self.cached.lock();

		if let Some(cached) = guard.as_ref() {
			if now.duration_since(cached.read_at).unwrap_or(Duration::ZERO) < Duration::from_secs(PLANET_REFRESH_INTERVAL_SECS) {
				return cached.timestamp;
			}
		}

		let timestamp = std::fs::metadata(&self.path)
			.and_then(|m| m.modified())
			.unwrap_or_else(|_| now - Duration::from_secs(PLANET_INTERVAL_SECS));

		*guard = Some(Cached { timestamp, read_at: now });
		timestamp
	}
}
