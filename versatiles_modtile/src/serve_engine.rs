//! The per-request decision state machine: classify the tile, throttle the client,
//! dispatch a render if needed, and compute the response's cache metadata.

use rand::Rng;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::config::ModTileConfig;
use crate::delay_pool::DelayPool;
use crate::error::ModTileError;
use crate::meta_store::MetaStore;
use crate::path_codec::{PathCodec, TileKey};
use crate::planet::PlanetTimestampCache;
use crate::render_client::{RenderClient, RequestKind};
use crate::stats::{Freshness, Stats};
use crate::PLANET_INTERVAL_SECS;

/// Freshness classification of a resolved tile, relative to the planet timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
	Missing,
	Stale,
	Current,
}

/// Everything the host needs to finish an HTTP response: status, body (if any), and headers.
#[derive(Debug, Clone)]
pub struct ServeOutcome {
	pub status: u16,
	pub body: Option<Vec<u8>>,
	pub cache_control: Option<String>,
	pub expires: Option<String>,
	pub etag: Option<String>,
}

impl ServeOutcome {
	fn not_found() -> ServeOutcome {
		ServeOutcome { status: 404, body: None, cache_control: None, expires: None, etag: None }
	}

	fn throttled() -> ServeOutcome {
		ServeOutcome { status: 503, body: None, cache_control: None, expires: None, etag: None }
	}
}

struct Located {
	body: Vec<u8>,
	mtime: SystemTime,
}

/// Ties together [`PathCodec`], [`MetaStore`], [`RenderClient`], [`DelayPool`], [`Stats`], and
/// [`PlanetTimestampCache`] into the end-to-end handling of one tile request.
pub struct ServeEngine {
	codec: PathCodec,
	meta_store: MetaStore,
	render_client: Arc<RenderClient>,
	delay_pool: Arc<DelayPool>,
	stats: Stats,
	planet: PlanetTimestampCache,
	config: ModTileConfig,
}

impl ServeEngine {
	pub fn new(config: ModTileConfig, render_client: Arc<RenderClient>, delay_pool: Arc<DelayPool>, stats: Stats) -> ServeEngine {
		let codec = PathCodec::new(config.tile_dir.clone(), config.path_mode);
		let meta_store = MetaStore::new(PathCodec::new(config.tile_dir.clone(), config.path_mode));
		let planet = PlanetTimestampCache::new(config.tile_dir.clone());
		stats.set_enabled(config.enable_global_stats);
		ServeEngine { codec, meta_store, render_client, delay_pool, stats, planet, config }
	}

	/// Resolve `key` against the metatile store, falling back to a flat-mode probe when the
	/// metatile is absent or malformed (per spec §4.2/§4.5), then classify freshness.
	fn locate(&self, key: &TileKey) -> (TileState, Option<Located>) {
		let mut buf = Vec::with_capacity(1 << 20);
		let (meta_path, _) = self.codec.meta_path(key);

		let from_meta = match self.meta_store.read(key, &mut buf) {
			Ok(0) => None,
			Ok(_) => std::fs::metadata(&meta_path).and_then(|m| m.modified()).ok().map(|mtime| Located { body: buf.clone(), mtime }),
			Err(e) => {
				if !e.is_fallback_eligible() {
					log::warn!("metatile read failed hard for {meta_path:?}: {e}");
				}
				None
			}
		};

		let located = from_meta.or_else(|| {
			let flat_path = self.codec.tile_path(key);
			let metadata = std::fs::metadata(&flat_path).ok()?;
			let mtime = metadata.modified().ok()?;
			let body = std::fs::read(&flat_path).ok()?;
			Some(Located { body, mtime })
		});

		let state = match &located {
			None => TileState::Missing,
			Some(l) if l.mtime < self.planet.timestamp() => TileState::Stale,
			Some(_) => TileState::Current,
		};
		(state, located)
	}

	/// Handle one incoming tile request end-to-end: classify, throttle, dispatch a render if
	/// needed, and compute cache headers for the response.
	pub async fn serve(&self, key: &TileKey, remote_ip: Ipv4Addr, hostname: &str, load_one_minute: f64) -> ServeOutcome {
		let (state, located) = self.locate(key);

		if self.config.enable_tile_throttling {
			let allowed = self.delay_pool.allow(remote_ip, state).await;
			if !allowed {
				self.stats.record_response(&key.style, key.z, 503);
				return ServeOutcome::throttled();
			}
		}

		match state {
			TileState::Current => self.finish(state, located, key, hostname, Some(Freshness::FreshCache)),
			TileState::Stale => self.handle_stale(key, located, load_one_minute, hostname).await,
			TileState::Missing => self.handle_missing(key, load_one_minute, hostname).await,
		}
	}

	async fn handle_stale(&self, key: &TileKey, located: Option<Located>, load: f64, hostname: &str) -> ServeOutcome {
		if load > self.config.max_load_old {
			self.dispatch_dirty(key);
			return self.finish(TileState::Stale, located, key, hostname, Some(Freshness::OldCache));
		}

		let timeout = self.config.request_timeout;
		match self.render_client.request(key, RequestKind::Render, timeout).await {
			Ok(true) => {
				let (new_state, refreshed) = self.locate(key);
				self.finish(new_state, refreshed.or(located), key, hostname, Some(Freshness::OldRender))
			}
			Ok(false) | Err(ModTileError::RenderNegative) => self.finish(TileState::Stale, located, key, hostname, Some(Freshness::OldRender)),
			Err(ModTileError::RenderTimeout) => match located {
				Some(_) => self.finish(TileState::Stale, located, key, hostname, Some(Freshness::OldRender)),
				None => self.not_found(key),
			},
			Err(e) => {
				log::warn!("render request failed for {key:?}: {e}");
				self.finish(TileState::Stale, located, key, hostname, Some(Freshness::OldRender))
			}
		}
	}

	async fn handle_missing(&self, key: &TileKey, load: f64, hostname: &str) -> ServeOutcome {
		if load > self.config.max_load_missing {
			self.dispatch_dirty(key);
			return self.not_found(key);
		}

		let timeout = self.config.request_timeout_priority;
		match self.render_client.request(key, RequestKind::RenderPrio, timeout).await {
			Ok(true) => {
				let (new_state, located) = self.locate(key);
				match located {
					Some(_) => self.finish(new_state, located, key, hostname, Some(Freshness::FreshRender)),
					None => self.not_found(key),
				}
			}
			_ => self.not_found(key),
		}
	}

	fn dispatch_dirty(&self, key: &TileKey) {
		let render_client = self.render_client.clone();
		let key = key.clone();
		tokio::spawn(async move {
			if let Err(e) = render_client.request(&key, RequestKind::Dirty, Duration::ZERO).await {
				log::debug!("dirty render submission failed for {key:?}: {e}");
			}
		});
	}

	fn not_found(&self, key: &TileKey) -> ServeOutcome {
		self.stats.record_response(&key.style, key.z, 404);
		ServeOutcome::not_found()
	}

	fn finish(&self, state: TileState, located: Option<Located>, key: &TileKey, hostname: &str, freshness: Option<Freshness>) -> ServeOutcome {
		let Some(located) = located else {
			return self.not_found(key);
		};
		let now = SystemTime::now();
		let max_age = self.compute_max_age(state, key.z, located.mtime, hostname, now);
		let etag = format!("\"{:x}\"", md5::compute(&located.body));
		self.stats.record_response(&key.style, key.z, 200);
		if let Some(freshness) = freshness {
			self.stats.record_freshness(&key.style, key.z, freshness);
		}
		ServeOutcome {
			status: 200,
			body: Some(located.body),
			cache_control: Some(format!("max-age={}", max_age.as_secs())),
			expires: Some(httpdate::fmt_http_date(now + max_age)),
			etag: Some(etag),
		}
	}

	fn min_cache_for_zoom(&self, z: u32) -> Duration {
		if z <= self.config.cache_level_low_zoom {
			self.config.cache_duration_low_zoom
		} else if z <= self.config.cache_level_medium_zoom {
			self.config.cache_duration_medium_zoom
		} else {
			self.config.cache_duration_minimum
		}
	}

	/// Compute the `max-age` advertised for a response, per spec §4.5. Falls through
	/// extended-hostname override, dirty jitter, and the zoom/planet/age-derived floor, in
	/// that order, then clamps to `cache_duration_max`.
	fn compute_max_age(&self, state: TileState, z: u32, mtime: SystemTime, hostname: &str, now: SystemTime) -> Duration {
		let max_age = if !self.config.cache_extended_hostname.is_empty() && hostname.contains(&self.config.cache_extended_hostname) {
			self.config.cache_extended_duration
		} else if state == TileState::Stale {
			self.config.cache_duration_dirty + jitter(self.config.cache_duration_dirty / 2)
		} else {
			let planet_ts = self.planet.timestamp();
			let seconds_until_next_planet =
				(planet_ts + Duration::from_secs(PLANET_INTERVAL_SECS)).duration_since(now).unwrap_or(Duration::ZERO);
			let age_of_tile = now.duration_since(mtime).unwrap_or(Duration::ZERO);
			let age_component = age_of_tile.mul_f64(self.config.cache_duration_last_modified_factor);
			let floor = self.min_cache_for_zoom(z).max(seconds_until_next_planet).max(age_component);
			floor + jitter(Duration::from_secs(3 * 3600))
		};
		max_age.min(self.config.cache_duration_max)
	}

	pub fn stats(&self) -> &Stats {
		&self.stats
	}

	pub fn status_line(&self, key: &TileKey) -> String {
		let (state, located) = self.locate(key);
		match (state, located) {
			(TileState::Current, Some(l)) => format!("clean, mtime {}", httpdate::fmt_http_date(l.mtime)),
			(_, Some(l)) => format!("due to be rendered, mtime {}", httpdate::fmt_http_date(l.mtime)),
			(_, None) => "missing".to_string(),
		}
	}

	pub fn tile_dir(&self) -> PathBuf {
		self.config.tile_dir.clone()
	}
}

fn jitter(bound: Duration) -> Duration {
	if bound.is_zero() {
		return Duration::ZERO;
	}
	Duration::from_secs_f64(rand::rng().random_range(0.0..bound.as_secs_f64()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::delay_pool::DelayPoolConfig;
	use crate::path_codec::PathMode;
	use crate::NO_LAYER;

	fn engine(tile_dir: PathBuf) -> ServeEngine {
		let mut config = ModTileConfig { tile_dir, path_mode: PathMode::Flat, enable_tile_throttling: false, ..Default::default() };
		config.max_load_old = 5.0;
		config.max_load_missing = 5.0;
		let render_client = Arc::new(RenderClient::new("/tmp/does-not-exist.sock"));
		let delay_pool = DelayPool::new(DelayPoolConfig::default(), &[]);
		ServeEngine::new(config, render_client, delay_pool, Stats::new())
	}

	#[tokio::test]
	async fn fresh_tile_served_with_200() {
		let dir = tempfile::tempdir().unwrap();
		let engine = engine(dir.path().to_path_buf());
		let key = TileKey::new("default", 2, 1, 3, NO_LAYER).unwrap();
		let path = engine.codec.tile_path(&key);
		PathCodec::mkdirp(&path).unwrap();
		std::fs::write(&path, b"tile-bytes").unwrap();

		let outcome = engine.serve(&key, Ipv4Addr::new(10, 0, 0, 1), "example.org", 0.5).await;
		assert_eq!(outcome.status, 200);
		assert_eq!(outcome.body.as_deref(), Some(&b"tile-bytes"[..]));
		assert!(outcome.cache_control.is_some());
	}

	#[tokio::test]
	async fn missing_tile_under_high_load_returns_404_without_render() {
		let dir = tempfile::tempdir().unwrap();
		let mut engine = engine(dir.path().to_path_buf());
		engine.config.max_load_missing = 1.0;
		let key = TileKey::new("default", 2, 1, 3, NO_LAYER).unwrap();

		let outcome = engine.serve(&key, Ipv4Addr::new(10, 0, 0, 2), "example.org", 20.0).await;
		assert_eq!(outcome.status, 404);
	}

	#[tokio::test]
	async fn throttled_client_gets_503() {
		let dir = tempfile::tempdir().unwrap();
		let mut engine = engine(dir.path().to_path_buf());
		engine.config.enable_tile_throttling = true;
		engine.delay_pool =
			DelayPool::new(DelayPoolConfig { tile_cap: 0, tile_rate: Duration::from_secs(3600), render_cap: 0, render_rate: Duration::from_secs(3600) }, &[]);
		let key = TileKey::new("default", 2, 1, 3, NO_LAYER).unwrap();
		let path = engine.codec.tile_path(&key);
		PathCodec::mkdirp(&path).unwrap();
		std::fs::write(&path, b"x").unwrap();

		let outcome = engine.serve(&key, Ipv4Addr::new(10, 0, 0, 3), "example.org", 0.1).await;
		assert_eq!(outcome.status, 503);
	}

	#[test]
	fn zoom_floor_selects_expected_bucket() {
		let dir = tempfile::tempdir().unwrap();
		let engine = engine(dir.path().to_path_buf());
		assert_eq!(engine.min_cache_for_zoom(2), engine.config.cache_duration_low_zoom);
		assert_eq!(engine.min_cache_for_zoom(10), engine.config.cache_duration_medium_zoom);
		assert_eq!(engine.min_cache_for_zoom(18), engine.config.cache_duration_minimum);
	}

	#[test]
	fn max_age_is_clamped_to_configured_maximum() {
		let dir = tempfile::tempdir().unwrap();
		let mut engine = engine(dir.path().to_path_buf());
		engine.config.cache_duration_max = Duration::from_secs(60);
		engine.config.cache_duration_low_zoom = Duration::from_secs(10_000);
		engine.config.cache_level_low_zoom = 20;
		let max_age = engine.compute_max_age(TileState::Current, 1, SystemTime::now(), "example.org", SystemTime::now());
		assert_eq!(max_age, Duration::from_secs(60));
	}
}
