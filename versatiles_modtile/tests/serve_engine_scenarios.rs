//! End-to-end scenarios for the tile-serving core, exercised directly against the public API
//! (there is no HTTP host in this crate — see `ServeEngine::serve`).

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;

use versatiles_modtile::{
	DelayPool, DelayPoolConfig, ModTileConfig, PathCodec, PathMode, RenderClient, RenderMode, ServeEngine, Stats, TileKey, WireMessage,
	WIRE_MESSAGE_SIZE,
};

const LAYER: u32 = u32::MAX;

fn config(tile_dir: PathBuf) -> ModTileConfig {
	ModTileConfig {
		tile_dir,
		path_mode: PathMode::Flat,
		enable_tile_throttling: false,
		max_load_old: 5.0,
		max_load_missing: 5.0,
		..Default::default()
	}
}

fn engine_with(config: ModTileConfig, socket: PathBuf, delay_pool: Arc<DelayPool>) -> ServeEngine {
	let render_client = Arc::new(RenderClient::new(socket));
	ServeEngine::new(config, render_client, delay_pool, Stats::new())
}

fn write_tile(codec: &PathCodec, key: &TileKey, bytes: &[u8], mtime: SystemTime) {
	let path = codec.tile_path(key);
	PathCodec::mkdirp(&path).unwrap();
	std::fs::write(&path, bytes).unwrap();
	let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
	file.set_modified(mtime).unwrap();
}

/// S1: a current tile at moderate load, throttling off, is served as-is with bounded cache headers.
#[tokio::test]
async fn s1_current_tile_served_with_bounded_cache_control() {
	let dir = tempfile::tempdir().unwrap();
	let cfg = config(dir.path().to_path_buf());
	let codec = PathCodec::new(dir.path(), PathMode::Flat);
	let key = TileKey::new("default", 2, 1, 3, LAYER).unwrap();
	write_tile(&codec, &key, b"tile-bytes", SystemTime::now());

	let delay_pool = DelayPool::new(DelayPoolConfig::default(), &[]);
	let engine = engine_with(cfg.clone(), dir.path().join("renderd.sock"), delay_pool);

	let outcome = engine.serve(&key, Ipv4Addr::new(10, 0, 0, 1), "example.org", 0.5).await;
	assert_eq!(outcome.status, 200);
	assert_eq!(outcome.body.as_deref(), Some(&b"tile-bytes"[..]));

	let cache_control = outcome.cache_control.unwrap();
	let max_age: u64 = cache_control.strip_prefix("max-age=").unwrap().parse().unwrap();
	assert!(max_age <= cfg.cache_duration_max.as_secs());
}

/// S2: a stale tile under moderate load triggers a synchronous RENDER; once the render daemon
/// replies DONE, the freshly re-read tile is served with a 200.
#[tokio::test]
async fn s2_stale_tile_under_moderate_load_renders_synchronously() {
	let dir = tempfile::tempdir().unwrap();
	let mut cfg = config(dir.path().to_path_buf());
	cfg.max_load_old = 5.0;
	let codec = PathCodec::new(dir.path(), PathMode::Flat);
	let key = TileKey::new("default", 2, 1, 3, LAYER).unwrap();
	// 30-day-old body: older than the synthesized planet timestamp, so classified Stale.
	write_tile(&codec, &key, b"old-bytes", SystemTime::now() - Duration::from_secs(30 * 24 * 3600));
	std::fs::write(dir.path().join("planet-timestamp"), b"").unwrap();
	let planet_file = dir.path().join("planet-timestamp");
	let one_day_ago = SystemTime::now() - Duration::from_secs(24 * 3600);
	std::fs::OpenOptions::new().write(true).open(&planet_file).unwrap().set_modified(one_day_ago).unwrap();

	let socket_path = dir.path().join("renderd.sock");
	let listener = UnixListener::bind(&socket_path).unwrap();
	let tile_path_for_daemon = codec.tile_path(&key);
	tokio::spawn(async move {
		let (mut stream, _) = listener.accept().await.unwrap();
		let mut buf = [0u8; WIRE_MESSAGE_SIZE];
		stream.read_exact(&mut buf).await.unwrap();
		let request = WireMessage::decode(&buf).unwrap();
		assert_eq!(request.cmd, RenderMode::Render);
		std::fs::write(&tile_path_for_daemon, b"new-bytes").unwrap();
		let reply = WireMessage { cmd: RenderMode::Done, ..request };
		stream.write_all(&reply.encode()).await.unwrap();
	});
	tokio::time::sleep(Duration::from_millis(20)).await;

	let delay_pool = DelayPool::new(DelayPoolConfig::default(), &[]);
	let engine = engine_with(cfg, socket_path, delay_pool);

	let outcome = engine.serve(&key, Ipv4Addr::new(10, 0, 0, 4), "example.org", 0.5).await;
	assert_eq!(outcome.status, 200);
	assert_eq!(outcome.body.as_deref(), Some(&b"new-bytes"[..]));
}

/// S5: a metatile with a valid magic but a mismatched sub-tile count is a fallback-eligible
/// error, so `ServeEngine` probes the flat tile path instead of failing the whole request.
#[tokio::test]
async fn s5_bad_metatile_count_falls_back_to_flat_probe() {
	let dir = tempfile::tempdir().unwrap();
	let cfg = ModTileConfig { path_mode: PathMode::Flat, ..config(dir.path().to_path_buf()) };
	let codec = PathCodec::new(dir.path(), PathMode::Flat);
	let key = TileKey::new("default", 2, 1, 3, LAYER).unwrap();

	// Flat-mode fallback body, fresh enough to classify Current.
	write_tile(&codec, &key, b"flat-fallback", SystemTime::now());

	// A malformed metatile: magic ok, count=32 (spec S5 names this exact mismatch), but the
	// header is padded out to the full 64-entry size so the read doesn't just hit EOF first —
	// that's what makes the failure a CountMismatch rather than a HeaderTooShort.
	let (meta_path, _) = codec.meta_path(&key);
	PathCodec::mkdirp(&meta_path).unwrap();
	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"META");
	bytes.extend_from_slice(&32u32.to_le_bytes()); // count: wrong, should be 64
	bytes.extend_from_slice(&0u32.to_le_bytes()); // x
	bytes.extend_from_slice(&0u32.to_le_bytes()); // y
	bytes.extend_from_slice(&2u32.to_le_bytes()); // z
	bytes.resize(bytes.len() + 64 * 8, 0); // pad index table out to the full 64-entry size
	std::fs::write(&meta_path, &bytes).unwrap();

	let delay_pool = DelayPool::new(DelayPoolConfig::default(), &[]);
	let engine = engine_with(cfg, dir.path().join("renderd.sock"), delay_pool);

	let outcome = engine.serve(&key, Ipv4Addr::new(10, 0, 0, 5), "example.org", 0.5).await;
	assert_eq!(outcome.status, 200);
	assert_eq!(outcome.body.as_deref(), Some(&b"flat-fallback"[..]));
}

/// S3: a missing tile under load above `max_load_missing` gets a DIRTY submission and a 404,
/// without blocking on a synchronous render.
#[tokio::test]
async fn s3_missing_tile_under_high_load_returns_404() {
	let dir = tempfile::tempdir().unwrap();
	let mut cfg = config(dir.path().to_path_buf());
	cfg.max_load_missing = 5.0;
	let delay_pool = DelayPool::new(DelayPoolConfig::default(), &[]);
	let engine = engine_with(cfg, dir.path().join("renderd.sock"), delay_pool);

	let key = TileKey::new("default", 2, 1, 3, LAYER).unwrap();
	let outcome = engine.serve(&key, Ipv4Addr::new(10, 0, 0, 2), "example.org", 20.0).await;
	assert_eq!(outcome.status, 404);
}

/// S4: with throttling on and a tile cap of 2, the third concurrent request from the same
/// IP is denied with a 503 while the first two succeed.
#[tokio::test]
async fn s4_third_request_from_same_ip_is_throttled() {
	let dir = tempfile::tempdir().unwrap();
	let cfg = ModTileConfig { enable_tile_throttling: true, ..config(dir.path().to_path_buf()) };
	let codec = PathCodec::new(dir.path(), PathMode::Flat);
	let key = TileKey::new("default", 2, 1, 3, LAYER).unwrap();
	write_tile(&codec, &key, b"x", SystemTime::now());

	let delay_pool =
		DelayPool::new(DelayPoolConfig { tile_cap: 2, tile_rate: Duration::from_secs(3600), render_cap: 2, render_rate: Duration::from_secs(3600) }, &[]);
	let engine = engine_with(cfg, dir.path().join("renderd.sock"), delay_pool);

	let ip = Ipv4Addr::new(10, 0, 0, 3);
	let first = engine.serve(&key, ip, "example.org", 0.1).await;
	let second = engine.serve(&key, ip, "example.org", 0.1).await;
	let third = engine.serve(&key, ip, "example.org", 0.1).await;

	assert_eq!(first.status, 200);
	assert_eq!(second.status, 200);
	assert_eq!(third.status, 503);
}

/// S6: the status line for a tile reports its freshness state and mtime in plain text.
#[tokio::test]
async fn s6_status_line_reports_clean_state() {
	let dir = tempfile::tempdir().unwrap();
	let cfg = config(dir.path().to_path_buf());
	let codec = PathCodec::new(dir.path(), PathMode::Flat);
	let key = TileKey::new("default", 2, 1, 3, LAYER).unwrap();
	write_tile(&codec, &key, b"x", SystemTime::now());

	let delay_pool = DelayPool::new(DelayPoolConfig::default(), &[]);
	let engine = engine_with(cfg, dir.path().join("renderd.sock"), delay_pool);

	let line = engine.status_line(&key);
	assert!(line.starts_with("clean"));
}

/// S6 (missing variant): a tile that has never been rendered reports as missing rather than dirty.
#[tokio::test]
async fn s6_status_line_reports_missing_tile() {
	let dir = tempfile::tempdir().unwrap();
	let cfg = config(dir.path().to_path_buf());
	let delay_pool = DelayPool::new(DelayPoolConfig::default(), &[]);
	let engine = engine_with(cfg, dir.path().join("renderd.sock"), delay_pool);

	let key = TileKey::new("default", 2, 1, 3, LAYER).unwrap();
	assert_eq!(engine.status_line(&key), "missing");
}
