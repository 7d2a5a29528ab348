//! Serving-and-caching core of a map-tile delivery service.
//!
//! This crate implements the four tightly coupled subsystems that sit behind
//! an HTTP tile router and decide, per request, whether to serve a cached
//! tile, trigger a rendering, throttle a noisy client, and compute
//! cache-control metadata:
//!
//! - [`path_codec`] — bijective mapping between `(style, z, x, y, layer)` and filesystem paths.
//! - [`meta_store`] — the metatile binary bundle format: read, pack, unpack.
//! - [`render_client`] — the UNIX-domain wire protocol to an external render daemon.
//! - [`delay_pool`] — per-client-IP token-bucket throttling shared across workers.
//! - [`stats`] — aggregate response counters.
//! - [`serve_engine`] — the per-request decision state machine tying everything together.
//!
//! The HTTP transport itself, configuration-file parsing, and the renderer
//! process are external collaborators; this crate only defines the contract
//! with them (see [`config`] for the knobs a host is expected to supply).

mod config;
mod delay_pool;
mod error;
mod meta_store;
mod path_codec;
mod planet;
mod render_client;
mod serve_engine;
mod stats;
mod wire;

pub use config::ModTileConfig;
pub use delay_pool::{DelayPool, DelayPoolConfig};
pub use error::{MetaStoreError, ModTileError};
pub use meta_store::MetaStore;
pub use path_codec::{PathCodec, PathMode, TileKey, validate};
pub use planet::PlanetTimestampCache;
pub use render_client::RenderClient;
pub use serve_engine::{ServeEngine, ServeOutcome, TileState};
pub use stats::{Stats, StatsSnapshot};
pub use wire::{RenderMode, WireMessage, WIRE_MESSAGE_SIZE};

/// Tiles are packed into square `METATILE × METATILE` blocks on disk.
pub const METATILE: u32 = 8;

/// Highest zoom level the core will address; matches mod_tile's `render_config.h` default.
pub const MAX_ZOOM: u32 = 20;

/// Sentinel value for "no layer selected" on a [`TileKey`], matching the wire protocol's
/// `layer: u32` field when no raster layer is in use.
pub const NO_LAYER: u32 = u32::MAX;

/// Planet-timestamp refresh cadence, in seconds, per spec §4.5.
pub const PLANET_REFRESH_INTERVAL_SECS: u64 = 300;

/// Nominal interval between planet data imports; used when computing cache max-age headroom.
pub const PLANET_INTERVAL_SECS: u64 = 3 * 24 * 3600;

/// Seconds to sleep a throttled client before retrying a fill-up, per spec §4.4 step 5.
pub const CLIENT_PENALTY_SECS: u64 = 1;

/// Bounded spin attempts before falling back to a blocking mutex acquire, per spec §5.
pub const MAXCAMP: u32 = 10;

/// Sleep between spin attempts, in microseconds, per spec §5.
pub const CAMPOUT_MICROS: u64 = 1000;

/// Primary DelayPool user-table size (slot = `ip mod DELAY_HASHTABLE_SIZE`).
pub const DELAY_HASHTABLE_SIZE: usize = 1024;

/// Whitelist table size (slot = `ip mod DELAY_HASHTABLE_WHITELIST_SIZE`).
pub const DELAY_HASHTABLE_WHITELIST_SIZE: usize = 128;
