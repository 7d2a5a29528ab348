//! Runtime configuration for the tile-serving core.
//!
//! Follows the self-documenting spirit of `versatiles::config::ServerConfig`: every directive
//! is named, typed, and given a demo value in one place rather than hand-maintained in prose.
//! `ModTileConfig` does not derive [`versatiles_derive::ConfigDoc`] itself — that derive's
//! field-shape heuristic only knows how to recurse into `Option<T>`/`Vec<T>`/`HashMap`/
//! `UrlPath`/primitives/nested-`ConfigDoc` fields, and this struct's `PathBuf`/`Duration`/
//! `PathMode` fields (plain, required, and not themselves config sections worth their own
//! Markdown table) don't fit any of those shapes. [`ModTileConfig::md`] and
//! [`ModTileConfig::demo_yaml`] below reproduce that derive's two output formats by hand from a
//! single field table, rather than forcing these types into a shape the derive wasn't built for.

use std::fmt::Write as _;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one [`crate::serve_engine::ServeEngine`] instance.
///
/// Every field here corresponds to a directive from the original `mod_tile`
/// Apache config block; field names have been converted to idiomatic Rust
/// `snake_case` rather than the original's bare directive names.
#[derive(Debug, Clone, PartialEq)]
pub struct ModTileConfig {
	/// Path to the render daemon's UNIX-domain control socket.
	pub renderd_socket_name: PathBuf,

	/// Root directory under which flat tiles and metatiles are stored.
	pub tile_dir: PathBuf,

	/// Directory layout used to map tile coordinates to filesystem paths.
	pub path_mode: crate::path_codec::PathMode,

	/// How long a normal-priority render request blocks waiting for the daemon.
	pub request_timeout: Duration,

	/// How long a priority render request blocks waiting for the daemon.
	pub request_timeout_priority: Duration,

	/// Load average above which a stale tile is served without triggering a re-render.
	pub max_load_old: f64,

	/// Load average above which a missing tile's synchronous render is skipped entirely.
	pub max_load_missing: f64,

	/// Hostname substituted into extended Cache-Control headers, if any.
	pub cache_extended_hostname: String,

	/// Extended cache duration, applied only when `cache_extended_hostname` is set.
	pub cache_extended_duration: Duration,

	/// Cache duration advertised for tiles classified as dirty/stale.
	pub cache_duration_dirty: Duration,

	/// Upper bound on any advertised cache duration, regardless of zoom.
	pub cache_duration_max: Duration,

	/// Lower bound on any advertised cache duration.
	pub cache_duration_minimum: Duration,

	/// Multiplier applied to a tile's age-since-last-modified when deriving its max-age.
	pub cache_duration_last_modified_factor: f64,

	/// Flat cache duration for zoom levels at or below `cache_level_low_zoom`.
	pub cache_duration_low_zoom: Duration,

	/// Zoom level boundary below which `cache_duration_low_zoom` applies.
	pub cache_level_low_zoom: u32,

	/// Flat cache duration for zoom levels at or below `cache_level_medium_zoom`.
	pub cache_duration_medium_zoom: Duration,

	/// Zoom level boundary below which `cache_duration_medium_zoom` applies.
	pub cache_level_medium_zoom: u32,

	/// Whether a process-wide [`crate::stats::Stats`] counter set is maintained.
	pub enable_global_stats: bool,

	/// Whether per-client-IP throttling via [`crate::delay_pool::DelayPool`] is active.
	pub enable_tile_throttling: bool,

	/// Client-IPs exempt from throttling regardless of request volume.
	pub throttling_whitelist: Vec<Ipv4Addr>,

	/// Token-bucket capacity for ordinary tile requests.
	pub delaypool_tile_size: u32,

	/// Token-bucket refill interval for ordinary tile requests.
	pub delaypool_tile_rate: Duration,

	/// Token-bucket capacity for render-triggering requests.
	pub delaypool_render_size: u32,

	/// Token-bucket refill interval for render-triggering requests.
	pub delaypool_render_rate: Duration,
}

/// One row of [`ModTileConfig`]'s field table: the same four facts
/// `#[derive(versatiles_derive::ConfigDoc)]` would have pulled from reflection, kept alongside
/// the struct definition by hand instead.
struct ConfigField {
	key: &'static str,
	ty: &'static str,
	doc: &'static str,
	demo: &'static str,
}

const FIELDS: &[ConfigField] = &[
	ConfigField {
		key: "renderd_socket_name",
		ty: "PathBuf",
		doc: "Path to the render daemon's UNIX-domain control socket.",
		demo: "/run/renderd/renderd.sock",
	},
	ConfigField {
		key: "tile_dir",
		ty: "PathBuf",
		doc: "Root directory under which flat tiles and metatiles are stored.",
		demo: "/var/lib/mod_tile",
	},
	ConfigField {
		key: "path_mode",
		ty: "PathMode",
		doc: "Directory layout used to map tile coordinates to filesystem paths.",
		demo: "hashed",
	},
	ConfigField {
		key: "request_timeout",
		ty: "Duration",
		doc: "How long a normal-priority render request blocks waiting for the daemon.",
		demo: "33s",
	},
	ConfigField {
		key: "request_timeout_priority",
		ty: "Duration",
		doc: "How long a priority render request blocks waiting for the daemon.",
		demo: "15s",
	},
	ConfigField {
		key: "max_load_old",
		ty: "f64",
		doc: "Load average above which a stale tile is served without triggering a re-render.",
		demo: "2.0",
	},
	ConfigField {
		key: "max_load_missing",
		ty: "f64",
		doc: "Load average above which a missing tile's synchronous render is skipped entirely.",
		demo: "4.0",
	},
	ConfigField {
		key: "cache_extended_hostname",
		ty: "String",
		doc: "Hostname substituted into extended Cache-Control headers, if any.",
		demo: "",
	},
	ConfigField {
		key: "cache_extended_duration",
		ty: "Duration",
		doc: "Extended cache duration, applied only when `cache_extended_hostname` is set.",
		demo: "3600s",
	},
	ConfigField {
		key: "cache_duration_dirty",
		ty: "Duration",
		doc: "Cache duration advertised for tiles classified as dirty/stale.",
		demo: "15s",
	},
	ConfigField {
		key: "cache_duration_max",
		ty: "Duration",
		doc: "Upper bound on any advertised cache duration, regardless of zoom.",
		demo: "7d",
	},
	ConfigField {
		key: "cache_duration_minimum",
		ty: "Duration",
		doc: "Lower bound on any advertised cache duration.",
		demo: "10s",
	},
	ConfigField {
		key: "cache_duration_last_modified_factor",
		ty: "f64",
		doc: "Multiplier applied to a tile's age-since-last-modified when deriving its max-age.",
		demo: "0.2",
	},
	ConfigField {
		key: "cache_duration_low_zoom",
		ty: "Duration",
		doc: "Flat cache duration for zoom levels at or below `cache_level_low_zoom`.",
		demo: "3600s",
	},
	ConfigField {
		key: "cache_level_low_zoom",
		ty: "u32",
		doc: "Zoom level boundary below which `cache_duration_low_zoom` applies.",
		demo: "9",
	},
	ConfigField {
		key: "cache_duration_medium_zoom",
		ty: "Duration",
		doc: "Flat cache duration for zoom levels at or below `cache_level_medium_zoom`.",
		demo: "86400s",
	},
	ConfigField {
		key: "cache_level_medium_zoom",
		ty: "u32",
		doc: "Zoom level boundary below which `cache_duration_medium_zoom` applies.",
		demo: "13",
	},
	ConfigField {
		key: "enable_global_stats",
		ty: "bool",
		doc: "Whether a process-wide Stats counter set is maintained.",
		demo: "true",
	},
	ConfigField {
		key: "enable_tile_throttling",
		ty: "bool",
		doc: "Whether per-client-IP throttling via DelayPool is active.",
		demo: "true",
	},
	ConfigField {
		key: "throttling_whitelist",
		ty: "Vec<Ipv4Addr>",
		doc: "Client-IPs exempt from throttling regardless of request volume.",
		demo: "[]",
	},
	ConfigField {
		key: "delaypool_tile_size",
		ty: "u32",
		doc: "Token-bucket capacity for ordinary tile requests.",
		demo: "200",
	},
	ConfigField {
		key: "delaypool_tile_rate",
		ty: "Duration",
		doc: "Token-bucket refill interval for ordinary tile requests.",
		demo: "500ms",
	},
	ConfigField {
		key: "delaypool_render_size",
		ty: "u32",
		doc: "Token-bucket capacity for render-triggering requests.",
		demo: "50",
	},
	ConfigField {
		key: "delaypool_render_rate",
		ty: "Duration",
		doc: "Token-bucket refill interval for render-triggering requests.",
		demo: "2s",
	},
];

impl Default for ModTileConfig {
	fn default() -> Self {
		ModTileConfig {
			renderd_socket_name: PathBuf::from("/run/renderd/renderd.sock"),
			tile_dir: PathBuf::from("/var/lib/mod_tile"),
			path_mode: crate::path_codec::PathMode::Hashed,
			request_timeout: Duration::from_secs(33),
			request_timeout_priority: Duration::from_secs(15),
			max_load_old: 2.0,
			max_load_missing: 4.0,
			cache_extended_hostname: String::new(),
			cache_extended_duration: Duration::from_secs(3600),
			cache_duration_dirty: Duration::from_secs(15),
			cache_duration_max: Duration::from_secs(7 * 24 * 3600),
			cache_duration_minimum: Duration::from_secs(10),
			cache_duration_last_modified_factor: 0.2,
			cache_duration_low_zoom: Duration::from_secs(3600),
			cache_level_low_zoom: 9,
			cache_duration_medium_zoom: Duration::from_secs(86_400),
			cache_level_medium_zoom: 13,
			enable_global_stats: true,
			enable_tile_throttling: true,
			throttling_whitelist: Vec::new(),
			delaypool_tile_size: 200,
			delaypool_tile_rate: Duration::from_millis(500),
			delaypool_render_size: 50,
			delaypool_render_rate: Duration::from_secs(2),
		}
	}
}

impl ModTileConfig {
	pub fn delay_pool_config(&self) -> crate::delay_pool::DelayPoolConfig {
		crate::delay_pool::DelayPoolConfig {
			tile_cap: self.delaypool_tile_size,
			tile_rate: self.delaypool_tile_rate,
			render_cap: self.delaypool_render_size,
			render_rate: self.delaypool_render_rate,
		}
	}

	/// Markdown reference table, in the same `| Key | Type | Optional | Description |` shape
	/// `#[derive(versatiles_derive::ConfigDoc)]` produces for `versatiles::config::ServerConfig`.
	pub fn md() -> String {
		let mut s = String::new();
		s.push_str("# ModTileConfig\n\n");
		s.push_str("| Key | Type | Optional | Description |\n");
		s.push_str("| --- | ---- | -------- | ----------- |\n");
		for field in FIELDS {
			let _ = writeln!(s, "| `{}` | `{}` | no | {} |", field.key, field.ty, field.doc);
		}
		s
	}

	/// Flat `key: value` YAML demo, one line per field, in declaration order.
	pub fn demo_yaml() -> String {
		let mut s = String::new();
		for field in FIELDS {
			let _ = writeln!(s, "{}: {}", field.key, field.demo);
		}
		s
	}
}
