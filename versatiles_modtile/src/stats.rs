//! Process-wide request counters, dumped as the `/mod_tile` plain-text status page.
//!
//! Counters live behind one `Mutex`, but the textual dump is formatted *after* the lock is
//! released — a snapshot is taken under the lock and handed off, so formatting (which can be
//! arbitrarily slow for a busy vhost list) never holds up live request handling.
//!
//! Field set follows spec §3's `Stats` data model exactly: response-code buckets, freshness
//! buckets, and a per-zoom counter, plus **[ADDED]** a per-style breakdown (the original
//! aggregates globally only; per-style is a natural generalization once `style` is a runtime
//! value rather than a single compiled-in tileset).

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::MAX_ZOOM;

/// Which freshness bucket a served (200) response belongs to, per spec §4.6/§7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
	/// Tile was `Current`: served straight from the cache, no render contacted.
	FreshCache,
	/// Tile was `Missing`, a synchronous render succeeded, and the result is now current.
	FreshRender,
	/// Tile was `Stale` and load was too high to wait for a render: served stale as-is.
	OldCache,
	/// Tile was `Stale` and a synchronous render was attempted (successfully or not).
	OldRender,
}

#[derive(Debug, Default, Clone)]
struct Counters {
	resp200: u64,
	resp304: u64,
	resp404: u64,
	resp503: u64,
	resp5xx: u64,
	resp_other: u64,
	fresh_cache: u64,
	fresh_render: u64,
	old_cache: u64,
	old_render: u64,
	resp_zoom: Vec<u64>,
}

impl Counters {
	fn new() -> Counters {
		Counters { resp_zoom: vec![0; (MAX_ZOOM + 1) as usize], ..Default::default() }
	}

	fn record_status(&mut self, status: u16) {
		match status {
			200 => self.resp200 += 1,
			304 => self.resp304 += 1,
			404 => self.resp404 += 1,
			503 => self.resp503 += 1,
			500..=599 => self.resp5xx += 1,
			_ => self.resp_other += 1,
		}
	}

	fn record_freshness(&mut self, freshness: Freshness) {
		match freshness {
			Freshness::FreshCache => self.fresh_cache += 1,
			Freshness::FreshRender => self.fresh_render += 1,
			Freshness::OldCache => self.old_cache += 1,
			Freshness::OldRender => self.old_render += 1,
		}
	}

	fn record_zoom(&mut self, z: u32) {
		if let Some(slot) = self.resp_zoom.get_mut(z as usize) {
			*slot += 1;
		}
	}
}

struct Inner {
	total: Counters,
	by_style: BTreeMap<String, Counters>,
}

/// Shared, cheaply-cloned handle to the process's request counters.
///
/// When disabled (`enable_global_stats = false` in [`crate::config::ModTileConfig`]), every
/// `record_*` call is a silent no-op, per spec §4.6 — callers never need to branch on whether
/// stats collection is active.
#[derive(Clone)]
pub struct Stats {
	inner: Arc<Mutex<Inner>>,
	enabled: Arc<AtomicBool>,
}

/// Point-in-time copy of the counters, safe to format or serialize without holding any lock.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
	total: Counters,
	by_style: BTreeMap<String, Counters>,
}

impl Stats {
	pub fn new() -> Stats {
		Stats {
			inner: Arc::new(Mutex::new(Inner { total: Counters::new(), by_style: BTreeMap::new() })),
			enabled: Arc::new(AtomicBool::new(true)),
		}
	}

	/// Enable or disable counter collection in place; existing clones observe the change
	/// immediately since the flag is shared.
	pub fn set_enabled(&self, enabled: bool) {
		self.enabled.store(enabled, Ordering::Relaxed);
	}

	fn bump(&self, style: &str, z: u32, f: impl Fn(&mut Counters)) {
		if !self.enabled.load(Ordering::Relaxed) {
			return;
		}
		let mut inner = self.inner.lock();
		f(&mut inner.total);
		inner.total.record_zoom(z);
		let entry = inner.by_style.entry(style.to_string()).or_insert_with(Counters::new);
		f(entry);
		entry.record_zoom(z);
	}

	/// Record one HTTP response's status code and zoom level.
	pub fn record_response(&self, style: &str, z: u32, status: u16) {
		self.bump(style, z, move |c| c.record_status(status));
	}

	/// Record a served (200) response's freshness bucket, alongside `record_response`.
	pub fn record_freshness(&self, style: &str, z: u32, freshness: Freshness) {
		self.bump(style, z, move |c| c.record_freshness(freshness));
	}

	pub fn snapshot(&self) -> StatsSnapshot {
		let inner = self.inner.lock();
		StatsSnapshot { total: inner.total.clone(), by_style: inner.by_style.clone() }
	}
}

impl Default for Stats {
	fn default() -> Self {
		Stats::new()
	}
}

fn format_counters(out: &mut String, label: &str, c: &Counters) {
	let _ = writeln!(
		out,
		"{label}: resp200={} resp304={} resp404={} resp503={} resp5xx={} respOther={} freshCache={} freshRender={} oldCache={} oldRender={}",
		c.resp200, c.resp304, c.resp404, c.resp503, c.resp5xx, c.resp_other, c.fresh_cache, c.fresh_render, c.old_cache, c.old_render
	);
	let _ = write!(out, "{label} respZoom:");
	for (z, count) in c.resp_zoom.iter().enumerate() {
		if *count > 0 {
			let _ = write!(out, " {z}={count}");
		}
	}
	let _ = writeln!(out);
}

impl StatsSnapshot {
	/// Render the plain-text status dump served at the `/mod_tile` diagnostic endpoint.
	pub fn render(&self) -> String {
		let mut out = String::new();
		format_counters(&mut out, "Total", &self.total);
		for (style, counters) in &self.by_style {
			format_counters(&mut out, style, counters);
		}
		out
	}

	pub fn resp200(&self) -> u64 {
		self.total.resp200
	}

	pub fn resp404(&self) -> u64 {
		self.total.resp404
	}

	pub fn resp503(&self) -> u64 {
		self.total.resp503
	}

	pub fn fresh_cache(&self) -> u64 {
		self.total.fresh_cache
	}

	pub fn old_render(&self) -> u64 {
		self.total.old_render
	}
}
