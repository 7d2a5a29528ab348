//! Per-client-IP token-bucket throttling, shared across every worker thread.
//!
//! The original mod_tile places the user table in POSIX shared memory so it
//! is visible to pre-forked Apache worker processes. This crate targets a
//! single multi-threaded Tokio process (the model the teacher's own
//! `TileServer` uses throughout), so the "shared memory" is a plain
//! `Arc<Mutex<...>>` cloned into every request handler — see DESIGN.md for
//! the full reasoning.

use parking_lot::Mutex;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::serve_engine::TileState;
use crate::{CAMPOUT_MICROS, CLIENT_PENALTY_SECS, DELAY_HASHTABLE_SIZE, DELAY_HASHTABLE_WHITELIST_SIZE, MAXCAMP};

/// One slot in the primary user table. `ip_bits == 0` denotes an empty slot.
#[derive(Debug, Clone, Copy, Default)]
struct DelayBucket {
	ip_bits: u32,
	tiles: u32,
	renders: u32,
}

/// Token-bucket parameters.
#[derive(Debug, Clone, Copy)]
pub struct DelayPoolConfig {
	pub tile_cap: u32,
	pub tile_rate: Duration,
	pub render_cap: u32,
	pub render_rate: Duration,
}

impl Default for DelayPoolConfig {
	fn default() -> Self {
		DelayPoolConfig {
			tile_cap: 200,
			tile_rate: Duration::from_micros(500_000),
			render_cap: 50,
			render_rate: Duration::from_micros(2_000_000),
		}
	}
}

struct Inner {
	users: Vec<DelayBucket>,
	last_tile_fillup: Instant,
	last_render_fillup: Instant,
}

/// Shared throttling state: a fixed-size hash table of per-IP buckets plus an always-allowed
/// whitelist. Open addressing is deliberately not used — slot collisions simply overwrite the
/// previous occupant, since this is an admission-control heuristic, not exact accounting.
pub struct DelayPool {
	config: DelayPoolConfig,
	inner: Mutex<Inner>,
	/// Lock-free fence: sidesteps accounting entirely while a fill-up is in progress.
	locked: AtomicBool,
	whitelist: [u32; DELAY_HASHTABLE_WHITELIST_SIZE],
}

fn ip_bits(ip: Ipv4Addr) -> u32 {
	u32::from_be_bytes(ip.octets())
}

impl DelayPool {
	pub fn new(config: DelayPoolConfig, whitelist: &[Ipv4Addr]) -> Arc<DelayPool> {
		let mut table = [0u32; DELAY_HASHTABLE_WHITELIST_SIZE];
		for &ip in whitelist {
			table[(ip_bits(ip) as usize) % DELAY_HASHTABLE_WHITELIST_SIZE] = ip_bits(ip);
		}
		Arc::new(DelayPool {
			config,
			inner: Mutex::new(Inner {
				users: vec![DelayBucket::default(); DELAY_HASHTABLE_SIZE],
				last_tile_fillup: Instant::now(),
				last_render_fillup: Instant::now(),
			}),
			locked: AtomicBool::new(false),
			whitelist: table,
		})
	}

	fn is_whitelisted(&self, bits: u32) -> bool {
		self.whitelist[(bits as usize) % DELAY_HASHTABLE_WHITELIST_SIZE] == bits
	}

	/// `tryLock` with a bounded spin of `MAXCAMP` attempts of `CAMPOUT_MICROS` each, then one
	/// blocking acquire — per spec §5. `parking_lot::Mutex` supports `try_lock` on every
	/// platform, so the "fall back immediately to blocking" branch for platforms lacking
	/// `trylock` never triggers; kept only as the degenerate case of this loop (0 attempts).
	fn acquire(&self) -> parking_lot::MutexGuard<'_, Inner> {
		for _ in 0..MAXCAMP {
			if let Some(guard) = self.inner.try_lock() {
				return guard;
			}
			std::thread::sleep(Duration::from_micros(CAMPOUT_MICROS));
		}
		self.inner.lock()
	}

	/// Decide whether a request from `ip` should be allowed, per spec §4.4.
	///
	/// `allow` is the only entry point, and it only blocks (via `CLIENT_PENALTY`) when a
	/// client has genuinely exhausted its bucket — it never holds the mutex across that sleep.
	pub async fn allow(&self, ip: Ipv4Addr, state: TileState) -> bool {
		let bits = ip_bits(ip);

		if self.is_whitelisted(bits) {
			return true;
		}
		if self.locked.load(Ordering::Acquire) {
			return true;
		}

		let mut round = 0u32;
		loop {
			round += 1;
			let mut inner = self.acquire();
			let slot = (bits as usize) % DELAY_HASHTABLE_SIZE;

			if inner.users[slot].ip_bits != bits {
				inner.users[slot] = DelayBucket { ip_bits: bits, tiles: self.config.tile_cap, renders: self.config.render_cap };
			}

			let mut deficit = 0u8;
			if inner.users[slot].tiles > 0 {
				inner.users[slot].tiles -= 1;
			} else {
				deficit = 1;
			}
			if state == TileState::Missing {
				if inner.users[slot].renders > 0 {
					inner.users[slot].renders -= 1;
				} else if deficit == 0 {
					deficit = 2;
				}
			}

			if deficit == 0 {
				return true;
			}

			if round >= 2 {
				drop(inner);
				tokio::time::sleep(Duration::from_secs(CLIENT_PENALTY_SECS)).await;
				let mut inner = self.acquire();
				self.fillup(&mut inner);
				drop(inner);
				if round >= 3 {
					log::info!("delaypool: client {ip} exhausted its limits after {round} rounds, denying");
					return false;
				}
				continue;
			}
		}
	}

	/// Top up every slot's tile/render tokens based on elapsed time since the last fill-up,
	/// clamping to configured caps. `last_*_fillup` advances by the consumed token-time exactly,
	/// not to `now`, so fractional leftover time isn't lost to drift.
	fn fillup(&self, inner: &mut Inner) {
		self.locked.store(true, Ordering::Release);

		let now = Instant::now();
		let tile_topup = duration_div(now.duration_since(inner.last_tile_fillup), self.config.tile_rate);
		let render_topup = duration_div(now.duration_since(inner.last_render_fillup), self.config.render_rate);

		if tile_topup > 0 || render_topup > 0 {
			for bucket in &mut inner.users {
				if bucket.ip_bits == 0 {
					continue;
				}
				bucket.tiles = (bucket.tiles + tile_topup).min(self.config.tile_cap);
				bucket.renders = (bucket.renders + render_topup).min(self.config.render_cap);
			}
			inner.last_tile_fillup += self.config.tile_rate * tile_topup;
			inner.last_render_fillup += self.config.render_rate * render_topup;
		}

		self.locked.store(false, Ordering::Release);
	}
}

fn duration_div(elapsed: Duration, rate: Duration) -> u32 {
	if rate.is_zero() {
		return 0;
	}
	(elapsed.as_nanos() / rate.as_nanos().max(1)) as u32
}

#[cfg(test)]
mod tests {
	use super::*;

	fn addr(n: u8) -> Ipv4Addr {
		Ipv4Addr::new(10, 0, 0, n)
	}

	#[tokio::test]
	async fn burst_within_cap_all_allowed() {
		let pool = DelayPool::new(
			DelayPoolConfig { tile_cap: 5, tile_rate: Duration::from_secs(3600), render_cap: 5, render_rate: Duration::from_secs(3600) },
			&[],
		);
		for _ in 0..5 {
			assert!(pool.allow(addr(1), TileState::Current).await);
		}
	}

	#[tokio::test]
	async fn burst_beyond_cap_is_denied() {
		let pool = DelayPool::new(
			DelayPoolConfig { tile_cap: 2, tile_rate: Duration::from_secs(3600), render_cap: 2, render_rate: Duration::from_secs(3600) },
			&[],
		);
		assert!(pool.allow(addr(1), TileState::Current).await);
		assert!(pool.allow(addr(1), TileState::Current).await);
		// Third request within the same window should eventually be denied. `allow` sleeps
		// CLIENT_PENALTY between retries internally, so this test is allowed to take ~1-2s.
		assert!(!pool.allow(addr(1), TileState::Current).await);
	}

	#[tokio::test]
	async fn whitelisted_ip_always_allowed() {
		let pool = DelayPool::new(
			DelayPoolConfig { tile_cap: 1, tile_rate: Duration::from_secs(3600), render_cap: 1, render_rate: Duration::from_secs(3600) },
			&[addr(9)],
		);
		for _ in 0..10 {
			assert!(pool.allow(addr(9), TileState::Current).await);
		}
	}

	#[tokio::test]
	async fn different_ips_get_independent_buckets_unless_colliding() {
		let pool = DelayPool::new(
			DelayPoolConfig { tile_cap: 1, tile_rate: Duration::from_secs(3600), render_cap: 1, render_rate: Duration::from_secs(3600) },
			&[],
		);
		assert!(pool.allow(addr(1), TileState::Current).await);
		assert!(pool.allow(addr(2), TileState::Current).await);
	}

	#[test]
	fn duration_div_computes_whole_tokens() {
		assert_eq!(duration_div(Duration::from_secs(10), Duration::from_secs(3)), 3);
		assert_eq!(duration_div(Duration::from_secs(2), Duration::from_secs(3)), 0);
	}
}
