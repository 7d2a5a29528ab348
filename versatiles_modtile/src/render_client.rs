//! Client side of the wire protocol spoken to the render daemon (`renderd`) over a
//! UNIX-domain stream socket. The daemon process itself is out of scope here — only
//! the contract this crate holds it to.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::Mutex;

use crate::error::ModTileError;
use crate::path_codec::TileKey;
use crate::wire::{RenderMode, WireMessage, WIRE_MESSAGE_SIZE};

/// A request to dispatch to the render daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
	/// Fire-and-forget: mark the tile dirty, don't wait for the result.
	Dirty,
	/// Block for up to `request_timeout` for the render to complete.
	Render,
	/// Like `Render`, but routed to the daemon's priority queue with `request_timeout_priority`.
	RenderPrio,
}

impl RequestKind {
	fn wire_mode(self) -> RenderMode {
		match self {
			RequestKind::Dirty => RenderMode::Dirty,
			RequestKind::Render => RenderMode::Render,
			RequestKind::RenderPrio => RenderMode::RenderPrio,
		}
	}
}

/// Maintains (and transparently reconnects) one UNIX-domain connection to `renderd`.
///
/// The connection is protected by a `tokio::sync::Mutex` rather than `parking_lot`'s, since the
/// critical section spans an `.await` (the socket round-trip) — `parking_lot::Mutex` guards are
/// not `Send` across await points and would not compile here.
pub struct RenderClient {
	socket_path: PathBuf,
	conn: Mutex<Option<UnixStream>>,
}

impl RenderClient {
	pub fn new(socket_path: impl Into<PathBuf>) -> RenderClient {
		RenderClient { socket_path: socket_path.into(), conn: Mutex::new(None) }
	}

	async fn connect(&self) -> std::io::Result<UnixStream> {
		UnixStream::connect(&self.socket_path).await
	}

	/// Send `key` to the daemon as `kind`, waiting for a matching reply when `kind` requires one.
	///
	/// `Dirty` requests return as soon as the message is written. `Render`/`RenderPrio` requests
	/// wait for a `Done`/`NotDone` reply addressed to the same tile, discarding any stale replies
	/// left over from a previous caller sharing this connection, for up to `timeout` in total —
	/// each stale reply decrements the remaining budget rather than resetting it.
	pub async fn request(&self, key: &TileKey, kind: RequestKind, timeout: Duration) -> Result<bool, ModTileError> {
		let outgoing = WireMessage::for_request(key, kind.wire_mode());
		let mut guard = self.conn.lock().await;

		if guard.is_none() {
			*guard = Some(self.connect().await.map_err(|e| ModTileError::RenderSocketFailure(e.to_string()))?);
		}

		let write_result = {
			let stream = guard.as_mut().unwrap();
			stream.write_all(&outgoing.encode()).await
		};
		if let Err(e) = write_result {
			// Reconnect-retry is reserved for EPIPE/short-write (the daemon closed an idle
			// connection); any other failure is fatal to this call, per spec sections 4.3/7.
			if matches!(e.kind(), std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::WriteZero) {
				log::warn!("render socket write failed ({e}), reconnecting");
				let mut stream = self.connect().await.map_err(|e| ModTileError::RenderSocketFailure(e.to_string()))?;
				stream.write_all(&outgoing.encode()).await.map_err(|e| ModTileError::RenderSocketFailure(e.to_string()))?;
				*guard = Some(stream);
			} else {
				return Err(ModTileError::RenderSocketFailure(e.to_string()));
			}
		}

		if matches!(kind, RequestKind::Dirty) {
			return Ok(true);
		}

		let deadline = Instant::now() + timeout;
		loop {
			let remaining = deadline.saturating_duration_since(Instant::now());
			if remaining.is_zero() {
				return Err(ModTileError::RenderTimeout);
			}

			let stream = guard.as_mut().unwrap();
			let mut buf = [0u8; WIRE_MESSAGE_SIZE];
			let read = tokio::time::timeout(remaining, stream.read_exact(&mut buf)).await;
			let reply = match read {
				Ok(Ok(_)) => WireMessage::decode(&buf).map_err(|e| ModTileError::RenderSocketFailure(e.to_string()))?,
				Ok(Err(e)) => return Err(ModTileError::RenderSocketFailure(e.to_string())),
				Err(_) => return Err(ModTileError::RenderTimeout),
			};

			if !reply.matches(key) {
				log::debug!("render reply for {:?}/{}/{} did not match pending request, discarding", reply.style, reply.x, reply.y);
				continue;
			}

			return match reply.cmd {
				RenderMode::Done => Ok(true),
				RenderMode::NotDone => Err(ModTileError::RenderNegative),
				other => Err(ModTileError::RenderSocketFailure(format!("unexpected reply command {other:?}"))),
			};
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::NO_LAYER;
	use tokio::net::UnixListener;

	async fn spawn_echo_daemon(socket_path: PathBuf, reply_mode: RenderMode) {
		let listener = UnixListener::bind(&socket_path).unwrap();
		tokio::spawn(async move {
			let (mut stream, _) = listener.accept().await.unwrap();
			let mut buf = [0u8; WIRE_MESSAGE_SIZE];
			if stream.read_exact(&mut buf).await.is_err() {
				return;
			}
			let request = WireMessage::decode(&buf).unwrap();
			let reply = WireMessage { cmd: reply_mode, ..request };
			let _ = stream.write_all(&reply.encode()).await;
		});
	}

	#[tokio::test]
	async fn render_request_waits_for_done_reply() {
		let dir = tempfile::tempdir().unwrap();
		let socket_path = dir.path().join("renderd.sock");
		spawn_echo_daemon(socket_path.clone(), RenderMode::Done).await;
		tokio::time::sleep(Duration::from_millis(20)).await;

		let client = RenderClient::new(&socket_path);
		let key = TileKey::new("default", 5, 1, 2, NO_LAYER).unwrap();
		let result = client.request(&key, RequestKind::Render, Duration::from_secs(1)).await.unwrap();
		assert!(result);
	}

	#[tokio::test]
	async fn render_request_surfaces_not_done_as_error() {
		let dir = tempfile::tempdir().unwrap();
		let socket_path = dir.path().join("renderd.sock");
		spawn_echo_daemon(socket_path.clone(), RenderMode::NotDone).await;
		tokio::time::sleep(Duration::from_millis(20)).await;

		let client = RenderClient::new(&socket_path);
		let key = TileKey::new("default", 5, 1, 2, NO_LAYER).unwrap();
		let err = client.request(&key, RequestKind::Render, Duration::from_secs(1)).await.unwrap_err();
		assert!(matches!(err, ModTileError::RenderNegative));
	}

	#[tokio::test]
	async fn dirty_request_does_not_wait_for_reply() {
		let dir = tempfile::tempdir().unwrap();
		let socket_path = dir.path().join("renderd.sock");
		let listener = UnixListener::bind(&socket_path).unwrap();
		tokio::spawn(async move {
			let _ = listener.accept().await;
			// Never replies.
			std::future::pending::<()>().await;
		});
		tokio::time::sleep(Duration::from_millis(20)).await;

		let client = RenderClient::new(&socket_path);
		let key = TileKey::new("default", 5, 1, 2, NO_LAYER).unwrap();
		let result = client.request(&key, RequestKind::Dirty, Duration::from_secs(1)).await.unwrap();
		assert!(result);
	}

	#[tokio::test]
	async fn connection_times_out_when_daemon_silent() {
		let dir = tempfile::tempdir().unwrap();
		let socket_path = dir.path().join("renderd.sock");
		let listener = UnixListener::bind(&socket_path).unwrap();
		tokio::spawn(async move {
			let _ = listener.accept().await;
			std::future::pending::<()>().await;
		});
		tokio::time::sleep(Duration::from_millis(20)).await;

		let client = RenderClient::new(&socket_path);
		let key = TileKey::new("default", 5, 1, 2, NO_LAYER).unwrap();
		let err = client.request(&key, RequestKind::Render, Duration::from_millis(50)).await.unwrap_err();
		assert!(matches!(err, ModTileError::RenderTimeout));
	}
}
