//! The fixed-size wire message exchanged with the render daemon over a UNIX-domain stream.
//!
//! Encoded explicitly with `byteorder::LittleEndian`, matching the approach
//! `versatiles_core::io::{ValueReader, ValueWriter}` use for disk/wire formats —
//! never a `#[repr(C)]` struct cast, since in-memory layout is not a wire contract.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::path_codec::TileKey;

/// Command carried by a [`WireMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
	/// Submit a render request, return immediately without waiting for completion.
	Dirty,
	/// Submit a render request and wait (up to `request_timeout`) for completion.
	Render,
	/// Like `Render`, but with the render daemon's priority queue and `request_timeout_priority`.
	RenderPrio,
	/// Reply: the render completed successfully.
	Done,
	/// Reply: the render daemon declined or failed the request.
	NotDone,
}

impl RenderMode {
	fn to_wire(self) -> u32 {
		match self {
			RenderMode::Dirty => 0,
			RenderMode::Render => 1,
			RenderMode::RenderPrio => 2,
			RenderMode::Done => 3,
			RenderMode::NotDone => 4,
		}
	}

	fn from_wire(v: u32) -> Option<RenderMode> {
		match v {
			0 => Some(RenderMode::Dirty),
			1 => Some(RenderMode::Render),
			2 => Some(RenderMode::RenderPrio),
			3 => Some(RenderMode::Done),
			4 => Some(RenderMode::NotDone),
			_ => None,
		}
	}
}

const STYLE_FIELD_LEN: usize = 41;
const WIRE_VERSION: u32 = 2;

/// Fixed-size render protocol message: `{ver, cmd, x, y, z, layer, style[41]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
	pub ver: u32,
	pub cmd: RenderMode,
	pub x: u32,
	pub y: u32,
	pub z: u32,
	pub layer: u32,
	pub style: String,
}

/// Total encoded size in bytes: 6 `u32` fields plus the fixed 41-byte style field.
pub const WIRE_MESSAGE_SIZE: usize = 6 * 4 + STYLE_FIELD_LEN;

impl WireMessage {
	pub fn for_request(key: &TileKey, mode: RenderMode) -> WireMessage {
		WireMessage {
			ver: WIRE_VERSION,
			cmd: mode,
			x: key.x,
			y: key.y,
			z: key.z,
			layer: key.layer,
			style: key.style.clone(),
		}
	}

	/// Whether this message's addressing fields match `key` — used to discard stale or
	/// misdirected replies on a shared socket.
	pub fn matches(&self, key: &TileKey) -> bool {
		self.x == key.x && self.y == key.y && self.z == key.z && self.layer == key.layer && self.style == key.style
	}

	pub fn encode(&self) -> [u8; WIRE_MESSAGE_SIZE] {
		let mut buf = [0u8; WIRE_MESSAGE_SIZE];
		{
			let mut cursor: &mut [u8] = &mut buf;
			cursor.write_u32::<LittleEndian>(self.ver).unwrap();
			cursor.write_u32::<LittleEndian>(self.cmd.to_wire()).unwrap();
			cursor.write_u32::<LittleEndian>(self.x).unwrap();
			cursor.write_u32::<LittleEndian>(self.y).unwrap();
			cursor.write_u32::<LittleEndian>(self.z).unwrap();
			cursor.write_u32::<LittleEndian>(self.layer).unwrap();
			let style_bytes = self.style.as_bytes();
			let n = style_bytes.len().min(STYLE_FIELD_LEN - 1);
			cursor.write_all(&style_bytes[..n]).unwrap();
		}
		buf
	}

	pub fn decode(buf: &[u8; WIRE_MESSAGE_SIZE]) -> io::Result<WireMessage> {
		let mut cursor: &[u8] = buf;
		let ver = cursor.read_u32::<LittleEndian>()?;
		let cmd_raw = cursor.read_u32::<LittleEndian>()?;
		let cmd = RenderMode::from_wire(cmd_raw)
			.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("unknown wire command {cmd_raw}")))?;
		let x = cursor.read_u32::<LittleEndian>()?;
		let y = cursor.read_u32::<LittleEndian>()?;
		let z = cursor.read_u32::<LittleEndian>()?;
		let layer = cursor.read_u32::<LittleEndian>()?;
		let mut style_buf = [0u8; STYLE_FIELD_LEN];
		cursor.read_exact(&mut style_buf)?;
		let nul = style_buf.iter().position(|&b| b == 0).unwrap_or(STYLE_FIELD_LEN);
		let style = String::from_utf8_lossy(&style_buf[..nul]).into_owned();
		Ok(WireMessage { ver, cmd, x, y, z, layer, style })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrip_preserves_fields() {
		let key = TileKey::new("default", 5, 10, 20, crate::NO_LAYER).unwrap();
		let msg = WireMessage::for_request(&key, RenderMode::RenderPrio);
		let encoded = msg.encode();
		let decoded = WireMessage::decode(&encoded).unwrap();
		assert_eq!(decoded, msg);
	}

	#[test]
	fn encoded_size_is_fixed() {
		let key = TileKey::new("a", 0, 0, 0, crate::NO_LAYER).unwrap();
		let msg = WireMessage::for_request(&key, RenderMode::Dirty);
		assert_eq!(msg.encode().len(), WIRE_MESSAGE_SIZE);
	}

	#[test]
	fn recorded_byte_vector_decodes() {
		// ver=2, cmd=Done(3), x=1, y=2, z=3, layer=u32::MAX, style="osm"
		let mut buf = [0u8; WIRE_MESSAGE_SIZE];
		{
			let mut cursor: &mut [u8] = &mut buf;
			cursor.write_u32::<LittleEndian>(2).unwrap();
			cursor.write_u32::<LittleEndian>(3).unwrap();
			cursor.write_u32::<LittleEndian>(1).unwrap();
			cursor.write_u32::<LittleEndian>(2).unwrap();
			cursor.write_u32::<LittleEndian>(3).unwrap();
			cursor.write_u32::<LittleEndian>(u32::MAX).unwrap();
			cursor.write_all(b"osm").unwrap();
		}
		let decoded = WireMessage::decode(&buf).unwrap();
		assert_eq!(decoded.cmd, RenderMode::Done);
		assert_eq!(decoded.x, 1);
		assert_eq!(decoded.y, 2);
		assert_eq!(decoded.z, 3);
		assert_eq!(decoded.layer, u32::MAX);
		assert_eq!(decoded.style, "osm");
	}

	#[test]
	fn matches_checks_addressing_fields_only() {
		let key = TileKey::new("osm", 4, 1, 2, crate::NO_LAYER).unwrap();
		let msg = WireMessage::for_request(&key, RenderMode::Done);
		assert!(msg.matches(&key));
		let other = TileKey::new("osm", 4, 1, 3, crate::NO_LAYER).unwrap();
		assert!(!msg.matches(&other));
	}

	#[test]
	fn decode_rejects_unknown_command() {
		let mut buf = [0u8; WIRE_MESSAGE_SIZE];
		{
			let mut cursor: &mut [u8] = &mut buf;
			cursor.write_u32::<LittleEndian>(2).unwrap();
			cursor.write_u32::<LittleEndian>(99).unwrap();
		}
		assert!(WireMessage::decode(&buf).is_err());
	}
}
