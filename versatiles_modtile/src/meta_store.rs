//! Metatile binary bundle format: read a single tile's body out of a metatile, pack a
//! block of individual tile files into one, or explode a metatile back into tiles.
//!
//! On-disk layout (`MetaLayout`), all fields little-endian:
//! ```text
//! magic:  [u8; 4] = "META"
//! count:  u32
//! x,y,z:  u32
//! index:  [{offset: u32, size: u32}; count]
//! ...packed tile payloads...
//! ```
//! An index entry with `size == 0` denotes a missing sub-tile.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::MetaStoreError;
use crate::path_codec::{PathCodec, TileKey};
use crate::METATILE;

const MAGIC: &[u8; 4] = b"META";

struct IndexEntry {
	offset: u32,
	size: u32,
}

struct MetaLayout {
	x: u32,
	y: u32,
	z: u32,
	index: Vec<IndexEntry>,
}

fn header_size(count: u32) -> usize {
	4 + 4 + 4 + 4 + 4 + (count as usize) * 8
}

impl MetaLayout {
	fn read(path: &Path, file: &mut File) -> Result<MetaLayout, MetaStoreError> {
		let expected_count = METATILE * METATILE;
		let needed = header_size(expected_count);
		let mut header = vec![0u8; needed];
		let mut pos = 0usize;
		loop {
			let got = file.read(&mut header[pos..]).map_err(|source| MetaStoreError::Read { path: path.to_path_buf(), source })?;
			if got == 0 {
				break;
			}
			pos += got;
			if pos >= needed {
				break;
			}
		}
		if pos < needed {
			return Err(MetaStoreError::HeaderTooShort { path: path.to_path_buf(), got: pos, needed });
		}

		let mut cursor: &[u8] = &header;
		let mut magic = [0u8; 4];
		cursor.read_exact(&mut magic).expect("header length checked above");
		if &magic != MAGIC {
			return Err(MetaStoreError::MagicMismatch { path: path.to_path_buf() });
		}
		let count = cursor.read_u32::<LittleEndian>().expect("header length checked above");
		if count != expected_count {
			return Err(MetaStoreError::CountMismatch { path: path.to_path_buf(), got: count, expected: expected_count });
		}
		let x = cursor.read_u32::<LittleEndian>().expect("header length checked above");
		let y = cursor.read_u32::<LittleEndian>().expect("header length checked above");
		let z = cursor.read_u32::<LittleEndian>().expect("header length checked above");
		let mut index = Vec::with_capacity(count as usize);
		for _ in 0..count {
			let offset = cursor.read_u32::<LittleEndian>().expect("header length checked above");
			let size = cursor.read_u32::<LittleEndian>().expect("header length checked above");
			index.push(IndexEntry { offset, size });
		}
		Ok(MetaLayout { x, y, z, index })
	}
}

/// Reads tiles from, and builds, metatile bundle files.
#[derive(Debug, Clone)]
pub struct MetaStore {
	codec: PathCodec,
}

impl MetaStore {
	pub fn new(codec: PathCodec) -> Self {
		MetaStore { codec }
	}

	/// Read one tile's body out of its containing metatile.
	///
	/// On truncation (the sub-tile's stored size exceeds `buf`'s capacity) the read is
	/// silently capped and the truncated byte count is returned — callers decide whether
	/// that's acceptable.
	pub fn read(&self, key: &TileKey, buf: &mut Vec<u8>) -> Result<usize, MetaStoreError> {
		let (meta_path, sub_index) = self.codec.meta_path(key);
		let mut file = File::open(&meta_path).map_err(|source| MetaStoreError::Open { path: meta_path.clone(), source })?;
		let layout = MetaLayout::read(&meta_path, &mut file)?;

		let entry = layout
			.index
			.get(sub_index as usize)
			.ok_or(MetaStoreError::IndexOutOfRange { index: sub_index, count: layout.index.len() as u32 })?;

		if entry.size == 0 {
			buf.clear();
			return Ok(0);
		}

		file
			.seek(SeekFrom::Start(entry.offset as u64))
			.map_err(|source| MetaStoreError::Seek { path: meta_path.clone(), offset: entry.offset as u64, source })?;

		let to_read = (entry.size as usize).min(buf.capacity());
		buf.clear();
		buf.resize(to_read, 0);
		let mut pos = 0usize;
		while pos < to_read {
			let got = file
				.read(&mut buf[pos..])
				.map_err(|source| MetaStoreError::Read { path: meta_path.clone(), source })?;
			if got == 0 {
				log::warn!("metatile {meta_path:?} truncated at {pos} of {to_read} bytes for sub-tile {sub_index}");
				break;
			}
			pos += got;
		}
		buf.truncate(pos);
		let _ = layout.x;
		let _ = layout.y;
		let _ = layout.z;
		Ok(pos)
	}

	/// Pack the `METATILE × METATILE` block of individual tile files containing `meta_key`
	/// into a single metatile file, then delete the source tiles.
	///
	/// Any sub-tile read failure aborts the whole operation without touching the filesystem;
	/// tile count is bounded by `2^z` at low zoom levels, where fewer than `METATILE²` tiles exist.
	pub fn pack(&self, meta_key: &TileKey) -> Result<(), MetaStoreError> {
		let limit = (1u32 << meta_key.z).min(METATILE);
		let meta = meta_key.to_meta_key();

		let mut payloads: Vec<(u32, Vec<u8>, PathBuf)> = Vec::with_capacity((METATILE * METATILE) as usize);
		for ox in 0..limit {
			for oy in 0..limit {
				let sub = TileKey { style: meta.style.clone(), z: meta.z, x: meta.x + ox, y: meta.y + oy, layer: meta.layer };
				let path = self.codec.tile_path(&sub);
				let bytes = fs::read(&path).map_err(|source| MetaStoreError::Read { path: path.clone(), source })?;
				let offset = sub.meta_offset();
				payloads.push((offset, bytes, path));
			}
		}

		// Sort by sub-tile index so the packed body and the index table agree on order
		// regardless of the (ox, oy) traversal order above (matters when `limit < METATILE`
		// at low zoom levels, where sub-tile indices aren't contiguous from 0).
		payloads.sort_by_key(|(offset, _, _)| *offset);

		let count = METATILE * METATILE;
		let mut sizes = vec![0u32; count as usize];
		let mut file_offsets = vec![0u32; count as usize];
		let mut body = Vec::new();
		let mut running = header_size(count) as u32;
		for (offset, bytes, _) in &payloads {
			sizes[*offset as usize] = bytes.len() as u32;
			file_offsets[*offset as usize] = running;
			running += bytes.len() as u32;
			body.extend_from_slice(bytes);
		}

		let (meta_path, _) = self.codec.meta_path(&meta);
		let mut header = Vec::with_capacity(header_size(count));
		header.extend_from_slice(MAGIC);
		header.write_u32::<LittleEndian>(count).unwrap();
		header.write_u32::<LittleEndian>(meta.x).unwrap();
		header.write_u32::<LittleEndian>(meta.y).unwrap();
		header.write_u32::<LittleEndian>(meta.z).unwrap();
		for i in 0..count as usize {
			header.write_u32::<LittleEndian>(file_offsets[i]).unwrap();
			header.write_u32::<LittleEndian>(sizes[i]).unwrap();
		}

		PathCodec::mkdirp(&meta_path).map_err(|source| MetaStoreError::Open { path: meta_path.clone(), source })?;
		let tmp_path = meta_path.with_extension(format!("meta.tmp.{}", std::process::id()));
		{
			let mut tmp = File::create(&tmp_path).map_err(|source| MetaStoreError::Open { path: tmp_path.clone(), source })?;
			tmp.write_all(&header).map_err(|source| MetaStoreError::Read { path: tmp_path.clone(), source })?;
			tmp.write_all(&body).map_err(|source| MetaStoreError::Read { path: tmp_path.clone(), source })?;
			tmp.sync_all().map_err(|source| MetaStoreError::Read { path: tmp_path.clone(), source })?;
		}

		// Copy the mtime of the first sub-tile onto the metatile before the atomic rename.
		if let Some((_, _, first_path)) = payloads.first() {
			if let Ok(meta_info) = fs::metadata(first_path) {
				if let Ok(mtime) = meta_info.modified() {
					let _ = filetime_set(&tmp_path, mtime);
				}
			}
		}

		fs::rename(&tmp_path, &meta_path).map_err(|source| MetaStoreError::Open { path: meta_path.clone(), source })?;

		for (_, _, path) in &payloads {
			let _ = fs::remove_file(path);
		}
		Ok(())
	}

	/// Explode a metatile file back into individual flat-mode tile files, copying the
	/// metatile's mtime onto each, then remove the metatile.
	pub fn unpack(&self, meta_path: &Path) -> Result<(), MetaStoreError> {
		let meta_key = self
			.codec
			.parse_path(meta_path)
			.map_err(|_| MetaStoreError::MagicMismatch { path: meta_path.to_path_buf() })?;

		let mut file = File::open(meta_path).map_err(|source| MetaStoreError::Open { path: meta_path.to_path_buf(), source })?;
		let layout = MetaLayout::read(meta_path, &mut file)?;

		let limit = (1u32 << meta_key.z).min(METATILE);
		let mtime = fs::metadata(meta_path).ok().and_then(|m| m.modified().ok());

		for ox in 0..limit {
			for oy in 0..limit {
				let sub = TileKey { style: meta_key.style.clone(), z: meta_key.z, x: meta_key.x + ox, y: meta_key.y + oy, layer: meta_key.layer };
				let offset = sub.meta_offset();
				let entry = &layout.index[offset as usize];
				if entry.size == 0 {
					log::warn!("meta {meta_path:?}: sub-tile {offset} missing, skipping unpack");
					continue;
				}
				file
					.seek(SeekFrom::Start(entry.offset as u64))
					.map_err(|source| MetaStoreError::Seek { path: meta_path.to_path_buf(), offset: entry.offset as u64, source })?;
				let mut payload = vec![0u8; entry.size as usize];
				file.read_exact(&mut payload).map_err(|source| MetaStoreError::Read { path: meta_path.to_path_buf(), source })?;

				let tile_path = self.codec.tile_path(&sub);
				PathCodec::mkdirp(&tile_path).map_err(|source| MetaStoreError::Open { path: tile_path.clone(), source })?;
				fs::write(&tile_path, &payload).map_err(|source| MetaStoreError::Read { path: tile_path.clone(), source })?;
				if let Some(mtime) = mtime {
					let _ = filetime_set(&tile_path, mtime);
				}
			}
		}

		fs::remove_file(meta_path).map_err(|source| MetaStoreError::Open { path: meta_path.to_path_buf(), source })?;
		Ok(())
	}
}

/// Set a file's mtime without pulling in a dedicated crate: `std::fs` has no portable
/// mtime setter, so this shells out to the same effect via `File::set_modified`
/// (stable since Rust 1.75, matching the teacher's minimum-supported-Rust baseline).
fn filetime_set(path: &Path, mtime: std::time::SystemTime) -> std::io::Result<()> {
	let file = fs::OpenOptions::new().write(true).open(path)?;
	file.set_modified(mtime)
}
