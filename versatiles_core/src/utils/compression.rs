#![allow(dead_code)]

use crate::types::{
	Blob,
	TileCompression::{self, *},
};
use anyhow::{bail, Result};
use brotli::{enc::BrotliEncoderParams, BrotliCompress, BrotliDecompress};
use enumset::EnumSet;
use flate2::bufread::{GzDecoder, GzEncoder};
use std::{
	fmt::Debug,
	io::{Cursor, Read},
};

#[derive(PartialEq)]
pub struct TargetCompression {
	compressions: EnumSet<TileCompression>,
	compression_goal: CompressionGoal,
}

#[derive(Clone, Copy, PartialEq)]
pub enum CompressionGoal {
	UseFastCompression,
	UseBestCompression,
	IsIncompressible,
}

impl Debug for CompressionGoal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::UseFastCompression => write!(f, "use fast compression"),
			Self::UseBestCompression => write!(f, "use best compression"),
			Self::IsIncompressible => write!(f, "is incompressible"),
		}
	}
}

impl TargetCompression {
	pub fn from_set(compressions: EnumSet<TileCompression>) -> Self {
		TargetCompression {
			compressions,
			compression_goal: CompressionGoal::UseBestCompression,
		}
	}
	pub fn from(compression: TileCompression) -> Self {
		Self::from_set(EnumSet::only(compression))
	}
	pub fn from_none() -> Self {
		Self::from(Uncompressed)
	}
	pub fn set_fast_compression(&mut self) {
		self.compression_goal = CompressionGoal::UseFastCompression;
	}
	pub fn set_incompressible(&mut self) {
		self.compression_goal = CompressionGoal::IsIncompressible;
	}
	pub fn contains(&self, compression: TileCompression) -> bool {
		self.compressions.contains(compression)
	}
	pub fn insert(&mut self, compression: TileCompression) {
		self.compressions.insert(compression);
	}
}

impl Debug for TargetCompression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_fmt(format_args!(
			"TargetCompression {{ allow: {}, use_best_compression: {:?} }}",
			&self.compressions.to_string(),
			&self.compression_goal
		))
	}
}

pub fn optimize_compression(
	blob: Blob,
	input_compression: &TileCompression,
	target: &TargetCompression,
) -> Result<(Blob, TileCompression)> {
	if target.compressions.is_empty() {
		bail!("at least one compression must be allowed");
	}

	if !target.compressions.contains(Uncompressed) {
		bail!("'Uncompressed' must always be supported");
	}

	use CompressionGoal::*;

	if target.compression_goal != UseBestCompression && target.compressions.contains(*input_compression) {
		return Ok((blob, *input_compression));
	}

	match input_compression {
		Uncompressed => {
			if target.compression_goal != IsIncompressible {
				if target.compressions.contains(Brotli) {
					return Ok((compress_brotli(&blob)?, Brotli));
				}

				if target.compressions.contains(Gzip) {
					return Ok((compress_gzip(&blob)?, Gzip));
				}
			}

			Ok((blob, Uncompressed))
		}
		Gzip => {
			if target.compression_goal != IsIncompressible && target.compressions.contains(Brotli) {
				return Ok((compress_brotli(&decompress_gzip(&blob)?)?, Brotli));
			}

			if target.compressions.contains(Gzip) {
				return Ok((blob, Gzip));
			}

			Ok((decompress_gzip(&blob)?, Uncompressed))
		}
		Brotli => {
			if target.compressions.contains(Brotli) {
				return Ok((blob, Brotli));
			}
			let data = decompress_brotli(&blob)?;

			if target.compression_goal != IsIncompressible && target.compressions.contains(Gzip) {
				return Ok((compress_gzip(&data)?, Gzip));
			}

			Ok((data, Uncompressed))
		}
	}
}

pub fn recompress(
	mut blob: Blob,
	input_compression: &TileCompression,
	output_compression: &TileCompression,
) -> Result<Blob> {
	if input_compression == output_compression {
		return Ok(blob);
	}
	blob = decompress(blob, input_compression)?;
	blob = compress(blob, output_compression)?;
	Ok(blob)
}

/// Compresses data based on the given compression algorithm
///
/// # Arguments
///
/// * `data` - The blob of data to compress
/// * `compression` - The compression algorithm to use
pub fn compress(blob: Blob, compression: &TileCompression) -> Result<Blob> {
	match compression {
		Uncompressed => Ok(blob),
		Gzip => compress_gzip(&blob),
		Brotli => compress_brotli(&blob),
	}
}

/// Decompresses data based on the given compression algorithm
///
/// # Arguments
///
/// * `data` - The blob of data to decompress
/// * `compression` - The compression algorithm used for compression
pub fn decompress(blob: Blob, compression: &TileCompression) -> Result<Blob> {
	match compression {
		Uncompressed => Ok(blob),
		Gzip => decompress_gzip(&blob),
		Brotli => decompress_brotli(&blob),
	}
}

/// Compresses data using gzip
///
/// # Arguments
///
/// * `data` - The blob of data to compress
pub fn compress_gzip(blob: &Blob) -> Result<Blob> {
	let mut result: Vec<u8> = Vec::new();
	GzEncoder::new(blob.as_slice(), flate2::Compression::best()).read_to_end(&mut result)?;
	Ok(Blob::from(result))
}

/// Decompresses data that was compressed using gzip
///
/// # Arguments
///
/// * `data` - The blob of data to decompress
pub fn decompress_gzip(blob: &Blob) -> Result<Blob> {
	let mut result: Vec<u8> = Vec::new();
	GzDecoder::new(blob.as_slice()).read_to_end(&mut result)?;
	Ok(Blob::from(result))
}

/// Compresses data using Brotli
///
/// # Arguments
///
/// * `data` - The blob of data to compress
pub fn compress_brotli(blob: &Blob) -> Result<Blob> {
	let params = BrotliEncoderParams {
		quality: 10,
		lgwin: 19,
		size_hint: blob.len() as usize,
		..Default::default()
	};
	let mut input = Cursor::new(blob.as_slice());
	let mut output: Vec<u8> = Vec::new();
	BrotliCompress(&mut input, &mut output, &params)?;

	Ok(Blob::from(output))
}

/// Compresses data using Brotli, but faster
///
/// # Arguments
///
/// * `data` - The blob of data to compress
pub fn compress_brotli_fast(blob: &Blob) -> Result<Blob> {
	let params = BrotliEncoderParams {
		quality: 3,
		lgwin: 16,
		size_hint: blob.len() as usize,
		..Default::default()
	};
	let mut input = Cursor::new(blob.as_slice());
	let mut output: Vec<u8> = Vec::new();
	BrotliCompress(&mut input, &mut output, &params)?;

	Ok(Blob::from(output))
}

/// Decompresses data that was compressed using Brotli
///
/// # Arguments
///
/// * `data` - The blob of data to decompress
pub fn decompress_brotli(blob: &Blob) -> Result<Blob> {
	let mut cursor = Cursor::new(blob.as_slice());
	let mut result: Vec<u8> = Vec::new();
	BrotliDecompress(&mut cursor, &mut result)?;
	Ok(Blob::from(result))
}
