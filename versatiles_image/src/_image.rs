use crate::{avif, jpeg, png, webp};
use anyhow::{Result, anyhow, bail, ensure};
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, EncodableLayout, ExtendedColorType, ImageBuffer, Luma, LumaA, Rgb, Rgba, imageops::overlay};
use imageproc::map::map_colors;
use std::{ops::Div, vec};
use versatiles_core::{Blob, TileFormat};

pub trait EnhancedDynamicImageTrait {
	fn from_fn_l8(width: u32, height: u32, f: fn(u32, u32) -> u8) -> DynamicImage;
	fn from_fn_la8(width: u32, height: u32, f: fn(u32, u32) -> [u8; 2]) -> DynamicImage;
	fn from_fn_rgb8(width: u32, height: u32, f: fn(u32, u32) -> [u8; 3]) -> DynamicImage;
	fn from_fn_rgba8(width: u32, height: u32, f: fn(u32, u32) -> [u8; 4]) -> DynamicImage;
	fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<DynamicImage>;
	fn pixels(&self) -> impl Iterator<Item = &[u8]>;

	fn ensure_same_meta(&self, other: &DynamicImage) -> Result<()>;
	fn ensure_same_size(&self, other: &DynamicImage) -> Result<()>;

	fn diff(&self, other: &DynamicImage) -> Result<Vec<f64>>;
	fn bits_per_value(&self) -> u8;
	fn channel_count(&self) -> u8;
	fn extended_color_type(&self) -> ExtendedColorType;
	fn to_blob(&self, format: TileFormat) -> Result<Blob>;
	fn from_blob(blob: &Blob, format: TileFormat) -> Result<DynamicImage>;
	fn overlay(&mut self, other: &DynamicImage) -> Result<()>;
	fn average_color(&self) -> Vec<u8>;
	fn get_scaled_down(&self, factor: u32) -> DynamicImage;
	fn into_scaled_down(self, factor: u32) -> DynamicImage;
	fn into_optional(self) -> Option<DynamicImage>;
	fn is_empty(&self) -> bool;
	fn is_opaque(&self) -> bool;
	fn get_flattened(self, color: Rgb<u8>) -> Result<DynamicImage>;

	fn new_test_rgba() -> DynamicImage;
	fn new_test_rgb() -> DynamicImage;
	fn new_test_grey() -> DynamicImage;
	fn new_test_greya() -> DynamicImage;
}

impl EnhancedDynamicImageTrait for DynamicImage {}
