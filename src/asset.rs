///
/// asset.rs
/// One loaded image slot: the original decoded pixels, the role-dependent target
/// resolution, and the normalized float buffer that actually feeds the network.
/// The original pixels are kept around so every resize re-derives from them instead
/// of resampling an already-resampled buffer.
///

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use tract_onnx::prelude::tract_ndarray::Array3;

use crate::error::{Result, StyleError};

/// The stylization network was trained on 256x256 style crops and generally works
/// best at that size, so style inputs default to it.
pub const STYLE_TRAINING_RESOLUTION: (u32, u32) = (256, 256);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRole {
	Content,
	Style,
	Generated,
}

impl ImageRole {
	fn default_target(self) -> Option<(u32, u32)> {
		match self {
			ImageRole::Style => Some(STYLE_TRAINING_RESOLUTION),
			ImageRole::Content | ImageRole::Generated => None,
		}
	}
}

pub struct ImageAsset {
	path: Option<PathBuf>,
	original: Option<DynamicImage>,
	original_resolution: Option<(u32, u32)>,
	target_resolution: Option<(u32, u32)>,
	buffer: Option<Array3<f32>>,
}

impl ImageAsset {
	pub fn new(role: ImageRole) -> Self {
		ImageAsset {
			path: None,
			original: None,
			original_resolution: None,
			target_resolution: role.default_target(),
			buffer: None,
		}
	}

	/// Decode an image file into this slot, normalize it to [0,1] floats, and resize it
	/// to the slot's current target resolution (native if none is set).  On failure the
	/// slot keeps whatever it held before.
	pub fn load(&mut self, path: &Path) -> Result<()> {
		let decoded = image::open(path).map_err(|source| StyleError::Decode {
			path: path.to_path_buf(),
			source,
		})?;
		let resolution = (decoded.width(), decoded.height());

		// Commit only after the decode succeeded.  The stored path is canonicalized so
		// every later reference to the file resolves the same way.
		self.buffer = Some(derive_buffer(&decoded, self.target_resolution));
		self.original = Some(decoded);
		self.original_resolution = Some(resolution);
		self.path = Some(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()));
		Ok(())
	}

	/// Change the working resolution.  Re-derives the buffer from the original decoded
	/// pixels; resampling the in-memory buffer again would compound interpolation loss
	/// across repeated resizes.
	pub fn set_target_resolution(&mut self, width: u32, height: u32) -> Result<()> {
		if width == 0 || height == 0 {
			return Err(StyleError::InvalidResolution {
				width: width.to_string(),
				height: height.to_string(),
			});
		}
		self.target_resolution = Some((width, height));
		if let Some(original) = &self.original {
			self.buffer = Some(derive_buffer(original, self.target_resolution));
		}
		Ok(())
	}

	pub fn ready(&self) -> bool {
		self.buffer.is_some()
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn buffer(&self) -> Option<&Array3<f32>> {
		self.buffer.as_ref()
	}

	pub fn original_resolution(&self) -> Option<(u32, u32)> {
		self.original_resolution
	}

	/// Resolution of the working buffer as (width, height).
	pub fn resolution(&self) -> Option<(u32, u32)> {
		self.buffer.as_ref().map(|b| {
			let (h, w, _) = b.dim();
			(w as u32, h as u32)
		})
	}
}

fn derive_buffer(original: &DynamicImage, target: Option<(u32, u32)>) -> Array3<f32> {
	match target {
		Some((w, h)) if (w, h) != (original.width(), original.height()) => {
			normalize(&original.resize_exact(w, h, FilterType::Triangle))
		}
		_ => normalize(original),
	}
}

/// Decoded integer pixels to an (h, w, 3) float array with samples in [0,1].
pub fn normalize(img: &DynamicImage) -> Array3<f32> {
	let rgb = img.to_rgb8();
	let (w, h) = rgb.dimensions();
	Array3::from_shape_fn((h as usize, w as usize, 3), |(y, x, c)| {
		rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
	})
}

/// Inverse of `normalize`: clamp to [0,1], scale back to bytes.
pub fn buffer_to_rgb_image(buffer: &Array3<f32>) -> RgbImage {
	let (h, w, _) = buffer.dim();
	let mut raw = Vec::with_capacity(h * w * 3);
	for v in buffer.iter() {
		raw.push((v * 255.0).round().clamp(0.0, 255.0) as u8);
	}
	RgbImage::from_raw(w as u32, h as u32, raw)
		.unwrap_or_else(|| RgbImage::new(w as u32, h as u32))
}

/// Convert a path into a canonical string with forward slashes.  Every place that keeps
/// a path as a string goes through here so comparisons behave.
pub fn stringify_filepath(path: &Path) -> String {
	let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
	canonical.display().to_string().replace('\\', "/")
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use image::{Rgb, RgbImage};

	use super::*;
	use crate::error::StyleError;

	fn write_test_image(tag: &str, w: u32, h: u32) -> PathBuf {
		let img = RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 128]));
		let path = std::env::temp_dir().join(format!("restyle_{}_{}_{}x{}.png", tag, std::process::id(), w, h));
		img.save(&path).unwrap();
		path
	}

	#[test]
	fn test_load_normalizes_to_unit_range() {
		let path = write_test_image("normalize", 40, 30);
		let mut asset = ImageAsset::new(ImageRole::Content);
		asset.load(&path).unwrap();

		assert!(asset.ready());
		assert_eq!(asset.original_resolution(), Some((40, 30)));
		let buffer = asset.buffer().unwrap();
		assert_eq!(buffer.dim(), (30, 40, 3));
		assert!(buffer.iter().all(|v| (0.0..=1.0).contains(v)));
	}

	#[test]
	fn test_style_defaults_to_training_resolution() {
		let path = write_test_image("style_default", 100, 80);
		let mut asset = ImageAsset::new(ImageRole::Style);
		asset.load(&path).unwrap();

		assert_eq!(asset.resolution(), Some(STYLE_TRAINING_RESOLUTION));
		let buffer = asset.buffer().unwrap();
		assert_eq!(buffer.dim(), (256, 256, 3));
	}

	#[test]
	fn test_resize_matches_requested_shape() {
		let path = write_test_image("resize_shape", 64, 48);
		let mut asset = ImageAsset::new(ImageRole::Content);
		asset.load(&path).unwrap();

		asset.set_target_resolution(20, 12).unwrap();
		assert_eq!(asset.buffer().unwrap().dim(), (12, 20, 3));
	}

	#[test]
	fn test_repeated_resizes_do_not_compound() {
		let path = write_test_image("recompound", 64, 48);

		let mut bounced = ImageAsset::new(ImageRole::Content);
		bounced.load(&path).unwrap();
		bounced.set_target_resolution(8, 8).unwrap();
		bounced.set_target_resolution(32, 24).unwrap();

		let mut fresh = ImageAsset::new(ImageRole::Content);
		fresh.load(&path).unwrap();
		fresh.set_target_resolution(32, 24).unwrap();

		// Both derive from the original decoded pixels, so the detour through 8x8
		// must leave no trace.
		assert_eq!(bounced.buffer().unwrap(), fresh.buffer().unwrap());
	}

	#[test]
	fn test_zero_resolution_rejected() {
		let mut asset = ImageAsset::new(ImageRole::Content);
		match asset.set_target_resolution(0, 100) {
			Err(StyleError::InvalidResolution { .. }) => {}
			other => panic!("expected InvalidResolution, got {:?}", other),
		}
	}

	#[test]
	fn test_failed_load_preserves_previous_state() {
		let path = write_test_image("preserve", 16, 16);
		let mut asset = ImageAsset::new(ImageRole::Content);
		asset.load(&path).unwrap();

		let err = asset.load(Path::new("/no/such/image.png")).unwrap_err();
		assert!(matches!(err, StyleError::Decode { .. }));
		assert!(asset.ready());
		assert_eq!(asset.path(), Some(path.canonicalize().unwrap().as_path()));
	}

	#[test]
	fn test_buffer_round_trips_to_bytes() {
		let path = write_test_image("roundtrip", 10, 10);
		let mut asset = ImageAsset::new(ImageRole::Content);
		asset.load(&path).unwrap();

		let img = buffer_to_rgb_image(asset.buffer().unwrap());
		assert_eq!(img.dimensions(), (10, 10));
		assert_eq!(img.get_pixel(3, 7)[2], 128);
	}
}
