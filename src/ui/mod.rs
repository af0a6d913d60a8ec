pub mod app;
pub mod resize_dialog;

use eframe::egui::{self, ColorImage};
use tract_onnx::prelude::tract_ndarray::Array3;

use crate::asset::buffer_to_rgb_image;

/// The previews are drawn from the working buffers, not the files on disk, so what the
/// user sees is exactly what the network will be fed.
pub fn buffer_to_color_image(buffer: &Array3<f32>) -> ColorImage {
	let (h, w, _) = buffer.dim();
	let rgb = buffer_to_rgb_image(buffer);
	ColorImage::from_rgb([w, h], rgb.as_raw())
}

/// Largest size with `image_size`'s aspect ratio that fits inside `avail`.
pub fn fit_size(image_size: egui::Vec2, avail: egui::Vec2) -> egui::Vec2 {
	if image_size.x <= 0.0 || image_size.y <= 0.0 {
		return egui::Vec2::ZERO;
	}
	let scale = (avail.x / image_size.x).min(avail.y / image_size.y);
	image_size * scale.max(0.0)
}
