use eframe::egui;

use crate::error::{Result, StyleError};

/// Small modal-ish window with width/height fields and a Confirm button.  Bad input is
/// reported inline and the dialog stays open; the caller applies a confirmed resolution
/// to the matching asset.
pub struct ResizeDialog {
	title: &'static str,
	open: bool,
	width_text: String,
	height_text: String,
	error: Option<String>,
}

impl ResizeDialog {
	pub fn new(title: &'static str) -> Self {
		ResizeDialog {
			title,
			open: false,
			width_text: String::new(),
			height_text: String::new(),
			error: None,
		}
	}

	pub fn open_with(&mut self, current: Option<(u32, u32)>) {
		if let Some((w, h)) = current {
			self.width_text = w.to_string();
			self.height_text = h.to_string();
		}
		self.error = None;
		self.open = true;
	}

	/// Draw the dialog if open.  Returns the new resolution once the user confirms a
	/// valid one.
	pub fn show(&mut self, ctx: &egui::Context) -> Option<(u32, u32)> {
		if !self.open {
			return None;
		}

		let mut confirmed = None;
		let mut stay_open = true;
		egui::Window::new(self.title)
			.open(&mut stay_open)
			.collapsible(false)
			.resizable(false)
			.show(ctx, |ui| {
				ui.horizontal(|ui| {
					ui.label("Width:");
					ui.text_edit_singleline(&mut self.width_text);
				});
				ui.horizontal(|ui| {
					ui.label("Height:");
					ui.text_edit_singleline(&mut self.height_text);
				});
				if let Some(err) = &self.error {
					ui.colored_label(egui::Color32::RED, err);
				}
				if ui.button("Confirm").clicked() {
					match parse_resolution(&self.width_text, &self.height_text) {
						Ok(resolution) => confirmed = Some(resolution),
						Err(e) => self.error = Some(e.to_string()),
					}
				}
			});

		if confirmed.is_some() || !stay_open {
			self.open = false;
		}
		confirmed
	}
}

/// Positive integers only; anything else comes back as InvalidResolution.
pub fn parse_resolution(width: &str, height: &str) -> Result<(u32, u32)> {
	let invalid = || StyleError::InvalidResolution {
		width: width.trim().to_string(),
		height: height.trim().to_string(),
	};
	let w: u32 = width.trim().parse().map_err(|_| invalid())?;
	let h: u32 = height.trim().parse().map_err(|_| invalid())?;
	if w == 0 || h == 0 {
		return Err(invalid());
	}
	Ok((w, h))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_accepts_positive_integers() {
		assert_eq!(parse_resolution("300", " 200 ").unwrap(), (300, 200));
	}

	#[test]
	fn test_parse_rejects_bad_input() {
		for (w, h) in [("0", "100"), ("100", "0"), ("-3", "100"), ("abc", "100"), ("", "")] {
			let err = parse_resolution(w, h).unwrap_err();
			assert!(matches!(err, StyleError::InvalidResolution { .. }), "{}x{}", w, h);
		}
	}
}
