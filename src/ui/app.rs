///
/// app.rs
/// The window shell: owns the three image slots, the model handle, and the in-flight
/// run.  All UI state mutation happens here on the UI thread; the worker only ever
/// talks back through the run's completion channel.
///

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use eframe::egui::TextureHandle;

use crate::asset::{stringify_filepath, ImageAsset, ImageRole};
use crate::error::StyleError;
use crate::model::StyleModel;
use crate::task::{GenerationRun, RunOutcome, OUTPUT_PATH};
use crate::ui::resize_dialog::ResizeDialog;
use crate::ui::{buffer_to_color_image, fit_size};

const IMAGE_FILE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Fraction of the window given to the input side; the rest is the output panel.
const INPUT_PANE_FRACTION: f32 = 0.35;

pub struct StyleApp {
	model: Option<Arc<StyleModel>>,
	model_path: PathBuf,

	content: ImageAsset,
	style: ImageAsset,
	generated: ImageAsset,

	// Idle when None, Running when Some; terminal states collapse back to None as soon
	// as the outcome has been applied.
	run: Option<GenerationRun>,

	content_texture: Option<TextureHandle>,
	style_texture: Option<TextureHandle>,
	generated_texture: Option<TextureHandle>,

	content_resize: ResizeDialog,
	style_resize: ResizeDialog,

	status: String,
}

impl StyleApp {
	pub fn new(model: Option<Arc<StyleModel>>, model_path: PathBuf) -> Self {
		let status = if model.is_some() {
			"Load a content image and a style image, then hit Generate.".to_string()
		} else {
			StyleError::ModelNotFound { path: model_path.clone() }.to_string()
		};
		StyleApp {
			model,
			model_path,
			content: ImageAsset::new(ImageRole::Content),
			style: ImageAsset::new(ImageRole::Style),
			generated: ImageAsset::new(ImageRole::Generated),
			run: None,
			content_texture: None,
			style_texture: None,
			generated_texture: None,
			content_resize: ResizeDialog::new("Resize Content Image"),
			style_resize: ResizeDialog::new("Resize Style Image"),
			status,
		}
	}

	/// Apply a finished run, if any.  This is the only place the generated slot is
	/// repopulated, and it happens strictly after the worker wrote the file.
	fn drain_run_outcome(&mut self) {
		let Some(run) = &self.run else { return };
		let Some(outcome) = run.poll() else { return };
		self.run = None;

		match outcome {
			RunOutcome::Completed { path, elapsed } => match self.generated.load(&path) {
				Ok(()) => {
					self.generated_texture = None;
					self.status = format!(
						"Saved {} ({:.1}s)",
						stringify_filepath(&path),
						elapsed.as_secs_f32()
					);
				}
				Err(e) => self.status = e.to_string(),
			},
			RunOutcome::Failed(message) => self.status = message,
		}
	}

	fn start_generation(&mut self) {
		if !can_generate(&self.content, &self.style, self.run.is_some()) {
			return;
		}
		let Some(model) = self.model.clone() else {
			// The artifact was missing at startup; surface it again at the point of use.
			self.status = StyleError::ModelNotFound { path: self.model_path.clone() }.to_string();
			return;
		};
		let (Some(content), Some(style)) = (self.content.buffer(), self.style.buffer()) else {
			return;
		};

		self.run = Some(GenerationRun::spawn(
			model,
			content.clone(),
			style.clone(),
			PathBuf::from(OUTPUT_PATH),
		));
		self.status = "Generating...".to_string();
	}

	fn inputs_ui(&mut self, ui: &mut egui::Ui, stack_horizontally: bool) {
		let avail = ui.available_size();
		let slot_size = if stack_horizontally {
			egui::vec2((avail.x / 2.0 - 8.0).max(0.0), avail.y)
		} else {
			egui::vec2(avail.x, (avail.y / 2.0 - 8.0).max(0.0))
		};

		let mut slots = |ui: &mut egui::Ui| {
			ui.allocate_ui(slot_size, |ui| {
				input_slot_ui(
					ui,
					"Content Image",
					"Load Content",
					&mut self.content,
					&mut self.content_texture,
					&mut self.content_resize,
					&mut self.status,
				);
			});
			ui.allocate_ui(slot_size, |ui| {
				input_slot_ui(
					ui,
					"Style Image",
					"Load Style",
					&mut self.style,
					&mut self.style_texture,
					&mut self.style_resize,
					&mut self.status,
				);
			});
		};

		if stack_horizontally {
			ui.horizontal(|ui| slots(ui));
		} else {
			ui.vertical(|ui| slots(ui));
		}
	}

	fn output_ui(&mut self, ui: &mut egui::Ui) {
		ui.horizontal(|ui| {
			let enabled = can_generate(&self.content, &self.style, self.run.is_some());
			if ui.add_enabled(enabled, egui::Button::new("Generate")).clicked() {
				self.start_generation();
			}
			if self.run.is_some() {
				ui.add(egui::Spinner::new());
			}
			ui.label(&self.status);
		});
		ui.add_space(4.0);
		preview_ui(ui, "Generated Image", &self.generated, &mut self.generated_texture);
	}
}

impl eframe::App for StyleApp {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		self.drain_run_outcome();
		if self.run.is_some() {
			// Keep the spinner animating and the completion channel drained.
			ctx.request_repaint_after(Duration::from_millis(100));
		}

		if let Some((w, h)) = self.content_resize.show(ctx) {
			match self.content.set_target_resolution(w, h) {
				Ok(()) => self.content_texture = None,
				Err(e) => self.status = e.to_string(),
			}
		}
		if let Some((w, h)) = self.style_resize.show(ctx) {
			match self.style.set_target_resolution(w, h) {
				Ok(()) => self.style_texture = None,
				Err(e) => self.status = e.to_string(),
			}
		}

		egui::CentralPanel::default().show(ctx, |ui| {
			let avail = ui.available_size();
			// Match the window orientation: inputs beside the output when wide,
			// stacked above it when tall.
			if avail.x >= avail.y {
				ui.horizontal(|ui| {
					ui.allocate_ui(egui::vec2(avail.x * INPUT_PANE_FRACTION, avail.y), |ui| {
						self.inputs_ui(ui, false);
					});
					ui.separator();
					ui.vertical(|ui| self.output_ui(ui));
				});
			} else {
				ui.vertical(|ui| {
					ui.allocate_ui(egui::vec2(avail.x, avail.y * INPUT_PANE_FRACTION), |ui| {
						self.inputs_ui(ui, true);
					});
					ui.separator();
					self.output_ui(ui);
				});
			}
		});
	}
}

/// Generate is available only when both inputs are ready and nothing is in flight.
/// A request while a run is active is rejected, never queued.
pub(crate) fn can_generate(content: &ImageAsset, style: &ImageAsset, run_in_flight: bool) -> bool {
	content.ready() && style.ready() && !run_in_flight
}

fn input_slot_ui(
	ui: &mut egui::Ui,
	label: &str,
	load_label: &str,
	asset: &mut ImageAsset,
	texture: &mut Option<TextureHandle>,
	resize_dialog: &mut ResizeDialog,
	status: &mut String,
) {
	ui.vertical(|ui| {
		ui.horizontal(|ui| {
			if ui.button(load_label).clicked() {
				if let Some(path) = rfd::FileDialog::new()
					.add_filter("Image Files", IMAGE_FILE_EXTENSIONS)
					.pick_file()
				{
					match asset.load(&path) {
						Ok(()) => {
							*texture = None;
							status.clear();
						}
						Err(e) => {
							// Contained to this slot; the previous image stays put.
							log::error!("{}", e);
							*status = e.to_string();
						}
					}
				}
			}
			if ui.add_enabled(asset.ready(), egui::Button::new("Resize...")).clicked() {
				resize_dialog.open_with(asset.resolution());
			}
			if let Some((w, h)) = asset.resolution() {
				ui.label(format!("{}x{}", w, h));
			}
		});
		preview_ui(ui, label, asset, texture);
	});
}

/// Draw the slot's working buffer, lazily uploading it as a texture.  Clicking a loaded
/// preview opens the backing file in the system viewer.
fn preview_ui(ui: &mut egui::Ui, name: &str, asset: &ImageAsset, texture: &mut Option<TextureHandle>) {
	if texture.is_none() {
		if let Some(buffer) = asset.buffer() {
			*texture = Some(ui.ctx().load_texture(
				name.to_string(),
				buffer_to_color_image(buffer),
				egui::TextureOptions::LINEAR,
			));
		}
	}

	match texture {
		Some(tex) => {
			let size = fit_size(tex.size_vec2(), ui.available_size());
			let response = ui.add(egui::Image::new((tex.id(), size)).sense(egui::Sense::click()));
			if response.clicked() {
				if let Some(path) = asset.path() {
					if let Err(e) = open::that(path) {
						log::warn!("Couldn't open {}: {}", path.display(), e);
					}
				}
			}
			if let Some(path) = asset.path() {
				response.on_hover_text(stringify_filepath(path));
			}
		}
		None => {
			ui.centered_and_justified(|ui| {
				ui.label(name.to_string());
			});
		}
	}
}
