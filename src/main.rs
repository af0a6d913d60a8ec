use std::path::PathBuf;
use std::sync::Arc;

use restyle::model::{StyleModel, DEFAULT_MODEL_PATH};
use restyle::ui::app::StyleApp;

fn main() -> Result<(), eframe::Error> {
	env_logger::init();

	let model_path = PathBuf::from(
		std::env::var("RESTYLE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string()),
	);
	// A missing artifact shouldn't keep the window from opening; generation stays
	// unavailable and the error is shown again on every attempt.
	let model = match StyleModel::load(&model_path) {
		Ok(m) => Some(Arc::new(m)),
		Err(e) => {
			log::error!("{}", e);
			None
		}
	};

	let native_options = eframe::NativeOptions {
		viewport: eframe::egui::ViewportBuilder::default()
			.with_inner_size([1100.0, 720.0])
			.with_min_inner_size([640.0, 480.0]),
		..Default::default()
	};
	eframe::run_native(
		"Style Transfer",
		native_options,
		Box::new(move |_cc| Box::new(StyleApp::new(model, model_path))),
	)
}
