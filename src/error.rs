use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between picking a file and displaying a generated image.
/// Failures local to one input slot (decode, resize) stay in that slot; failures during
/// a background run are caught at the task boundary and reported, never left to kill
/// the worker thread silently.
#[derive(Error, Debug)]
pub enum StyleError {
	#[error("failed to decode image {path}: {source}")]
	Decode {
		path: PathBuf,
		#[source]
		source: image::ImageError,
	},

	#[error("failed to write image {path}: {source}")]
	Encode {
		path: PathBuf,
		#[source]
		source: image::ImageError,
	},

	#[error("invalid target resolution {width}x{height}: both sides must be positive integers")]
	InvalidResolution { width: String, height: String },

	#[error("style transfer model not found at {path}")]
	ModelNotFound { path: PathBuf },

	#[error("inference failed: {0}")]
	Inference(anyhow::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

// Tract's error type is anyhow::Error, so `?` on any tract call lands here.
impl From<anyhow::Error> for StyleError {
	fn from(e: anyhow::Error) -> Self {
		StyleError::Inference(e)
	}
}

pub type Result<T> = std::result::Result<T, StyleError>;
