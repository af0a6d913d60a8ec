///
/// task.rs
/// One background stylization run.  The worker thread does the blocking inference and
/// the file write, then reports exactly one outcome over a channel; the UI thread polls
/// that channel and does all of its own state mutation.  At most one run exists per
/// window, enforced by the caller holding `Option<GenerationRun>`.
///

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver};
use tract_onnx::prelude::tract_ndarray::Array3;

use crate::asset::buffer_to_rgb_image;
use crate::error::{Result, StyleError};
use crate::model::StyleModel;

/// Overwritten on every successful generation.
pub const OUTPUT_PATH: &str = "outputs/tmp.png";

#[derive(Debug)]
pub enum RunOutcome {
	Completed { path: PathBuf, elapsed: Duration },
	Failed(String),
}

/// Handle to an in-flight run.  Dropping it detaches the worker; a run cannot be
/// cancelled once started.
pub struct GenerationRun {
	outcome_rx: Receiver<RunOutcome>,
}

impl GenerationRun {
	/// Spawn one worker thread that stylizes `content` with `style` and writes the
	/// result to `output_path` as a PNG, creating the parent directory on demand.
	pub fn spawn(
		model: Arc<StyleModel>,
		content: Array3<f32>,
		style: Array3<f32>,
		output_path: PathBuf,
	) -> Self {
		Self::spawn_job(move || {
			let generated = model.infer(&content, &style)?;
			write_output(&generated, &output_path)?;
			Ok(output_path)
		})
	}

	/// Any error from the job is converted into a `Failed` message at this boundary;
	/// the worker thread never dies silently.
	pub(crate) fn spawn_job<F>(job: F) -> Self
	where
		F: FnOnce() -> Result<PathBuf> + Send + 'static,
	{
		let (outcome_tx, outcome_rx) = bounded(1);
		std::thread::spawn(move || {
			let started = Instant::now();
			let outcome = match job() {
				Ok(path) => RunOutcome::Completed {
					path,
					elapsed: started.elapsed(),
				},
				Err(e) => {
					log::error!("Generation failed: {}", e);
					RunOutcome::Failed(e.to_string())
				}
			};
			// The UI may have shut down; nothing left to notify in that case.
			let _ = outcome_tx.send(outcome);
		});
		GenerationRun { outcome_rx }
	}

	/// Non-blocking; returns the outcome exactly once, after the worker has finished
	/// writing the output file.  The UI polls this every frame while a run is active.
	pub fn poll(&self) -> Option<RunOutcome> {
		self.outcome_rx.try_recv().ok()
	}
}

/// Serialize a generated buffer to `path` as a PNG, creating the parent directory on
/// demand.
pub fn write_output(buffer: &Array3<f32>, path: &Path) -> Result<()> {
	if let Some(dir) = path.parent() {
		std::fs::create_dir_all(dir)?;
	}
	buffer_to_rgb_image(buffer)
		.save(path)
		.map_err(|source| StyleError::Encode {
			path: path.to_path_buf(),
			source,
		})?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wait_for_outcome(run: &GenerationRun) -> RunOutcome {
		for _ in 0..200 {
			if let Some(outcome) = run.poll() {
				return outcome;
			}
			std::thread::sleep(Duration::from_millis(10));
		}
		panic!("worker did not report an outcome in time");
	}

	#[test]
	fn test_success_reports_completed_once() {
		let run = GenerationRun::spawn_job(|| Ok(PathBuf::from("outputs/tmp.png")));
		match wait_for_outcome(&run) {
			RunOutcome::Completed { path, .. } => assert_eq!(path, PathBuf::from("outputs/tmp.png")),
			other => panic!("expected Completed, got {:?}", other),
		}
		// The channel delivers exactly one message per run.
		assert!(run.poll().is_none());
	}

	#[test]
	fn test_job_error_reports_failed() {
		let run = GenerationRun::spawn_job(|| {
			Err(StyleError::ModelNotFound {
				path: PathBuf::from("models/missing.onnx"),
			})
		});
		match wait_for_outcome(&run) {
			RunOutcome::Failed(msg) => assert!(msg.contains("models/missing.onnx")),
			other => panic!("expected Failed, got {:?}", other),
		}
	}

	#[test]
	fn test_write_output_creates_directory_and_file() {
		let buffer = Array3::<f32>::from_elem((20, 30, 3), 0.25);
		let dir = std::env::temp_dir().join(format!("restyle_out_{}", std::process::id()));
		let path = dir.join("tmp.png");
		let _ = std::fs::remove_dir_all(&dir);
		assert!(!dir.exists());

		write_output(&buffer, &path).unwrap();

		assert!(path.exists());
		let reloaded = image::open(&path).unwrap();
		assert_eq!((reloaded.width(), reloaded.height()), (30, 20));
	}

	#[test]
	fn test_outcome_arrives_after_worker_finishes() {
		let run = GenerationRun::spawn_job(|| {
			std::thread::sleep(Duration::from_millis(50));
			Ok(PathBuf::from("outputs/tmp.png"))
		});
		// Still running; nothing visible yet.
		assert!(run.poll().is_none());
		assert!(matches!(wait_for_outcome(&run), RunOutcome::Completed { .. }));
	}
}
