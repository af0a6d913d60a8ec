///
/// model.rs
/// Wrapper around the frozen arbitrary-image-stylization network.  The ONNX graph is
/// parsed once at startup; tract wants concrete input shapes before it can optimize,
/// and the content resolution changes from run to run, so the graph is specialized
/// lazily per resolution pair and the resulting plans are cached.
///

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tract_onnx::prelude::tract_ndarray::{Array3, Axis, Ix4};
use tract_onnx::prelude::*;

use crate::error::{Result, StyleError};

pub const DEFAULT_MODEL_PATH: &str = "models/arbitrary-image-stylization-v1-256.onnx";

type StylePlan = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// (content_h, content_w, style_h, style_w)
type PlanKey = (usize, usize, usize, usize);

#[derive(Debug)]
pub struct StyleModel {
	graph: InferenceModel,
	plans: Mutex<HashMap<PlanKey, Arc<StylePlan>>>,
}

impl StyleModel {
	/// Parse the model artifact from disk.  This is a startup cost, paid once; a missing
	/// artifact is a reportable condition rather than a crash.
	pub fn load(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Err(StyleError::ModelNotFound { path: path.to_path_buf() });
		}
		let started = Instant::now();
		let graph = tract_onnx::onnx().model_for_path(path)?;
		log::info!("Parsed style model {} in {:?}", path.display(), started.elapsed());
		Ok(StyleModel {
			graph,
			plans: Mutex::new(HashMap::new()),
		})
	}

	/// Run one stylization pass.  Both inputs must already be normalized [0,1] buffers at
	/// the resolutions the caller wants; the model does no resizing of its own.  The
	/// generated image comes back at the content resolution.
	pub fn infer(&self, content: &Array3<f32>, style: &Array3<f32>) -> Result<Array3<f32>> {
		let (content_h, content_w, _) = content.dim();
		let (style_h, style_w, _) = style.dim();
		let plan = self.plan_for((content_h, content_w, style_h, style_w))?;

		let content_batch = content.to_owned().insert_axis(Axis(0));
		let style_batch = style.to_owned().insert_axis(Axis(0));

		let started = Instant::now();
		let outputs = plan.run(tvec!(
			Tensor::from(content_batch).into(),
			Tensor::from(style_batch).into()
		))?;
		log::info!(
			"Stylized {}x{} content with {}x{} style in {:?}",
			content_w, content_h, style_w, style_h,
			started.elapsed()
		);

		let generated = outputs[0]
			.to_array_view::<f32>()?
			.to_owned()
			.into_dimensionality::<Ix4>()
			.map_err(anyhow::Error::from)?;
		Ok(generated.index_axis_move(Axis(0), 0))
	}

	fn plan_for(&self, key: PlanKey) -> Result<Arc<StylePlan>> {
		let mut plans = self.plans.lock();
		if let Some(plan) = plans.get(&key) {
			return Ok(plan.clone());
		}

		let (content_h, content_w, style_h, style_w) = key;
		let plan = self
			.graph
			.clone()
			.with_input_fact(
				0,
				InferenceFact::dt_shape(f32::datum_type(), tvec!(1, content_h, content_w, 3)),
			)?
			.with_input_fact(
				1,
				InferenceFact::dt_shape(f32::datum_type(), tvec!(1, style_h, style_w, 3)),
			)?
			.into_optimized()?
			.into_runnable()?;
		let plan = Arc::new(plan);
		plans.insert(key, plan.clone());
		Ok(plan)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_artifact_is_model_not_found() {
		let err = StyleModel::load(Path::new("models/does-not-exist.onnx")).unwrap_err();
		assert!(matches!(err, StyleError::ModelNotFound { .. }));
		assert!(err.to_string().contains("does-not-exist.onnx"));
	}
}
