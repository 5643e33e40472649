//! ONNX Runtime session (feature `onnx`).

use std::path::Path;

use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::error::{MarEyeError, Result};

use super::neural::InferenceSession;

pub struct OrtSession {
    session: Session,
}

impl OrtSession {
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading ONNX model from {:?}", path);

        let session = Session::builder()
            .map_err(|e| MarEyeError::Inference(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MarEyeError::Inference(format!("Failed to set optimization level: {e}")))?
            .commit_from_file(path)
            .map_err(|e| MarEyeError::Inference(format!("Failed to load model: {e}")))?;

        for input in session.inputs.iter() {
            debug!("Model input {}: {:?}", input.name, input.input_type);
        }

        Ok(Self { session })
    }
}

impl InferenceSession for OrtSession {
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>> {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_array((shape, data))
            .map_err(|e| MarEyeError::Inference(format!("Failed to create tensor: {e}")))?;

        let input_name = self
            .session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());

        let outputs = self
            .session
            .run(ort::inputs![input_name => tensor].map_err(|e| {
                MarEyeError::Inference(format!("Failed to create inputs: {e}"))
            })?)
            .map_err(|e| MarEyeError::Inference(format!("Inference failed: {e}")))?;

        let (_name, value) = outputs
            .into_iter()
            .next()
            .ok_or_else(|| MarEyeError::Inference("No output from model".to_string()))?;

        let (dims, values) = value
            .try_extract_raw_tensor::<f32>()
            .map_err(|e| MarEyeError::Inference(format!("Failed to extract output: {e}")))?;

        if dims.len() != 4 {
            return Err(MarEyeError::Inference(format!(
                "expected a 4-D output, got {} dimensions",
                dims.len()
            )));
        }
        let dim = |i: usize| dims[i].max(0) as usize;
        Array4::from_shape_vec((dim(0), dim(1), dim(2), dim(3)), values.to_vec())
            .map_err(|e| MarEyeError::Inference(format!("Bad output tensor: {e}")))
    }
}
