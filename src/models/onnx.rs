//! ONNX Runtime classifier backend
//!
//! Serves classifiers exported with skl2onnx or onnxmltools. A single session
//! run yields both the `label` output and the class probabilities.

use crate::error::{Result, ScoringError};
use crate::models::classifier::{Classifier, ClassifierOutput};
use crate::types::verdict::FraudClass;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier backed by an ONNX Runtime session.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    label_output: Option<String>,
    probability_output: String,
    input_dim: usize,
}

impl OnnxClassifier {
    /// Load a model file. `input_dim` is the feature count it was exported with.
    pub fn load<P: AsRef<Path>>(path: P, name: &str, input_dim: usize, threads: usize) -> anyhow::Result<Self> {
        let path = path.as_ref();
        ort::init().commit()?;

        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load model from {}: {}", path.display(), e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            label = ?label_output,
            probabilities = %probability_output,
            "ONNX model loaded"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
            input_dim,
        })
    }

    fn run(&self, features: &[f64]) -> Result<ClassifierOutput> {
        if features.len() != self.input_dim {
            return Err(ScoringError::SchemaMismatch {
                expected: self.input_dim,
                actual: features.len(),
            });
        }

        // Exported models take float32 input of shape [1, n_features].
        let data: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, data)).map_err(|e| self.failure(e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| self.failure(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| self.failure(e))?;

        let probability = self.extract_probability(&outputs)?;
        let class = match &self.label_output {
            Some(label_name) => self.extract_label(&outputs, label_name)?,
            None => {
                if probability >= 0.5 {
                    FraudClass::Fraud
                } else {
                    FraudClass::Legitimate
                }
            }
        };

        debug!(model = %self.name, probability = probability, class = ?class, "ONNX inference complete");

        Ok(ClassifierOutput { class, probability })
    }

    fn failure(&self, details: impl ToString) -> ScoringError {
        ScoringError::inference_failed(&self.name, details.to_string())
    }

    fn extract_label(&self, outputs: &SessionOutputs, label_name: &str) -> Result<FraudClass> {
        let output = outputs
            .get(label_name)
            .ok_or_else(|| self.failure(format!("missing output `{label_name}`")))?;
        let (_, data) = output
            .try_extract_tensor::<i64>()
            .map_err(|e| self.failure(e))?;
        data.first()
            .map(|&label| FraudClass::from_label(label))
            .ok_or_else(|| self.failure("empty label tensor"))
    }

    /// Probability of class 1 from either a `[1, n_classes]` tensor or a
    /// `seq(map(int64, float))` output.
    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64> {
        let output = outputs
            .get(self.probability_output.as_str())
            .ok_or_else(|| self.failure(format!("missing output `{}`", self.probability_output)))?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let classes = dims.last().copied().unwrap_or(1);
            let prob = if classes >= 2 { data.get(1) } else { data.first() };
            return prob
                .map(|&p| p as f64)
                .ok_or_else(|| self.failure("empty probability tensor"));
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return self.extract_from_sequence_map(output);
        }

        Err(self.failure("unsupported probability output type"))
    }

    fn extract_from_sequence_map(&self, output: &DynValue) -> Result<f64> {
        let allocator = Allocator::default();
        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| self.failure(e))?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(|e| self.failure(e))?;
        let first = maps.first().ok_or_else(|| self.failure("empty sequence"))?;
        let pairs = first
            .try_extract_key_values::<i64, f32>()
            .map_err(|e| self.failure(e))?;

        if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
            return Ok(*p as f64);
        }
        if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 0) {
            return Ok(1.0 - *p as f64);
        }
        Err(self.failure("no class probabilities in map"))
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, features: &[f64]) -> Result<FraudClass> {
        Ok(self.run(features)?.class)
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64> {
        Ok(self.run(features)?.probability)
    }

    fn evaluate(&self, features: &[f64]) -> Result<ClassifierOutput> {
        self.run(features)
    }
}
