//! Scoring engine: classifier lifecycle and verdict production

use crate::error::{Result, ScoringError};
use crate::models::classifier::Classifier;
use crate::schema::{FeatureSchema, FeatureVector};
use crate::types::verdict::{RiskLabel, RiskVerdict};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Score a feature vector with a classifier.
///
/// The label comes from the classifier's discrete prediction, never from a
/// separately chosen probability cut-off.
pub fn score(vector: &FeatureVector, classifier: &dyn Classifier) -> Result<RiskVerdict> {
    let expected = classifier.input_dim();
    if vector.len() != expected {
        error!(
            model = %classifier.name(),
            expected = expected,
            actual = vector.len(),
            schema_version = vector.schema_version(),
            "Feature vector does not match classifier input dimension"
        );
        return Err(ScoringError::SchemaMismatch {
            expected,
            actual: vector.len(),
        });
    }

    let output = classifier.evaluate(vector.as_slice())?;
    if !(0.0..=1.0).contains(&output.probability) {
        return Err(ScoringError::inference_failed(
            classifier.name(),
            format!("probability {} is outside [0, 1]", output.probability),
        ));
    }

    let label = RiskLabel::from(output.class);

    debug!(
        model = %classifier.name(),
        label = ?label,
        probability = output.probability,
        "Vector scored"
    );

    Ok(RiskVerdict {
        label,
        probability: output.probability,
    })
}

/// A verdict together with the classifier that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedVerdict {
    pub verdict: RiskVerdict,
    /// Name of the classifier that evaluated the vector
    pub model: String,
    /// Schema of the vector the classifier actually saw
    pub schema_version: u32,
}

/// Lifecycle state of the scoring engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No classifier loaded; scoring fails with `ModelUnavailable`
    Uninitialized,
    /// A classifier is serving
    Ready,
}

/// Holds the serving classifier and scores vectors against it.
///
/// Vectors arrive in the current schema and are projected onto the schema
/// the serving classifier was fitted against. Loading publishes a new
/// classifier reference only after it validates. In-flight calls keep the
/// `Arc` they started with, so a swap never exposes a partially installed
/// model.
pub struct ScoringEngine {
    source: FeatureSchema,
    classifier: RwLock<Option<Arc<dyn Classifier>>>,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self {
            source: FeatureSchema::CURRENT,
            classifier: RwLock::new(None),
        }
    }

    pub fn state(&self) -> EngineState {
        match self.current() {
            Some(_) => EngineState::Ready,
            None => EngineState::Uninitialized,
        }
    }

    /// Name of the serving classifier, if any
    pub fn model_name(&self) -> Option<String> {
        self.current().map(|c| c.name().to_string())
    }

    fn current(&self) -> Option<Arc<dyn Classifier>> {
        // A poisoned slot still holds a fully installed reference.
        self.classifier
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Validate and install a classifier.
    ///
    /// On failure the engine keeps serving whatever it served before.
    pub fn load(&self, classifier: Arc<dyn Classifier>) -> Result<()> {
        if let Err(e) = self.validate(classifier.as_ref()) {
            warn!(
                model = %classifier.name(),
                error = %e,
                keeps_serving = ?self.model_name(),
                "Classifier rejected"
            );
            return Err(e);
        }

        let previous = {
            let mut slot = self.classifier.write().unwrap_or_else(|e| e.into_inner());
            slot.replace(classifier.clone())
        };

        match previous {
            Some(old) => info!(
                previous = %old.name(),
                model = %classifier.name(),
                "Classifier reloaded"
            ),
            None => info!(
                model = %classifier.name(),
                input_dim = classifier.input_dim(),
                schema_version = classifier.schema().version,
                "Classifier loaded"
            ),
        }
        Ok(())
    }

    fn validate(&self, classifier: &dyn Classifier) -> Result<()> {
        let fitted = classifier.schema();
        if classifier.input_dim() != fitted.len() {
            return Err(ScoringError::model_rejected(
                classifier.name(),
                format!(
                    "input dimension {} does not fit feature schema v{} ({} features)",
                    classifier.input_dim(),
                    fitted.version,
                    fitted.len()
                ),
            ));
        }
        let zeros = FeatureVector::new(self.source, vec![0.0; self.source.len()])?;
        let probe = zeros.project(fitted).map_err(|_| {
            ScoringError::model_rejected(
                classifier.name(),
                format!(
                    "feature schema v{} cannot be fed from v{} vectors",
                    fitted.version, self.source.version
                ),
            )
        })?;
        score(&probe, classifier).map(|_| ())
    }

    /// Score a vector with the serving classifier
    pub fn score(&self, vector: &FeatureVector) -> Result<RiskVerdict> {
        self.score_attributed(vector).map(|scored| scored.verdict)
    }

    /// Score a vector and report which classifier produced the verdict.
    ///
    /// The name is read from the same reference that evaluated the vector, so
    /// a concurrent reload cannot misattribute the verdict.
    pub fn score_attributed(&self, vector: &FeatureVector) -> Result<AttributedVerdict> {
        let classifier = self.current().ok_or(ScoringError::ModelUnavailable)?;
        let fitted = classifier.schema();
        let input = vector.project(fitted)?;
        let verdict = score(&input, classifier.as_ref())?;
        Ok(AttributedVerdict {
            verdict,
            model: classifier.name().to_string(),
            schema_version: fitted.version,
        })
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}
