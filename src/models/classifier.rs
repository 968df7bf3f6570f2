//! Classifier capability consumed by the scoring engine

use crate::error::Result;
use crate::schema::FeatureSchema;
use crate::types::verdict::FraudClass;

/// Discrete class and class-1 probability from a single model evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOutput {
    pub class: FraudClass,
    pub probability: f64,
}

/// A fitted binary fraud classifier.
///
/// Implementations are shared read-only across concurrent requests.
pub trait Classifier: Send + Sync {
    /// Model name used in logs and verdict events.
    fn name(&self) -> &str;

    /// Number of features the model was fitted on.
    fn input_dim(&self) -> usize;

    /// Feature schema the model was fitted against.
    fn schema(&self) -> FeatureSchema {
        FeatureSchema::CURRENT
    }

    fn predict(&self, features: &[f64]) -> Result<FraudClass>;

    /// Probability of the fraud class, in `[0, 1]`.
    fn predict_probability(&self, features: &[f64]) -> Result<f64>;

    /// Both outputs from one model call.
    ///
    /// Verdicts are built from this alone. The class and probability must
    /// come from the same evaluation of the model.
    fn evaluate(&self, features: &[f64]) -> Result<ClassifierOutput>;
}
