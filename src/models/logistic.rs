//! Logistic regression backend

use crate::error::{Result, ScoringError};
use crate::models::classifier::{Classifier, ClassifierOutput};
use crate::schema::FeatureSchema;
use crate::types::verdict::FraudClass;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Fitted parameters as exported by the training side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Binary logistic regression over a fixed feature schema.
///
/// The decision threshold is applied to the same probability that is
/// reported, so class and probability agree by construction.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    name: String,
    schema: FeatureSchema,
    coefficients: Vec<f64>,
    intercept: f64,
    decision_threshold: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            name: "logistic_regression".to_string(),
            schema: FeatureSchema::CURRENT,
            coefficients,
            intercept,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
        }
    }

    /// Build from an artifact, checking it against its declared schema.
    pub fn from_artifact(artifact: LogisticArtifact) -> Result<Self> {
        let schema = FeatureSchema::by_version(artifact.schema_version).ok_or_else(|| {
            ScoringError::invalid_input(
                "schema_version",
                format!("unknown feature schema v{}", artifact.schema_version),
            )
        })?;
        schema.check_names(&artifact.feature_names)?;
        if artifact.coefficients.len() != schema.len() {
            return Err(ScoringError::SchemaMismatch {
                expected: schema.len(),
                actual: artifact.coefficients.len(),
            });
        }
        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ScoringError::invalid_input(
                "coefficients",
                "parameters must be finite",
            ));
        }
        Ok(Self::new(artifact.coefficients, artifact.intercept).with_schema(schema))
    }

    /// Declare the feature schema the coefficients were fitted against.
    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_decision_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ScoringError::invalid_input(
                "decision_threshold",
                format!("{threshold} is outside [0, 1]"),
            ));
        }
        self.decision_threshold = threshold;
        Ok(self)
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    fn check_dim(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.coefficients.len() {
            return Err(ScoringError::SchemaMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        Ok(())
    }

    fn probability(&self, features: &[f64]) -> f64 {
        let z = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        sigmoid(z)
    }

    fn class_for(&self, probability: f64) -> FraudClass {
        if probability >= self.decision_threshold {
            FraudClass::Fraud
        } else {
            FraudClass::Legitimate
        }
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_dim(&self) -> usize {
        self.coefficients.len()
    }

    fn schema(&self) -> FeatureSchema {
        self.schema
    }

    fn predict(&self, features: &[f64]) -> Result<FraudClass> {
        Ok(self.evaluate(features)?.class)
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64> {
        self.check_dim(features)?;
        Ok(self.probability(features))
    }

    fn evaluate(&self, features: &[f64]) -> Result<ClassifierOutput> {
        let probability = self.predict_probability(features)?;
        Ok(ClassifierOutput {
            class: self.class_for(probability),
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> LogisticArtifact {
        LogisticArtifact {
            schema_version: 2,
            feature_names: FeatureSchema::V2.names.iter().map(|s| s.to_string()).collect(),
            coefficients: vec![0.00003, 0.9, 1.6, 0.2, 0.35],
            intercept: -4.5,
        }
    }

    #[test]
    fn test_probability_and_class_agree() {
        let model = LogisticRegression::from_artifact(artifact()).unwrap();

        let safe = model.evaluate(&[100.0, 1.0, 0.0, 1.0, 0.0]).unwrap();
        assert_eq!(safe.class, FraudClass::Legitimate);
        assert!(safe.probability < 0.5);

        let fraud = model.evaluate(&[200_000.0, 10.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(fraud.class, FraudClass::Fraud);
        assert!(fraud.probability > 0.99);
    }

    #[test]
    fn test_zero_weights_give_even_odds() {
        let model = LogisticRegression::new(vec![0.0; 3], 0.0);
        let out = model.evaluate(&[5.0, 1.0, 0.0]).unwrap();
        assert_eq!(out.probability, 0.5);
        assert_eq!(out.class, FraudClass::Fraud);
    }

    #[test]
    fn test_custom_threshold_moves_the_class() {
        let model = LogisticRegression::new(vec![0.0; 3], 0.0)
            .with_decision_threshold(0.7)
            .unwrap();
        assert_eq!(model.predict(&[1.0, 1.0, 1.0]).unwrap(), FraudClass::Legitimate);
        assert!(LogisticRegression::new(vec![0.0], 0.0)
            .with_decision_threshold(1.5)
            .is_err());
    }

    #[test]
    fn test_artifact_declares_its_schema() {
        let current = LogisticRegression::from_artifact(artifact()).unwrap();
        assert_eq!(current.schema(), FeatureSchema::V2);

        let legacy = LogisticRegression::from_artifact(LogisticArtifact {
            schema_version: 1,
            feature_names: FeatureSchema::V1.names.iter().map(|s| s.to_string()).collect(),
            coefficients: vec![0.0001, 0.5, 1.0],
            intercept: -3.0,
        })
        .unwrap();
        assert_eq!(legacy.schema(), FeatureSchema::V1);
        assert_eq!(legacy.input_dim(), FeatureSchema::V1.len());
    }

    #[test]
    fn test_dimension_is_checked() {
        let model = LogisticRegression::from_artifact(artifact()).unwrap();
        assert_eq!(
            model.predict_probability(&[1.0, 2.0, 3.0]).unwrap_err(),
            ScoringError::SchemaMismatch {
                expected: 5,
                actual: 3
            }
        );
    }

    #[test]
    fn test_artifact_validation() {
        let mut bad = artifact();
        bad.coefficients.pop();
        assert!(LogisticRegression::from_artifact(bad).is_err());

        let mut bad = artifact();
        bad.feature_names.swap(0, 1);
        assert!(LogisticRegression::from_artifact(bad).is_err());

        let mut bad = artifact();
        bad.schema_version = 9;
        assert!(LogisticRegression::from_artifact(bad).is_err());

        let mut bad = artifact();
        bad.intercept = f64::NAN;
        assert!(LogisticRegression::from_artifact(bad).is_err());
    }
}
