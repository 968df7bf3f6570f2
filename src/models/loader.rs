//! Classifier artifact loader
//!
//! Artifact storage belongs to the host. This module turns a configured
//! artifact into a `Classifier` the scoring engine can install.

use crate::config::{ModelBackend, ModelConfig};
use crate::models::classifier::Classifier;
use crate::models::logistic::{LogisticArtifact, LogisticRegression};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Read a logistic regression artifact (JSON) from disk.
pub fn load_logistic<P: AsRef<Path>>(path: P, decision_threshold: f64) -> Result<LogisticRegression> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
    let artifact: LogisticArtifact = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse model artifact {}", path.display()))?;

    let schema_version = artifact.schema_version;
    let model = LogisticRegression::from_artifact(artifact)
        .with_context(|| format!("Invalid model artifact {}", path.display()))?
        .with_decision_threshold(decision_threshold)?;

    info!(
        path = %path.display(),
        schema_version = schema_version,
        decision_threshold = decision_threshold,
        "Logistic regression artifact loaded"
    );

    Ok(model)
}

/// Load the classifier described by the model configuration.
pub fn load_classifier(config: &ModelConfig) -> Result<Arc<dyn Classifier>> {
    match config.backend {
        ModelBackend::Logistic => {
            let model = load_logistic(&config.path, config.decision_threshold)?;
            Ok(Arc::new(model))
        }
        ModelBackend::Onnx => load_onnx(config),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(config: &ModelConfig) -> Result<Arc<dyn Classifier>> {
    use crate::models::onnx::OnnxClassifier;
    use crate::schema::FeatureSchema;

    let name = Path::new(&config.path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("onnx");
    let model = OnnxClassifier::load(
        &config.path,
        name,
        FeatureSchema::CURRENT.len(),
        config.onnx_threads,
    )?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(config: &ModelConfig) -> Result<Arc<dyn Classifier>> {
    anyhow::bail!(
        "model {} needs the ONNX backend; rebuild with `--features onnx`",
        config.path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ARTIFACT: &str = r#"{
        "schema_version": 2,
        "feature_names": ["amount", "velocity", "night_txn", "is_card", "is_wallet"],
        "coefficients": [0.00003, 0.9, 1.6, 0.2, 0.35],
        "intercept": -4.5
    }"#;

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn model_config(path: &Path) -> ModelConfig {
        ModelConfig {
            path: path.display().to_string(),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_load_logistic_artifact() {
        let file = write_artifact(ARTIFACT);
        let classifier = load_classifier(&model_config(file.path())).unwrap();
        assert_eq!(classifier.input_dim(), 5);
        assert_eq!(classifier.name(), "logistic_regression");
    }

    #[test]
    fn test_missing_artifact_fails() {
        let config = model_config(Path::new("/nonexistent/model.json"));
        assert!(load_classifier(&config).is_err());
    }

    #[test]
    fn test_legacy_artifact_loads_with_three_features() {
        let file = write_artifact(
            r#"{"schema_version": 1, "feature_names": ["amount", "velocity", "night_txn"],
                "coefficients": [0.0001, 0.5, 1.0], "intercept": -3.0}"#,
        );
        let classifier = load_classifier(&model_config(file.path())).unwrap();
        assert_eq!(classifier.input_dim(), 3);
    }

    #[test]
    fn test_malformed_artifact_fails() {
        let file = write_artifact(r#"{"schema_version": 2}"#);
        assert!(load_classifier(&model_config(file.path())).is_err());
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_backend_requires_feature() {
        let config = ModelConfig {
            backend: ModelBackend::Onnx,
            ..ModelConfig::default()
        };
        let err = load_classifier(&config).err().unwrap();
        assert!(err.to_string().contains("--features onnx"));
    }
}
