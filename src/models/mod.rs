//! Classifier backends and the scoring engine

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod logistic;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use classifier::{Classifier, ClassifierOutput};
pub use inference::{score, AttributedVerdict, EngineState, ScoringEngine};
pub use loader::load_classifier;
pub use logistic::LogisticRegression;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
