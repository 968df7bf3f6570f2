//! Fraud Risk Scorer Library
//!
//! Real-time transaction fraud scoring: derives a fixed feature vector from a
//! raw transaction, evaluates a fitted binary classifier and returns a
//! FRAUD/SAFE verdict with its probability.

pub mod clock;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_deriver;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod schema;
pub mod service;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use consumer::TransactionConsumer;
pub use error::ScoringError;
pub use feature_deriver::FeatureDeriver;
pub use models::{Classifier, EngineState, ScoringEngine};
pub use producer::VerdictProducer;
pub use schema::{FeatureSchema, FeatureVector};
pub use service::ScoringService;
pub use types::{transaction::TransactionRecord, verdict::RiskVerdict};
