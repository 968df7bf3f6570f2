//! Request handling for the scoring service
//!
//! Ties the deriver, the engine and the clock together and maps core errors
//! onto boundary replies. Transport code only moves bytes in and out.

use crate::clock::Clock;
use crate::config::ModelConfig;
use crate::error::{ErrorClass, ScoringError};
use crate::feature_deriver::FeatureDeriver;
use crate::metrics::PipelineMetrics;
use crate::models::inference::{AttributedVerdict, ScoringEngine};
use crate::models::loader::load_classifier;
use crate::types::transaction::TransactionRecord;
use crate::types::verdict::{RiskLevelThresholds, RiskVerdict, VerdictEvent, VerdictResponse};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Body sent back for a request that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub status: u16,
    pub error: String,
    pub message: String,
}

impl From<&ScoringError> for Rejection {
    fn from(err: &ScoringError) -> Self {
        Self {
            status: err.class().status(),
            error: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of handling one request
#[derive(Debug, Clone)]
pub enum ServiceReply {
    Scored {
        verdict: RiskVerdict,
        event: VerdictEvent,
    },
    Rejected(Rejection),
}

impl ServiceReply {
    /// Serialized reply body for the requester
    pub fn to_body(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            ServiceReply::Scored { verdict, .. } => {
                let response: VerdictResponse = verdict.response();
                serde_json::to_vec(&response)
            }
            ServiceReply::Rejected(rejection) => serde_json::to_vec(rejection),
        }
    }

    pub fn event(&self) -> Option<&VerdictEvent> {
        match self {
            ServiceReply::Scored { event, .. } => Some(event),
            ServiceReply::Rejected(_) => None,
        }
    }
}

/// Scores raw transaction payloads end to end
pub struct ScoringService {
    deriver: FeatureDeriver,
    engine: Arc<ScoringEngine>,
    clock: Arc<dyn Clock>,
    risk_levels: RiskLevelThresholds,
    metrics: Arc<PipelineMetrics>,
}

impl ScoringService {
    pub fn new(
        engine: Arc<ScoringEngine>,
        clock: Arc<dyn Clock>,
        risk_levels: RiskLevelThresholds,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            deriver: FeatureDeriver::new(),
            engine,
            clock,
            risk_levels,
            metrics,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Derive and score a parsed record
    pub fn score_record(
        &self,
        record: &TransactionRecord,
    ) -> Result<AttributedVerdict, ScoringError> {
        let vector = self.deriver.derive(record, self.clock.now())?;
        self.engine.score_attributed(&vector)
    }

    /// Handle one JSON payload
    pub fn handle(&self, payload: &[u8]) -> ServiceReply {
        let start = Instant::now();

        let record: TransactionRecord = match serde_json::from_slice(payload) {
            Ok(record) => record,
            Err(e) => {
                let err = ScoringError::invalid_input("payload", e.to_string());
                return self.reject(None, err);
            }
        };

        match self.score_record(&record) {
            Ok(AttributedVerdict {
                verdict,
                model,
                schema_version,
            }) => {
                let elapsed = start.elapsed();
                self.metrics.record_verdict(elapsed, &verdict);

                let event = VerdictEvent::new(
                    record.transaction_id.clone(),
                    &verdict,
                    &self.risk_levels,
                    &model,
                    schema_version,
                );

                debug!(
                    transaction_id = ?record.transaction_id,
                    prediction = ?verdict.label,
                    probability = verdict.probability,
                    processing_time_us = elapsed.as_micros() as u64,
                    "Transaction scored"
                );

                ServiceReply::Scored { verdict, event }
            }
            Err(err) => self.reject(record.transaction_id.as_deref(), err),
        }
    }

    fn reject(&self, transaction_id: Option<&str>, err: ScoringError) -> ServiceReply {
        self.metrics.record_rejection(err.kind());
        match err.class() {
            ErrorClass::ClientError => {
                debug!(transaction_id = ?transaction_id, error = %err, "Request rejected")
            }
            ErrorClass::ServiceUnavailable => {
                warn!(transaction_id = ?transaction_id, error = %err, "Scoring unavailable")
            }
            ErrorClass::InternalError => {
                error!(transaction_id = ?transaction_id, code = err.code(), error = %err, "Scoring failed")
            }
        }
        ServiceReply::Rejected(Rejection::from(&err))
    }

    /// Load the configured classifier and install it in the engine.
    ///
    /// Leaves the serving classifier in place if anything fails.
    pub fn reload(&self, config: &ModelConfig) -> anyhow::Result<()> {
        let classifier = load_classifier(config)?;
        self.engine
            .load(classifier)
            .with_context(|| format!("Classifier from {} rejected", config.path))?;
        info!(model = ?self.engine.model_name(), path = %config.path, "Model installed");
        Ok(())
    }
}
