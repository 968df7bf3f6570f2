//! Risk verdict data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FraudClass {
    Legitimate = 0,
    Fraud = 1,
}

impl FraudClass {
    /// Map a raw class label; anything other than 1 is legitimate.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            FraudClass::Fraud
        } else {
            FraudClass::Legitimate
        }
    }
}

/// Presented verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLabel {
    Fraud,
    Safe,
}

impl From<FraudClass> for RiskLabel {
    fn from(class: FraudClass) -> Self {
        match class {
            FraudClass::Fraud => RiskLabel::Fraud,
            FraudClass::Legitimate => RiskLabel::Safe,
        }
    }
}

/// Round a probability to 2 decimal places for presentation.
///
/// Ties round half away from zero, so 0.125 presents as 0.13.
pub fn round_probability(probability: f64) -> f64 {
    (probability * 100.0).round() / 100.0
}

/// Outcome of scoring one transaction.
///
/// `probability` keeps full precision; serialization presents it rounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "VerdictResponse")]
pub struct RiskVerdict {
    pub label: RiskLabel,
    pub probability: f64,
}

impl RiskVerdict {
    pub fn is_fraud(&self) -> bool {
        self.label == RiskLabel::Fraud
    }

    pub fn presented_probability(&self) -> f64 {
        round_probability(self.probability)
    }

    pub fn response(&self) -> VerdictResponse {
        VerdictResponse {
            prediction: self.label,
            probability: self.presented_probability(),
        }
    }
}

/// Wire shape of a verdict: `{"prediction": "SAFE", "probability": 0.12}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictResponse {
    pub prediction: RiskLabel,
    pub probability: f64,
}

impl From<RiskVerdict> for VerdictResponse {
    fn from(verdict: RiskVerdict) -> Self {
        verdict.response()
    }
}

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from fraud probability and thresholds
    pub fn from_probability(probability: f64, thresholds: &RiskLevelThresholds) -> Self {
        if probability >= thresholds.critical {
            RiskLevel::Critical
        } else if probability >= thresholds.high {
            RiskLevel::High
        } else if probability >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Configurable risk level thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 0.3,
            high: 0.6,
            critical: 0.9,
        }
    }
}

/// Verdict event published for downstream consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictEvent {
    /// Unique event identifier
    pub event_id: String,

    /// Caller transaction ID, when one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    pub prediction: RiskLabel,

    /// Fraud probability rounded to 2 decimals
    pub probability: f64,

    pub risk_level: RiskLevel,

    /// Name of the classifier that produced the verdict
    pub model: String,

    /// Feature schema version the vector was built with
    pub schema_version: u32,

    pub scored_at: DateTime<Utc>,
}

impl VerdictEvent {
    pub fn new(
        transaction_id: Option<String>,
        verdict: &RiskVerdict,
        thresholds: &RiskLevelThresholds,
        model: &str,
        schema_version: u32,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            prediction: verdict.label,
            probability: verdict.presented_probability(),
            risk_level: RiskLevel::from_probability(verdict.probability, thresholds),
            model: model.to_string(),
            schema_version,
            scored_at: Utc::now(),
        }
    }

    pub fn response(&self) -> VerdictResponse {
        VerdictResponse {
            prediction: self.prediction,
            probability: self.probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_policy() {
        assert_eq!(round_probability(0.999), 1.0);
        assert_eq!(round_probability(0.004), 0.0);
        assert_eq!(round_probability(0.125), 0.13);
        assert_eq!(round_probability(0.12), 0.12);
    }

    #[test]
    fn test_verdict_serializes_to_response_shape() {
        let verdict = RiskVerdict {
            label: RiskLabel::Safe,
            probability: 0.1234,
        };
        let json = serde_json::to_value(verdict).unwrap();
        assert_eq!(json, serde_json::json!({"prediction": "SAFE", "probability": 0.12}));

        // Full precision stays on the verdict itself.
        assert_eq!(verdict.probability, 0.1234);
    }

    #[test]
    fn test_risk_level_from_probability() {
        let thresholds = RiskLevelThresholds::default();

        assert_eq!(RiskLevel::from_probability(0.1, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.3, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.75, &thresholds), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.95, &thresholds), RiskLevel::Critical);
    }

    #[test]
    fn test_verdict_event_serialization() {
        let verdict = RiskVerdict {
            label: RiskLabel::Fraud,
            probability: 0.876,
        };
        let event = VerdictEvent::new(
            Some("tx_123".to_string()),
            &verdict,
            &RiskLevelThresholds::default(),
            "logistic_regression",
            2,
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: VerdictEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.transaction_id.as_deref(), Some("tx_123"));
        assert_eq!(deserialized.prediction, RiskLabel::Fraud);
        assert_eq!(deserialized.probability, 0.88);
        assert_eq!(deserialized.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_fraud_class_labels() {
        assert_eq!(FraudClass::from_label(1), FraudClass::Fraud);
        assert_eq!(FraudClass::from_label(0), FraudClass::Legitimate);
        assert_eq!(RiskLabel::from(FraudClass::Fraud), RiskLabel::Fraud);
    }
}
