//! Feature derivation for fraud classifier inference.
//!
//! This module turns raw transaction records into the feature vector the
//! classifier was fitted on. The rules here are part of the training
//! contract: changing any of them is equivalent to retraining.

use crate::error::{Result, ScoringError};
use crate::schema::{FeatureSchema, FeatureVector};
use crate::types::transaction::{PaymentMethod, RawAmount, TransactionRecord};
use chrono::{DateTime, FixedOffset, Timelike};
use tracing::debug;

/// Amounts strictly above this get the high velocity value.
pub const VELOCITY_AMOUNT_THRESHOLD: f64 = 50_000.0;
pub const HIGH_VELOCITY: f64 = 10.0;
pub const BASE_VELOCITY: f64 = 1.0;

/// First hour (inclusive) of the daytime window.
pub const DAY_START_HOUR: u32 = 6;
/// Last hour (inclusive) of the daytime window.
pub const DAY_END_HOUR: u32 = 22;

/// Coarse velocity proxy: a step at the threshold, not a smooth feature.
pub fn velocity(amount: f64) -> f64 {
    if amount > VELOCITY_AMOUNT_THRESHOLD {
        HIGH_VELOCITY
    } else {
        BASE_VELOCITY
    }
}

/// Whether an hour of day (0-23) falls in the night window.
pub fn is_night(hour: u32) -> bool {
    hour < DAY_START_HOUR || hour > DAY_END_HOUR
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Resolve the `amount` field.
///
/// Absent amounts and non-finite numbers become 0. Text is accepted only when
/// it parses to a finite number.
pub fn resolve_amount(raw: Option<&RawAmount>) -> Result<f64> {
    match raw {
        None => Ok(0.0),
        Some(RawAmount::Number(n)) if n.is_finite() => Ok(*n),
        Some(RawAmount::Number(n)) => {
            debug!(amount = %n, "Non-finite amount treated as 0");
            Ok(0.0)
        }
        Some(RawAmount::Text(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(ScoringError::invalid_input(
                "amount",
                format!("`{s}` is not a number"),
            )),
        },
        Some(RawAmount::Other(value)) => Err(ScoringError::invalid_input(
            "amount",
            format!("expected a number, got `{value}`"),
        )),
    }
}

/// Derives schema-ordered feature vectors from transaction records.
///
/// Output order: `[amount, velocity, night_txn, is_card, is_wallet]`.
#[derive(Debug, Clone, Copy)]
pub struct FeatureDeriver {
    schema: FeatureSchema,
}

impl FeatureDeriver {
    pub fn new() -> Self {
        Self {
            schema: FeatureSchema::CURRENT,
        }
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        self.schema.names
    }

    /// Derive features for `record`, evaluating time-of-day at `now` unless the
    /// record carries its own timestamp.
    pub fn derive(
        &self,
        record: &TransactionRecord,
        now: DateTime<FixedOffset>,
    ) -> Result<FeatureVector> {
        let amount = resolve_amount(record.amount.as_ref())?;
        if amount < 0.0 {
            // Passed through on purpose: the fitted model has seen these.
            debug!(amount = amount, "Negative amount passed through unvalidated");
        }

        let at = record.timestamp_override.unwrap_or(now);
        let method = record.method();

        let features = vec![
            amount,
            velocity(amount),
            flag(is_night(at.hour())),
            flag(method == PaymentMethod::Card),
            flag(method == PaymentMethod::Wallet),
        ];

        FeatureVector::new(self.schema, features)
    }
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at_hour(hour: u32) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("2024-05-01T{hour:02}:30:00+00:00")).unwrap()
    }

    fn derive(record: &TransactionRecord, hour: u32) -> Vec<f64> {
        FeatureDeriver::new()
            .derive(record, at_hour(hour))
            .unwrap()
            .into_values()
    }

    #[test]
    fn test_feature_layout() {
        let deriver = FeatureDeriver::new();
        assert_eq!(deriver.feature_count(), 5);
        assert_eq!(
            deriver.feature_names(),
            &["amount", "velocity", "night_txn", "is_card", "is_wallet"]
        );
    }

    #[test]
    fn test_daytime_card_transaction() {
        let tx = TransactionRecord::new(100.0, PaymentMethod::Card);
        assert_eq!(derive(&tx, 14), vec![100.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_large_night_card_transaction() {
        let tx = TransactionRecord::new(200_000.0, PaymentMethod::Card);
        assert_eq!(derive(&tx, 2), vec![200_000.0, 10.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_late_wallet_transaction() {
        let tx = TransactionRecord::new(300.0, PaymentMethod::Wallet);
        assert_eq!(derive(&tx, 23), vec![300.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_velocity_boundary() {
        assert_eq!(velocity(50_000.0), 1.0);
        assert_eq!(velocity(50_000.01), 10.0);
        assert_eq!(velocity(0.0), 1.0);
    }

    #[test]
    fn test_night_boundaries() {
        assert!(is_night(0));
        assert!(is_night(5));
        assert!(!is_night(6));
        assert!(!is_night(22));
        assert!(is_night(23));
    }

    #[test]
    fn test_absent_amount_defaults_to_zero() {
        let tx = TransactionRecord::default();
        assert_eq!(derive(&tx, 12), vec![0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_non_numeric_amount_is_rejected() {
        let tx = TransactionRecord::default().with_raw_amount(RawAmount::Text("12abc".into()));
        let err = FeatureDeriver::new().derive(&tx, at_hour(12)).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput { field: "amount", .. }));

        let tx = TransactionRecord::default().with_raw_amount(RawAmount::Text("NaN".into()));
        assert!(FeatureDeriver::new().derive(&tx, at_hour(12)).is_err());

        let tx = TransactionRecord::default()
            .with_raw_amount(RawAmount::Other(serde_json::json!({"value": 10})));
        assert!(FeatureDeriver::new().derive(&tx, at_hour(12)).is_err());
    }

    #[test]
    fn test_numeric_text_amount_is_accepted() {
        let tx = TransactionRecord::default().with_raw_amount(RawAmount::Text(" 75000 ".into()));
        assert_eq!(derive(&tx, 12)[..2], [75_000.0, 10.0]);
    }

    #[test]
    fn test_non_finite_number_defaults_to_zero() {
        let tx = TransactionRecord::new(f64::INFINITY, PaymentMethod::Other);
        assert_eq!(derive(&tx, 12)[..2], [0.0, 1.0]);
    }

    #[test]
    fn test_negative_amount_passes_through() {
        let tx = TransactionRecord::new(-250.0, PaymentMethod::Card);
        assert_eq!(derive(&tx, 12)[0], -250.0);
    }

    #[test]
    fn test_timestamp_override_wins_over_clock() {
        let tx = TransactionRecord::new(100.0, PaymentMethod::Card).with_timestamp(at_hour(3));
        assert_eq!(derive(&tx, 14)[2], 1.0);
    }

    #[test]
    fn test_hour_is_read_in_the_instant_offset() {
        // 20:30 UTC is 02:00 the next day in +05:30.
        let ist = DateTime::parse_from_rfc3339("2024-05-02T02:00:00+05:30").unwrap();
        let tx = TransactionRecord::new(100.0, PaymentMethod::Card);
        let features = FeatureDeriver::new().derive(&tx, ist).unwrap();
        assert_eq!(features.get("night_txn"), Some(1.0));
    }

    #[test]
    fn test_derivation_is_deterministic_for_fixed_clock() {
        let deriver = FeatureDeriver::new();
        let tx = TransactionRecord::new(4_200.0, PaymentMethod::Wallet);
        let now = at_hour(9);
        assert_eq!(deriver.derive(&tx, now).unwrap(), deriver.derive(&tx, now).unwrap());
    }

    proptest! {
        #[test]
        fn prop_velocity_is_a_step(amount in -1.0e9f64..1.0e9) {
            let expected = if amount > 50_000.0 { 10.0 } else { 1.0 };
            prop_assert_eq!(velocity(amount), expected);
        }

        #[test]
        fn prop_night_window(hour in 0u32..24) {
            let expected = if (6..=22).contains(&hour) { 0.0 } else { 1.0 };
            let tx = TransactionRecord::new(10.0, PaymentMethod::Other);
            prop_assert_eq!(derive(&tx, hour)[2], expected);
        }

        #[test]
        fn prop_payment_flags_are_exclusive(method in "[a-z]{0,8}") {
            let tx = TransactionRecord::new(10.0, PaymentMethod::from(method.as_str()));
            let f = derive(&tx, 12);
            prop_assert!(f[3] + f[4] <= 1.0);
            if method != "card" && method != "wallet" {
                prop_assert_eq!((f[3], f[4]), (0.0, 0.0));
            }
        }
    }
}
