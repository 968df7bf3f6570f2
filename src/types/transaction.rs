//! Raw transaction records as submitted for scoring

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Payment method categories the feature schema distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PaymentMethod {
    Card,
    Wallet,
    #[default]
    Other,
}

impl From<&str> for PaymentMethod {
    fn from(value: &str) -> Self {
        match value {
            "card" => PaymentMethod::Card,
            "wallet" => PaymentMethod::Wallet,
            _ => PaymentMethod::Other,
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        PaymentMethod::from(value.as_str())
    }
}

/// The `amount` field exactly as it arrived.
///
/// Kept raw so the deriver can tell an absent amount from a malformed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Transaction submitted for fraud scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Caller-side identifier, echoed in published verdicts
    #[serde(default, alias = "transaction_id", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Transaction amount in currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<RawAmount>,

    /// Payment method (card, wallet, anything else)
    #[serde(
        default,
        alias = "payment_method",
        deserialize_with = "any_payment_method",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<PaymentMethod>,

    /// Instant to evaluate time-of-day features at, instead of the clock
    #[serde(default, alias = "timestamp_override", skip_serializing_if = "Option::is_none")]
    pub timestamp_override: Option<DateTime<FixedOffset>>,
}

/// Accept any JSON value for the payment method; non-strings are `Other`.
fn any_payment_method<'de, D>(deserializer: D) -> Result<Option<PaymentMethod>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        serde_json::Value::String(method) => PaymentMethod::from(method.as_str()),
        _ => PaymentMethod::Other,
    }))
}

impl TransactionRecord {
    /// Create a record with a numeric amount and payment method
    pub fn new(amount: f64, payment_method: PaymentMethod) -> Self {
        Self {
            amount: Some(RawAmount::Number(amount)),
            payment_method: Some(payment_method),
            ..Default::default()
        }
    }

    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<FixedOffset>) -> Self {
        self.timestamp_override = Some(at);
        self
    }

    pub fn with_raw_amount(mut self, amount: RawAmount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn method(&self) -> PaymentMethod {
        self.payment_method.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_field_names() {
        let json = r#"{
            "transactionId": "tx_1",
            "amount": 250.5,
            "paymentMethod": "wallet",
            "timestampOverride": "2024-03-01T23:15:00+05:30"
        }"#;
        let tx: TransactionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(tx.transaction_id.as_deref(), Some("tx_1"));
        assert_eq!(tx.amount, Some(RawAmount::Number(250.5)));
        assert_eq!(tx.method(), PaymentMethod::Wallet);
        assert!(tx.timestamp_override.is_some());
    }

    #[test]
    fn test_snake_case_aliases() {
        let json = r#"{"transaction_id": "tx_2", "payment_method": "card"}"#;
        let tx: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tx.transaction_id.as_deref(), Some("tx_2"));
        assert_eq!(tx.method(), PaymentMethod::Card);
        assert!(tx.amount.is_none());
    }

    #[test]
    fn test_amount_shapes() {
        let tx: TransactionRecord = serde_json::from_str(r#"{"amount": 100}"#).unwrap();
        assert_eq!(tx.amount, Some(RawAmount::Number(100.0)));

        let tx: TransactionRecord = serde_json::from_str(r#"{"amount": "abc"}"#).unwrap();
        assert_eq!(tx.amount, Some(RawAmount::Text("abc".to_string())));

        let tx: TransactionRecord = serde_json::from_str(r#"{"amount": true}"#).unwrap();
        assert!(matches!(tx.amount, Some(RawAmount::Other(_))));

        let tx: TransactionRecord = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert!(tx.amount.is_none());
    }

    #[test]
    fn test_unknown_payment_methods_are_other() {
        assert_eq!(PaymentMethod::from("upi"), PaymentMethod::Other);
        assert_eq!(PaymentMethod::from("CARD"), PaymentMethod::Other);
        assert_eq!(TransactionRecord::default().method(), PaymentMethod::Other);
    }

    #[test]
    fn test_non_string_payment_method_is_other() {
        for method in ["5", "true", "{}", "[\"card\"]"] {
            let json = format!(r#"{{"amount": 10, "paymentMethod": {method}}}"#);
            let tx: TransactionRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(tx.method(), PaymentMethod::Other, "paymentMethod {method}");
        }

        let tx: TransactionRecord =
            serde_json::from_str(r#"{"amount": 10, "paymentMethod": null}"#).unwrap();
        assert_eq!(tx.payment_method, None);
    }
}
