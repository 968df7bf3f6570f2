//! Type definitions for the fraud scoring pipeline

pub mod transaction;
pub mod verdict;

pub use transaction::{PaymentMethod, RawAmount, TransactionRecord};
pub use verdict::{FraudClass, RiskLabel, RiskLevel, RiskVerdict, VerdictEvent, VerdictResponse};
