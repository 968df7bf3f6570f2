//! Versioned feature schema shared by training and inference.
//!
//! A classifier is only meaningful against the exact feature order it was
//! fitted on. Both the artifact loader and the scoring engine reference these
//! schema objects instead of relying on positional convention.

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};

/// Named, ordered feature layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub version: u32,
    pub names: &'static [&'static str],
}

impl FeatureSchema {
    /// Legacy three-feature layout (no payment method encoding).
    pub const V1: FeatureSchema = FeatureSchema {
        version: 1,
        names: &["amount", "velocity", "night_txn"],
    };

    /// Current layout.
    pub const V2: FeatureSchema = FeatureSchema {
        version: 2,
        names: &["amount", "velocity", "night_txn", "is_card", "is_wallet"],
    };

    pub const CURRENT: FeatureSchema = Self::V2;

    /// Look up a schema by version number.
    pub fn by_version(version: u32) -> Option<FeatureSchema> {
        match version {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|&n| n == name)
    }

    /// Check that externally declared feature names match this schema exactly.
    pub fn check_names<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        if names.len() != self.len() {
            return Err(ScoringError::SchemaMismatch {
                expected: self.len(),
                actual: names.len(),
            });
        }
        for (i, (declared, &expected)) in names.iter().zip(self.names).enumerate() {
            if declared.as_ref() != expected {
                return Err(ScoringError::invalid_input(
                    "feature_names",
                    format!(
                        "position {i} is `{}`, schema v{} expects `{expected}`",
                        declared.as_ref(),
                        self.version
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Ordered numeric features tagged with the schema that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    schema_version: u32,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(schema: FeatureSchema, values: Vec<f64>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(ScoringError::SchemaMismatch {
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            schema_version: schema.version,
            values,
        })
    }

    /// Build a vector without checking it against a schema.
    ///
    /// Used for feeding fakes and for exercising the engine's dimension guard.
    pub fn from_raw(schema_version: u32, values: Vec<f64>) -> Self {
        Self {
            schema_version,
            values,
        }
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature, resolved through the producing schema.
    pub fn get(&self, name: &str) -> Option<f64> {
        let schema = FeatureSchema::by_version(self.schema_version)?;
        schema.index_of(name).and_then(|i| self.values.get(i).copied())
    }

    /// Re-select features by name to match another schema.
    ///
    /// Fails when the target names a feature this vector does not carry.
    pub fn project(&self, target: FeatureSchema) -> Result<FeatureVector> {
        if target.version == self.schema_version {
            return Ok(self.clone());
        }
        let values = target
            .names
            .iter()
            .map(|name| {
                self.get(name).ok_or(ScoringError::SchemaMismatch {
                    expected: target.len(),
                    actual: self.len(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        FeatureVector::new(target, values)
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_layouts() {
        assert_eq!(FeatureSchema::CURRENT, FeatureSchema::V2);
        assert_eq!(FeatureSchema::V1.len(), 3);
        assert_eq!(FeatureSchema::V2.len(), 5);
        assert_eq!(FeatureSchema::V2.index_of("is_wallet"), Some(4));
        assert!(FeatureSchema::by_version(3).is_none());
    }

    #[test]
    fn test_check_names_rejects_reordering() {
        let swapped = ["amount", "night_txn", "velocity", "is_card", "is_wallet"];
        let err = FeatureSchema::V2.check_names(&swapped).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput { .. }));

        let short = ["amount", "velocity", "night_txn"];
        let err = FeatureSchema::V2.check_names(&short).unwrap_err();
        assert_eq!(
            err,
            ScoringError::SchemaMismatch {
                expected: 5,
                actual: 3
            }
        );

        assert!(FeatureSchema::V1.check_names(&short).is_ok());
    }

    #[test]
    fn test_vector_length_must_match_schema() {
        assert!(FeatureVector::new(FeatureSchema::V2, vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_projection_to_legacy_schema() {
        let v2 = FeatureVector::new(FeatureSchema::V2, vec![300.0, 1.0, 1.0, 0.0, 1.0]).unwrap();
        let v1 = v2.project(FeatureSchema::V1).unwrap();
        assert_eq!(v1.schema_version(), 1);
        assert_eq!(v1.as_slice(), &[300.0, 1.0, 1.0]);

        // The legacy layout cannot be widened back.
        assert!(v1.project(FeatureSchema::V2).is_err());
    }
}
