//! Positions of the statement values inside the public-input vector.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{KeyError, StatementViolation};
use crate::field::FieldElement;

/// Where the circuit puts each statement value.
///
/// The credit-score circuit emits its predicate output first and then its
/// public inputs in declaration order, giving `[predicate, threshold,
/// identity]`.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct PublicInputLayout {
    pub predicate_index: u32,
    pub threshold_index: Option<u32>,
    pub identity_index: u32,
    /// Lowest public threshold a proof may be made against.
    pub min_threshold: Option<u64>,
}

impl Default for PublicInputLayout {
    fn default() -> Self {
        Self {
            predicate_index: 0,
            threshold_index: Some(1),
            identity_index: 2,
            min_threshold: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutParseError {
    #[error("expected key=value, got {0:?}")]
    Syntax(String),
    #[error("unknown layout key {0:?}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value:?}")]
    Value { key: String, value: String },
    #[error("index {0} is used twice")]
    DuplicateIndex(u32),
}

impl PublicInputLayout {
    /// Smallest public-input count that contains every configured index.
    pub fn required_arity(&self) -> usize {
        self.indices().map(|i| i as usize + 1).max().unwrap_or(0)
    }

    /// Checks the layout against a key with `arity` public inputs. Each
    /// statement value needs a position of its own.
    pub fn validate_for(&self, arity: usize) -> Result<(), KeyError> {
        if let Some(index) = self.duplicate_index() {
            return Err(KeyError::LayoutDuplicateIndex(index));
        }
        match self.indices().find(|i| *i as usize >= arity) {
            Some(index) => Err(KeyError::LayoutOutOfRange {
                index: index as usize,
                arity,
            }),
            None => Ok(()),
        }
    }

    pub fn identity_of<'a>(&self, inputs: &'a [FieldElement]) -> Option<&'a FieldElement> {
        inputs.get(self.identity_index as usize)
    }

    pub fn predicate_of<'a>(&self, inputs: &'a [FieldElement]) -> Option<&'a FieldElement> {
        inputs.get(self.predicate_index as usize)
    }

    pub fn threshold_of<'a>(&self, inputs: &'a [FieldElement]) -> Option<&'a FieldElement> {
        self.threshold_index.and_then(|i| inputs.get(i as usize))
    }

    /// Statement policy: the predicate output must be exactly 1 and the
    /// public threshold, when a minimum is configured, must reach it.
    ///
    /// Callers check arity first; missing positions are treated as a failed
    /// predicate.
    pub fn check_statement(&self, inputs: &[FieldElement]) -> Result<(), StatementViolation> {
        let predicate = self.predicate_of(inputs).copied().unwrap_or(FieldElement::ZERO);
        if predicate != FieldElement::ONE {
            return Err(StatementViolation::PredicateNotSatisfied(predicate));
        }

        if let Some(minimum) = self.min_threshold {
            // A threshold wider than u64 is certainly above any minimum
            let threshold = self
                .threshold_of(inputs)
                .map(|t| t.to_u64().unwrap_or(u64::MAX))
                .unwrap_or(0);
            if threshold < minimum {
                return Err(StatementViolation::ThresholdBelowMinimum { threshold, minimum });
            }
        }
        Ok(())
    }

    fn duplicate_index(&self) -> Option<u32> {
        let mut seen = Vec::with_capacity(3);
        for index in self.indices() {
            if seen.contains(&index) {
                return Some(index);
            }
            seen.push(index);
        }
        None
    }

    fn indices(&self) -> impl Iterator<Item = u32> {
        [Some(self.predicate_index), self.threshold_index, Some(self.identity_index)]
            .into_iter()
            .flatten()
    }
}

impl FromStr for PublicInputLayout {
    type Err = LayoutParseError;

    /// Parses `predicate=0,threshold=1,identity=2,min_threshold=650`.
    ///
    /// Omitted keys keep their default; `threshold=none` and
    /// `min_threshold=none` disable those checks.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut layout = PublicInputLayout::default();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| LayoutParseError::Syntax(part.to_string()))?;
            let (key, value) = (key.trim(), value.trim());
            let bad_value = || LayoutParseError::Value {
                key: key.to_string(),
                value: value.to_string(),
            };
            let optional = value.eq_ignore_ascii_case("none");

            match key {
                "predicate" => layout.predicate_index = value.parse().map_err(|_| bad_value())?,
                "identity" => layout.identity_index = value.parse().map_err(|_| bad_value())?,
                "threshold" if optional => layout.threshold_index = None,
                "threshold" => layout.threshold_index = Some(value.parse().map_err(|_| bad_value())?),
                "min_threshold" if optional => layout.min_threshold = None,
                "min_threshold" => layout.min_threshold = Some(value.parse().map_err(|_| bad_value())?),
                other => return Err(LayoutParseError::UnknownKey(other.to_string())),
            }
        }

        match layout.duplicate_index() {
            Some(index) => Err(LayoutParseError::DuplicateIndex(index)),
            None => Ok(layout),
        }
    }
}

impl fmt::Display for PublicInputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "predicate={}", self.predicate_index)?;
        match self.threshold_index {
            Some(i) => write!(f, ",threshold={}", i)?,
            None => write!(f, ",threshold=none")?,
        }
        write!(f, ",identity={}", self.identity_index)?;
        if let Some(min) = self.min_threshold {
            write!(f, ",min_threshold={}", min)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(values: &[u64]) -> Vec<FieldElement> {
        values.iter().map(|v| FieldElement::from_u64(*v)).collect()
    }

    #[test]
    fn test_default_layout() {
        let layout = PublicInputLayout::default();
        assert_eq!(layout.required_arity(), 3);
        assert!(layout.validate_for(3).is_ok());
        assert_eq!(
            layout.validate_for(2),
            Err(KeyError::LayoutOutOfRange { index: 2, arity: 2 })
        );

        let values = inputs(&[1, 700, 42]);
        assert_eq!(layout.identity_of(&values), Some(&FieldElement::from_u64(42)));
        assert_eq!(layout.threshold_of(&values), Some(&FieldElement::from_u64(700)));
    }

    #[test]
    fn test_parse_and_display() {
        let layout: PublicInputLayout = "identity=0, predicate=2, threshold=1, min_threshold=650"
            .parse()
            .unwrap();
        assert_eq!(layout.identity_index, 0);
        assert_eq!(layout.predicate_index, 2);
        assert_eq!(layout.min_threshold, Some(650));
        assert_eq!(
            layout.to_string(),
            "predicate=2,threshold=1,identity=0,min_threshold=650"
        );
        assert_eq!(layout.to_string().parse::<PublicInputLayout>().unwrap(), layout);

        let no_threshold: PublicInputLayout = "threshold=none,identity=1".parse().unwrap();
        assert_eq!(no_threshold.threshold_index, None);
        assert_eq!(no_threshold.required_arity(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "predicate".parse::<PublicInputLayout>(),
            Err(LayoutParseError::Syntax(_))
        ));
        assert!(matches!(
            "nonce=3".parse::<PublicInputLayout>(),
            Err(LayoutParseError::UnknownKey(_))
        ));
        assert!(matches!(
            "identity=-1".parse::<PublicInputLayout>(),
            Err(LayoutParseError::Value { .. })
        ));
        assert_eq!(
            "identity=0".parse::<PublicInputLayout>(),
            Err(LayoutParseError::DuplicateIndex(0))
        );
    }

    #[test]
    fn test_validate_rejects_shared_positions() {
        // Built directly, as contract arguments are, without going through FromStr
        let layout = PublicInputLayout {
            predicate_index: 0,
            threshold_index: None,
            identity_index: 0,
            min_threshold: None,
        };
        assert_eq!(layout.validate_for(3), Err(KeyError::LayoutDuplicateIndex(0)));
        assert_eq!(
            layout.validate_for(layout.required_arity()),
            Err(KeyError::LayoutDuplicateIndex(0))
        );

        let threshold_on_identity = PublicInputLayout {
            threshold_index: Some(2),
            ..PublicInputLayout::default()
        };
        assert_eq!(
            threshold_on_identity.validate_for(3),
            Err(KeyError::LayoutDuplicateIndex(2))
        );
    }

    #[test]
    fn test_statement_predicate_must_be_one() {
        let layout = PublicInputLayout::default();
        assert!(layout.check_statement(&inputs(&[1, 700, 42])).is_ok());
        assert_eq!(
            layout.check_statement(&inputs(&[0, 700, 42])),
            Err(StatementViolation::PredicateNotSatisfied(FieldElement::ZERO))
        );
        assert!(layout.check_statement(&inputs(&[2, 700, 42])).is_err());
    }

    #[test]
    fn test_statement_minimum_threshold() {
        let layout = PublicInputLayout {
            min_threshold: Some(650),
            ..PublicInputLayout::default()
        };
        assert!(layout.check_statement(&inputs(&[1, 650, 42])).is_ok());
        assert_eq!(
            layout.check_statement(&inputs(&[1, 300, 42])),
            Err(StatementViolation::ThresholdBelowMinimum {
                threshold: 300,
                minimum: 650
            })
        );
    }
}
