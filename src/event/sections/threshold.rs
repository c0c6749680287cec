use std::{fmt, str::FromStr};

use fraction::Fraction;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_hex::{Compact, SerHex};

use crate::{error::Error, prefix::AttachedSignaturePrefix};

#[derive(Debug, thiserror::Error)]
pub enum ThresholdError {
    #[error("Error parsing numerical value")]
    ParseIntError,
    #[error("Malformed signing weight")]
    MalformedWeight,
}

impl From<core::num::ParseIntError> for ThresholdError {
    fn from(_: core::num::ParseIntError) -> Self {
        ThresholdError::ParseIntError
    }
}

/// A rational signing weight, carried on the wire as a fraction string
/// like `"1/2"`, or a bare numerator for whole units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight {
    numerator: u64,
    denominator: u64,
}

impl Weight {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    fn value(&self) -> Fraction {
        Fraction::new(self.numerator, self.denominator)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Weight {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.find('/') {
            None => Ok(Weight::new(s.parse()?, 1)),
            Some(at) => {
                let denominator: u64 = s[at + 1..].parse()?;
                if denominator == 0 {
                    return Err(ThresholdError::MalformedWeight);
                }
                Ok(Weight::new(s[..at].parse()?, denominator))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

impl Serialize for Weight {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Signing threshold of a key configuration: either a plain M-of-N
/// count, or per-key rational weights.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SignatureThreshold {
    #[serde(with = "SerHex::<Compact>")]
    Simple(u64),
    Weighted(WeightedThreshold),
}

impl SignatureThreshold {
    pub fn simple(t: u64) -> Self {
        Self::Simple(t)
    }

    pub fn single_weighted(fracs: Vec<(u64, u64)>) -> Self {
        Self::Weighted(WeightedThreshold::Single(
            fracs.into_iter().map(|(n, d)| Weight::new(n, d)).collect(),
        ))
    }

    pub fn multi_weighted(fracs: Vec<Vec<(u64, u64)>>) -> Self {
        Self::Weighted(WeightedThreshold::Multi(
            fracs
                .into_iter()
                .map(|clause| clause.into_iter().map(|(n, d)| Weight::new(n, d)).collect())
                .collect(),
        ))
    }

    /// Checks whether the signers behind the given attached signatures
    /// clear the threshold. Assumes the signatures themselves already
    /// verified; only the index set matters here.
    pub fn satisfied_by(&self, sigs: &[AttachedSignaturePrefix]) -> Result<bool, Error> {
        let indexes: Vec<usize> = sigs
            .iter()
            .map(|sig| sig.index.current() as usize)
            .collect();
        self.enough_signatures(&indexes)
    }

    pub fn enough_signatures(&self, indexes: &[usize]) -> Result<bool, Error> {
        match self {
            SignatureThreshold::Simple(t) => Ok((indexes.len() as u64) >= *t),
            SignatureThreshold::Weighted(weights) => weights.enough_signatures(indexes),
        }
    }
}

impl Default for SignatureThreshold {
    fn default() -> Self {
        Self::Simple(1)
    }
}

/// Weighted threshold: one weight per key, in key-list order. The
/// weights may be split into clauses; every clause has to gather a full
/// unit on its own, which encodes conjunctive partial-rotation
/// authority.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WeightedThreshold {
    Single(Vec<Weight>),
    Multi(Vec<Vec<Weight>>),
}

impl WeightedThreshold {
    /// Length of the key list this weight table is written for.
    pub fn expected_key_count(&self) -> usize {
        match self {
            WeightedThreshold::Single(weights) => weights.len(),
            WeightedThreshold::Multi(clauses) => clauses.iter().map(|c| c.len()).sum(),
        }
    }

    pub fn enough_signatures(&self, indexes: &[usize]) -> Result<bool, Error> {
        // every signer index must name a weight
        if indexes.iter().any(|i| *i >= self.expected_key_count()) {
            return Err(Error::SemanticError(
                "Signature index out of weight table".into(),
            ));
        }
        Ok(match self {
            WeightedThreshold::Single(weights) => clause_satisfied(weights, 0, indexes),
            WeightedThreshold::Multi(clauses) => {
                let mut start = 0;
                let mut satisfied = true;
                for clause in clauses {
                    satisfied &= clause_satisfied(clause, start, indexes);
                    start += clause.len();
                }
                satisfied
            }
        })
    }
}

/// Sums the weights of the indexes falling into the clause window and
/// requires a full unit.
fn clause_satisfied(clause: &[Weight], start: usize, indexes: &[usize]) -> bool {
    let window = start..start + clause.len();
    let sum = indexes
        .iter()
        .filter(|i| window.contains(*i))
        .map(|i| clause[i - start].value())
        .fold(Fraction::new(0u64, 1u64), |acc, weight| acc + weight);
    sum >= Fraction::new(1u64, 1u64)
}
