use core::str::FromStr;
use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::Error;
use super::Prefix;
use crate::derivation::{self_addressing::SelfAddressing, DerivationCode};
use crate::event_parsing::parsing::from_text_to_bytes;

/// Self Addressing Prefix
///
/// A digest of some data, qualified by the algorithm which produced it.
#[derive(Debug, Clone, Eq, Hash)]
pub struct SelfAddressingPrefix {
    pub derivation: SelfAddressing,
    pub digest: Vec<u8>,
}

impl SelfAddressingPrefix {
    pub fn new(derivation: SelfAddressing, digest: Vec<u8>) -> Self {
        Self { derivation, digest }
    }

    /// Checks that this digest was derived from the given data.
    pub fn verify_binding(&self, sed: &[u8]) -> bool {
        self.derivation.digest(sed) == self.digest
    }
}

impl PartialEq for SelfAddressingPrefix {
    fn eq(&self, other: &Self) -> bool {
        self.derivation == other.derivation && self.digest == other.digest
    }
}

impl Default for SelfAddressingPrefix {
    fn default() -> Self {
        Self {
            derivation: SelfAddressing::Blake3_256,
            digest: vec![],
        }
    }
}

impl FromStr for SelfAddressingPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = SelfAddressing::from_str(s)?;

        if s.len() == code.prefix_b64_len() {
            let lead = (4 - code.derivative_b64_len() % 4) % 4;
            let digest = from_text_to_bytes(s[code.code_len()..].as_bytes())
                .map_err(|_| Error::Base64DecodingError)?[lead..]
                .to_vec();
            Ok(Self::new(code, digest))
        } else {
            Err(Error::IncorrectLengthError(s.into()))
        }
    }
}

impl Prefix for SelfAddressingPrefix {
    fn derivative(&self) -> Vec<u8> {
        self.digest.clone()
    }
    fn derivation_code(&self) -> String {
        self.derivation.to_str()
    }
}

impl Display for SelfAddressingPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Serde compatible Serialize
impl Serialize for SelfAddressingPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for SelfAddressingPrefix {
    fn deserialize<D>(deserializer: D) -> Result<SelfAddressingPrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        SelfAddressingPrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[test]
fn test_self_addressing_roundtrip() -> Result<(), Error> {
    let data = b"BDjXHlcskwOzNj8rYbV8IQ6ox2TW_KkbA1K3-n0EU0un";
    let dig = SelfAddressing::Blake3_256.derive(data);

    assert!(dig.verify_binding(data));
    assert_eq!(dig.to_str().len(), 44);

    let parsed: SelfAddressingPrefix = dig.to_str().parse()?;
    assert_eq!(parsed, dig);
    Ok(())
}
