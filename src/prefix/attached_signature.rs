use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::Error;
use super::{Prefix, SelfSigningPrefix};
use crate::derivation::{
    attached_signature_code::AttachedSignatureCode, DerivationCode,
};
use crate::event_parsing::parsing::from_text_to_bytes;

/// Signer index of an attached signature.
///
/// `BothSame` and `BothDifferent` additionally commit to the signer's
/// position in the prior next-key list, which partial rotations and
/// validator receipts rely on.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub enum Index {
    CurrentOnly(u16),
    BothSame(u16),
    BothDifferent(u16, u16),
}

impl Index {
    pub fn current(&self) -> u16 {
        *match self {
            Index::CurrentOnly(current) => current,
            Index::BothSame(current) => current,
            Index::BothDifferent(current, _prev_next) => current,
        }
    }

    pub fn previous_next(&self) -> Option<u16> {
        match self {
            Index::CurrentOnly(_) => None,
            Index::BothSame(current) => Some(*current),
            Index::BothDifferent(_, prev_next) => Some(*prev_next),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AttachedSignaturePrefix {
    pub index: Index,
    pub signature: SelfSigningPrefix,
}

impl AttachedSignaturePrefix {
    pub fn new(signature: SelfSigningPrefix, index: u16) -> Self {
        Self {
            signature,
            index: Index::BothSame(index),
        }
    }

    pub fn new_both_different(signature: SelfSigningPrefix, index: u16, ondex: u16) -> Self {
        Self {
            signature,
            index: Index::BothDifferent(index, ondex),
        }
    }

    fn code(&self) -> AttachedSignatureCode {
        match self.index {
            Index::BothSame(i) | Index::CurrentOnly(i) => {
                AttachedSignatureCode::new(self.signature.get_code(), i)
            }
            Index::BothDifferent(i, o) => {
                AttachedSignatureCode::new_with_ondex(self.signature.get_code(), i, o)
            }
        }
    }
}

impl FromStr for AttachedSignaturePrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = AttachedSignatureCode::from_str(s)?;

        if s.len() == code.prefix_b64_len() {
            let lead = (4 - code.derivative_b64_len() % 4) % 4;
            let sig = from_text_to_bytes(s[code.code_len()..].as_bytes())
                .map_err(|_| Error::Base64DecodingError)?[lead..]
                .to_vec();
            let signature = SelfSigningPrefix::new(code.code, sig);
            Ok(match code.ondex {
                Some(ondex) => Self::new_both_different(signature, code.index, ondex),
                None => Self::new(signature, code.index),
            })
        } else {
            Err(Error::IncorrectLengthError(s.into()))
        }
    }
}

impl Prefix for AttachedSignaturePrefix {
    fn derivative(&self) -> Vec<u8> {
        self.signature.derivative()
    }
    fn derivation_code(&self) -> String {
        self.code().to_str()
    }
}

/// Serde compatible Serialize
impl Serialize for AttachedSignaturePrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for AttachedSignaturePrefix {
    fn deserialize<D>(deserializer: D) -> Result<AttachedSignaturePrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        AttachedSignaturePrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize() -> Result<(), Error> {
        let attached_ed_1 = ["AB", &"A".repeat(86)].join("");
        let attached_dual = ["2AABAE", &"A".repeat(86)].join("");

        let pref_ed_1 = AttachedSignaturePrefix::from_str(&attached_ed_1)?;
        let pref_dual = AttachedSignaturePrefix::from_str(&attached_dual)?;

        assert_eq!(1, pref_ed_1.index.current());
        assert_eq!(Some(1), pref_ed_1.index.previous_next());
        assert_eq!(1, pref_dual.index.current());
        assert_eq!(Some(4), pref_dual.index.previous_next());
        Ok(())
    }

    #[test]
    fn serialize() -> Result<(), Error> {
        let pref_ed_2 =
            AttachedSignaturePrefix::new(SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]), 2);
        assert_eq!(88, pref_ed_2.to_str().len());
        assert_eq!(
            pref_ed_2.to_str(),
            ["AC", &"A".repeat(86)].join("")
        );

        let pref_dual = AttachedSignaturePrefix::new_both_different(
            SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]),
            1,
            4,
        );
        assert_eq!(92, pref_dual.to_str().len());
        assert_eq!(pref_dual.to_str(), ["2AABAE", &"A".repeat(86)].join(""));

        let roundtrip: AttachedSignaturePrefix = pref_dual.to_str().parse()?;
        assert_eq!(roundtrip, pref_dual);
        Ok(())
    }
}
