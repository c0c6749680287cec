use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::Error;
use super::Prefix;
use crate::derivation::{self_signing::SelfSigning, DerivationCode};
use crate::event_parsing::parsing::from_text_to_bytes;

#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub enum SelfSigningPrefix {
    Ed25519Sha512(Vec<u8>),
    ECDSAsecp256k1Sha256(Vec<u8>),
    Ed448(Vec<u8>),
}

impl SelfSigningPrefix {
    pub fn new(code: SelfSigning, signature: Vec<u8>) -> Self {
        match code {
            SelfSigning::Ed25519Sha512 => Self::Ed25519Sha512(signature),
            SelfSigning::ECDSAsecp256k1Sha256 => Self::ECDSAsecp256k1Sha256(signature),
            SelfSigning::Ed448 => Self::Ed448(signature),
        }
    }

    pub fn get_code(&self) -> SelfSigning {
        match self {
            Self::Ed25519Sha512(_) => SelfSigning::Ed25519Sha512,
            Self::ECDSAsecp256k1Sha256(_) => SelfSigning::ECDSAsecp256k1Sha256,
            Self::Ed448(_) => SelfSigning::Ed448,
        }
    }
}

impl FromStr for SelfSigningPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = SelfSigning::from_str(s)?;

        if s.len() == code.prefix_b64_len() {
            let lead = (4 - code.derivative_b64_len() % 4) % 4;
            let sig = from_text_to_bytes(s[code.code_len()..].as_bytes())
                .map_err(|_| Error::Base64DecodingError)?[lead..]
                .to_vec();
            Ok(Self::new(code, sig))
        } else {
            Err(Error::IncorrectLengthError(s.into()))
        }
    }
}

impl Prefix for SelfSigningPrefix {
    fn derivative(&self) -> Vec<u8> {
        match self {
            Self::Ed25519Sha512(sig) | Self::ECDSAsecp256k1Sha256(sig) | Self::Ed448(sig) => {
                sig.clone()
            }
        }
    }
    fn derivation_code(&self) -> String {
        self.get_code().to_str()
    }
}

/// Serde compatible Serialize
impl Serialize for SelfSigningPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for SelfSigningPrefix {
    fn deserialize<D>(deserializer: D) -> Result<SelfSigningPrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        SelfSigningPrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[test]
fn test_self_signing_roundtrip() -> Result<(), Error> {
    let sig_prefix = SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]);
    let string = sig_prefix.to_str();
    assert_eq!(string.len(), 88);
    assert_eq!(sig_prefix, string.parse()?);
    Ok(())
}
