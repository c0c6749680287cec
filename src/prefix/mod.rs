use core::str::FromStr;
use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use self::error::Error;
use crate::event_parsing::parsing::from_bytes_to_text;

pub mod attached_signature;
pub mod basic;
pub mod error;
pub mod self_addressing;
pub mod self_signing;

pub use attached_signature::{AttachedSignaturePrefix, Index};
pub use basic::BasicPrefix;
pub use self_addressing::SelfAddressingPrefix;
pub use self_signing::SelfSigningPrefix;

pub trait Prefix: FromStr<Err = Error> {
    fn derivative(&self) -> Vec<u8>;
    fn derivation_code(&self) -> String;
    fn to_str(&self) -> String {
        match self.derivative().len() {
            // empty data cannot be prefixed!
            0 => "".to_string(),
            _ => {
                let dc = self.derivation_code();
                // lead bytes are replaced by the code
                let lead_chars = dc.len() % 4;
                let derivative_text =
                    from_bytes_to_text(&self.derivative())[lead_chars..].to_string();
                [dc, derivative_text].join("")
            }
        }
    }
}

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub enum IdentifierPrefix {
    Basic(BasicPrefix),
    SelfAddressing(SelfAddressingPrefix),
    SelfSigning(SelfSigningPrefix),
}

impl IdentifierPrefix {
    /// An identifier is transferable when its derivation allows the signing
    /// authority to be rotated away from the inception keys.
    pub fn is_transferable(&self) -> bool {
        match self {
            IdentifierPrefix::Basic(bp) => bp.is_transferable(),
            IdentifierPrefix::SelfAddressing(_) => true,
            IdentifierPrefix::SelfSigning(_) => true,
        }
    }
}

impl Display for IdentifierPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for IdentifierPrefix {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match BasicPrefix::from_str(s) {
            Ok(bp) => Ok(Self::Basic(bp)),
            Err(_) => match SelfAddressingPrefix::from_str(s) {
                Ok(sa) => Ok(Self::SelfAddressing(sa)),
                Err(_) => Ok(Self::SelfSigning(SelfSigningPrefix::from_str(s)?)),
            },
        }
    }
}

impl Prefix for IdentifierPrefix {
    fn derivative(&self) -> Vec<u8> {
        match self {
            Self::Basic(bp) => bp.derivative(),
            Self::SelfAddressing(sap) => sap.derivative(),
            Self::SelfSigning(ssp) => ssp.derivative(),
        }
    }
    fn derivation_code(&self) -> String {
        match self {
            Self::Basic(bp) => bp.derivation_code(),
            Self::SelfAddressing(sap) => sap.derivation_code(),
            Self::SelfSigning(ssp) => ssp.derivation_code(),
        }
    }
}

/// Serde compatible Serialize
impl Serialize for IdentifierPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for IdentifierPrefix {
    fn deserialize<D>(deserializer: D) -> Result<IdentifierPrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        IdentifierPrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for IdentifierPrefix {
    fn default() -> Self {
        IdentifierPrefix::SelfAddressing(SelfAddressingPrefix::default())
    }
}

/// Verify
///
/// Uses a public key to verify a signature against some data, with
/// the key and signature represented by Basic and Self-Signing Prefixes
pub fn verify(
    data: &[u8],
    key: &BasicPrefix,
    signature: &SelfSigningPrefix,
) -> Result<bool, Error> {
    match key {
        BasicPrefix::Ed25519(pk) | BasicPrefix::Ed25519NT(pk) => match signature {
            SelfSigningPrefix::Ed25519Sha512(signature) => Ok(pk.verify_ed(data, signature)),
            _ => Err(Error::WrongSignatureTypeError),
        },
        BasicPrefix::ECDSAsecp256k1(key) | BasicPrefix::ECDSAsecp256k1NT(key) => match signature {
            SelfSigningPrefix::ECDSAsecp256k1Sha256(signature) => {
                Ok(key.verify_ecdsa(data, signature))
            }
            _ => Err(Error::WrongSignatureTypeError),
        },
        _ => Err(Error::WrongKeyTypeError),
    }
}
