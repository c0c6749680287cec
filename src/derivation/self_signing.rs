use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{DerivationCode, DerivationError};
use crate::prefix::SelfSigningPrefix;

/// Self Signing Derivations
///
/// A self-signing prefix derivation outputs a signature as its derivative (2.3.5)
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash, Eq)]
pub enum SelfSigning {
    Ed25519Sha512,
    ECDSAsecp256k1Sha256,
    Ed448,
}

impl SelfSigning {
    pub fn derive(&self, sig: Vec<u8>) -> SelfSigningPrefix {
        SelfSigningPrefix::new(*self, sig)
    }
}

impl DerivationCode for SelfSigning {
    fn code_len(&self) -> usize {
        match self {
            Self::Ed25519Sha512 | Self::ECDSAsecp256k1Sha256 => 2,
            Self::Ed448 => 4,
        }
    }

    fn derivative_b64_len(&self) -> usize {
        match self {
            Self::Ed25519Sha512 | Self::ECDSAsecp256k1Sha256 => 86,
            Self::Ed448 => 152,
        }
    }

    fn to_str(&self) -> String {
        match self {
            Self::Ed25519Sha512 => "0B",
            Self::ECDSAsecp256k1Sha256 => "0C",
            Self::Ed448 => "1AAE",
        }
        .into()
    }
}

impl FromStr for SelfSigning {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.get(..2).ok_or_else(|| DerivationError::UnknownCode(s.into()))? {
            "0B" => Ok(Self::Ed25519Sha512),
            "0C" => Ok(Self::ECDSAsecp256k1Sha256),
            "1A" => match s.get(..4).ok_or_else(|| DerivationError::UnknownCode(s.into()))? {
                "1AAE" => Ok(Self::Ed448),
                _ => Err(DerivationError::UnknownCode(s.into())),
            },
            _ => Err(DerivationError::UnknownCode(s.into())),
        }
    }
}
