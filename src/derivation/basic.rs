use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{DerivationCode, DerivationError};
use crate::{keys::PublicKey, prefix::BasicPrefix};

/// Basic Derivations
///
/// Basic prefix derivation is just a public key (2.3.1)
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash, Eq)]
pub enum Basic {
    ECDSAsecp256k1NT,
    ECDSAsecp256k1,
    Ed25519NT,
    Ed25519,
    Ed448NT,
    Ed448,
    X25519,
    X448,
}

impl Basic {
    pub fn derive(&self, public_key: PublicKey) -> BasicPrefix {
        BasicPrefix::new(*self, public_key)
    }

    /// Non transferable means that the public key is always the current public key.
    /// Transferable means that the public key might have changed and
    /// you need to request KEL to obtain the newest one.
    pub fn is_transferable(&self) -> bool {
        !matches!(self, Basic::ECDSAsecp256k1NT | Basic::Ed25519NT | Basic::Ed448NT)
    }
}

impl DerivationCode for Basic {
    fn code_len(&self) -> usize {
        match self {
            Self::Ed25519NT | Self::X25519 | Self::Ed25519 | Self::X448 => 1,
            Self::ECDSAsecp256k1NT | Self::ECDSAsecp256k1 | Self::Ed448NT | Self::Ed448 => 4,
        }
    }

    fn derivative_b64_len(&self) -> usize {
        match self {
            Self::Ed25519NT | Self::X25519 | Self::Ed25519 => 43,
            Self::ECDSAsecp256k1NT | Self::ECDSAsecp256k1 => 44,
            Self::X448 => 75,
            Self::Ed448NT | Self::Ed448 => 76,
        }
    }

    fn to_str(&self) -> String {
        match self {
            Self::Ed25519NT => "B",
            Self::X25519 => "C",
            Self::Ed25519 => "D",
            Self::X448 => "L",
            Self::ECDSAsecp256k1NT => "1AAA",
            Self::ECDSAsecp256k1 => "1AAB",
            Self::Ed448NT => "1AAC",
            Self::Ed448 => "1AAD",
        }
        .into()
    }
}

impl FromStr for Basic {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.get(..1).ok_or_else(|| DerivationError::UnknownCode(s.into()))? {
            "B" => Ok(Self::Ed25519NT),
            "C" => Ok(Self::X25519),
            "D" => Ok(Self::Ed25519),
            "L" => Ok(Self::X448),
            "1" => match s.get(..4).ok_or_else(|| DerivationError::UnknownCode(s.into()))? {
                "1AAA" => Ok(Self::ECDSAsecp256k1NT),
                "1AAB" => Ok(Self::ECDSAsecp256k1),
                "1AAC" => Ok(Self::Ed448NT),
                "1AAD" => Ok(Self::Ed448),
                _ => Err(DerivationError::UnknownCode(s.into())),
            },
            _ => Err(DerivationError::UnknownCode(s.into())),
        }
    }
}

#[test]
fn test_code_roundtrip() -> Result<(), DerivationError> {
    for code in [Basic::Ed25519, Basic::Ed25519NT, Basic::ECDSAsecp256k1, Basic::Ed448NT].iter() {
        assert_eq!(code, &code.to_str().parse::<Basic>()?);
    }
    assert!("Z".parse::<Basic>().is_err());
    Ok(())
}
