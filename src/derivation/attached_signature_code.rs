use core::str::FromStr;

use super::{self_signing::SelfSigning, DerivationCode, DerivationError};
use crate::event_parsing::parsing::{b64_to_num, num_to_b64};

/// Attached Signature Derivation Codes
///
/// An attached signature code qualifies an indexed signature: the index is
/// the signer's position in the current key list, the optional ondex its
/// position in the prior next-key list (used by partial rotations and
/// validator receipts).
#[derive(Debug, PartialEq, Clone)]
pub struct AttachedSignatureCode {
    pub index: u16,
    pub ondex: Option<u16>,
    pub code: SelfSigning,
}

impl AttachedSignatureCode {
    pub fn new(code: SelfSigning, index: u16) -> Self {
        Self {
            index,
            ondex: None,
            code,
        }
    }

    pub fn new_with_ondex(code: SelfSigning, index: u16, ondex: u16) -> Self {
        Self {
            index,
            ondex: Some(ondex),
            code,
        }
    }
}

impl DerivationCode for AttachedSignatureCode {
    // hard part of the code + index characters
    fn code_len(&self) -> usize {
        match (self.code, self.ondex) {
            (SelfSigning::Ed25519Sha512, None) | (SelfSigning::ECDSAsecp256k1Sha256, None) => 2,
            (SelfSigning::Ed25519Sha512, Some(_)) => 6,
            (SelfSigning::Ed448, None) => 4,
            _ => 6,
        }
    }

    fn derivative_b64_len(&self) -> usize {
        match self.code {
            SelfSigning::Ed25519Sha512 | SelfSigning::ECDSAsecp256k1Sha256 => 86,
            SelfSigning::Ed448 => 152,
        }
    }

    fn to_str(&self) -> String {
        match (self.code, self.ondex) {
            (SelfSigning::Ed25519Sha512, None) => ["A", &num_to_b64(self.index, 1)].join(""),
            (SelfSigning::ECDSAsecp256k1Sha256, None) => ["C", &num_to_b64(self.index, 1)].join(""),
            (SelfSigning::Ed448, None) => ["0A", &num_to_b64(self.index, 2)].join(""),
            (SelfSigning::Ed25519Sha512, Some(ondex)) => [
                "2A",
                &num_to_b64(self.index, 2),
                &num_to_b64(ondex, 2),
            ]
            .join(""),
            (SelfSigning::ECDSAsecp256k1Sha256, Some(ondex)) => [
                "2C",
                &num_to_b64(self.index, 2),
                &num_to_b64(ondex, 2),
            ]
            .join(""),
            (SelfSigning::Ed448, Some(ondex)) => [
                "2D",
                &num_to_b64(self.index, 2),
                &num_to_b64(ondex, 2),
            ]
            .join(""),
        }
    }
}

impl FromStr for AttachedSignatureCode {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index_err = |s: &str| DerivationError::IncorrectLength(s.into());
        match s.get(..1).ok_or_else(|| DerivationError::UnknownCode(s.into()))? {
            "A" => Ok(Self::new(
                SelfSigning::Ed25519Sha512,
                b64_to_num(s.get(1..2).ok_or_else(|| index_err(s))?.as_bytes())
                    .map_err(|_| index_err(s))?,
            )),
            "C" => Ok(Self::new(
                SelfSigning::ECDSAsecp256k1Sha256,
                b64_to_num(s.get(1..2).ok_or_else(|| index_err(s))?.as_bytes())
                    .map_err(|_| index_err(s))?,
            )),
            "0" => match s.get(..2).ok_or_else(|| DerivationError::UnknownCode(s.into()))? {
                "0A" => Ok(Self::new(
                    SelfSigning::Ed448,
                    b64_to_num(s.get(2..4).ok_or_else(|| index_err(s))?.as_bytes())
                        .map_err(|_| index_err(s))?,
                )),
                _ => Err(DerivationError::UnknownCode(s.into())),
            },
            "2" => {
                let code = match s.get(..2).ok_or_else(|| DerivationError::UnknownCode(s.into()))? {
                    "2A" => SelfSigning::Ed25519Sha512,
                    "2C" => SelfSigning::ECDSAsecp256k1Sha256,
                    "2D" => SelfSigning::Ed448,
                    _ => return Err(DerivationError::UnknownCode(s.into())),
                };
                let index = b64_to_num(s.get(2..4).ok_or_else(|| index_err(s))?.as_bytes())
                    .map_err(|_| index_err(s))?;
                let ondex = b64_to_num(s.get(4..6).ok_or_else(|| index_err(s))?.as_bytes())
                    .map_err(|_| index_err(s))?;
                Ok(Self::new_with_ondex(code, index, ondex))
            }
            _ => Err(DerivationError::UnknownCode(s.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() -> Result<(), DerivationError> {
        let simple = AttachedSignatureCode::new(SelfSigning::Ed25519Sha512, 3);
        assert_eq!(simple.to_str(), "AD");
        assert_eq!("AD".parse::<AttachedSignatureCode>()?, simple);

        let dual = AttachedSignatureCode::new_with_ondex(SelfSigning::Ed25519Sha512, 1, 4);
        assert_eq!(dual.to_str(), "2AABAE");
        assert_eq!("2AABAE".parse::<AttachedSignatureCode>()?, dual);

        let ed448 = AttachedSignatureCode::new(SelfSigning::Ed448, 4);
        assert_eq!(ed448.to_str(), "0AAE");
        assert_eq!("0AAE".parse::<AttachedSignatureCode>()?, ed448);
        Ok(())
    }
}
