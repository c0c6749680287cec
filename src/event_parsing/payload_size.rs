use core::str::FromStr;

use crate::error::Error;

/// Payload Type
///
/// Counter codes framing attached cryptographic material; every group
/// opens with a code and a two character Base64 count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    /// Indexed controller signatures
    MA,
    /// Nontransferable receipt couplets
    MC,
    /// Transferable receipt (seal + signatures) groups
    MF,
    /// Source seal couples (delegator anchor)
    MG,
    /// Counted attachment frame, count in quadlets
    MV,
}

impl PayloadType {
    pub fn to_str(self) -> String {
        match self {
            Self::MA => "-A",
            Self::MC => "-C",
            Self::MF => "-F",
            Self::MG => "-G",
            Self::MV => "-V",
        }
        .to_string()
    }
}

impl FromStr for PayloadType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-A" => Ok(Self::MA),
            "-C" => Ok(Self::MC),
            "-F" => Ok(Self::MF),
            "-G" => Ok(Self::MG),
            "-V" => Ok(Self::MV),
            _ => Err(Error::DeserializeError(format!(
                "Unknown attachment counter code: {}",
                s
            ))),
        }
    }
}
