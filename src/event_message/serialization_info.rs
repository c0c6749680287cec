use core::str::FromStr;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Protocol tag opening every version string.
pub const PROTOCOL_TAG: &str = "KERI";

/// Length in characters of a serialized version string,
/// `XXXXvvKKKKssssss_`.
pub const VERSION_STRING_LEN: usize = 17;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializationFormats {
    JSON,
    MGPK,
    CBOR,
}

impl SerializationFormats {
    pub fn encode<T: Serialize>(&self, message: &T) -> Result<Vec<u8>, Error> {
        match self {
            Self::JSON => serde_json::to_vec(message)
                .map_err(|e| Error::SerializationError(e.to_string())),
            Self::CBOR => serde_cbor::to_vec(message)
                .map_err(|e| Error::SerializationError(e.to_string())),
            Self::MGPK => rmp_serde::to_vec_named(message)
                .map_err(|e| Error::SerializationError(e.to_string())),
        }
    }

    pub fn to_str(&self) -> String {
        match self {
            Self::JSON => "JSON",
            Self::CBOR => "CBOR",
            Self::MGPK => "MGPK",
        }
        .to_string()
    }
}

impl FromStr for SerializationFormats {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JSON" => Ok(SerializationFormats::JSON),
            "MGPK" => Ok(SerializationFormats::MGPK),
            "CBOR" => Ok(SerializationFormats::CBOR),
            _ => Err(Error::VersionError(s.into())),
        }
    }
}

/// Serialization Info
///
/// Parsed out version string of a message: protocol version, serialization
/// kind and total serialized size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializationInfo {
    pub major_version: u8,
    pub minor_version: u8,
    pub size: usize,
    pub kind: SerializationFormats,
}

impl SerializationInfo {
    pub fn new(kind: SerializationFormats, size: usize) -> Self {
        Self {
            major_version: 1,
            minor_version: 0,
            size,
            kind,
        }
    }

    pub fn new_empty(kind: SerializationFormats) -> Self {
        Self::new(kind, 0)
    }

    pub fn to_str(&self) -> String {
        format!(
            "{}{:x}{:x}{}{:06x}_",
            PROTOCOL_TAG,
            self.major_version,
            self.minor_version,
            self.kind.to_str(),
            self.size
        )
    }
}

impl FromStr for SerializationInfo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < VERSION_STRING_LEN {
            return Err(Error::VersionError(s.into()));
        }
        if &s[..4] != PROTOCOL_TAG {
            return Err(Error::VersionError(s.into()));
        }
        if &s[16..17] != "_" {
            return Err(Error::VersionError(s.into()));
        }
        Ok(Self {
            major_version: u8::from_str_radix(&s[4..5], 16)
                .map_err(|_| Error::VersionError(s.into()))?,
            minor_version: u8::from_str_radix(&s[5..6], 16)
                .map_err(|_| Error::VersionError(s.into()))?,
            kind: SerializationFormats::from_str(&s[6..10])?,
            size: usize::from_str_radix(&s[10..16], 16)
                .map_err(|_| Error::VersionError(s.into()))?,
        })
    }
}

impl Default for SerializationInfo {
    fn default() -> Self {
        Self::new_empty(SerializationFormats::JSON)
    }
}

impl fmt::Display for SerializationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Serde compatible Serialize
impl Serialize for SerializationInfo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for SerializationInfo {
    fn deserialize<D>(deserializer: D) -> Result<SerializationInfo, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        SerializationInfo::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_roundtrip() -> Result<(), Error> {
        let info = SerializationInfo::new(SerializationFormats::JSON, 0x12b);
        assert_eq!(info.to_str(), "KERI10JSON00012b_");

        let parsed: SerializationInfo = "KERI10JSON00012b_".parse()?;
        assert_eq!(parsed, info);
        assert_eq!(parsed.size, 299);

        assert!("KERI10XXXX00012b_".parse::<SerializationInfo>().is_err());
        assert!("XXXX10JSON00012b_".parse::<SerializationInfo>().is_err());
        assert!("KERI10JSON00012b".parse::<SerializationInfo>().is_err());
        Ok(())
    }

    #[test]
    fn version_size_is_fixed_width() {
        // the version string length must not change with the size value,
        // else the two-pass size computation would drift
        let small = SerializationInfo::new(SerializationFormats::JSON, 1);
        let big = SerializationInfo::new(SerializationFormats::JSON, 0xffffff);
        assert_eq!(small.to_str().len(), VERSION_STRING_LEN);
        assert_eq!(big.to_str().len(), VERSION_STRING_LEN);
    }
}
