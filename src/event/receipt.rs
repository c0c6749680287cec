use serde::{Deserialize, Serialize};
use serde_hex::{Compact, SerHex};

use crate::event_message::{EventTypeTag, Typeable};
use crate::prefix::IdentifierPrefix;

/// Receipt
///
/// The common body of `rct` and `vrc` messages; the envelope digest field
/// carries the digest of the *receipted* event, not of the receipt itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Receipted Event identifier
    #[serde(rename = "i")]
    pub prefix: IdentifierPrefix,

    /// Receipted Event sn
    #[serde(rename = "s", with = "SerHex::<Compact>")]
    pub sn: u64,
}

impl Receipt {
    pub fn new(prefix: IdentifierPrefix, sn: u64) -> Self {
        Self { prefix, sn }
    }
}

impl Typeable for Receipt {
    type TypeTag = EventTypeTag;
    fn get_type(&self) -> EventTypeTag {
        EventTypeTag::Rct
    }
}
