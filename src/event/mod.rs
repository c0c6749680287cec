use serde::{Deserialize, Serialize};
use serde_hex::{Compact, SerHex};

pub mod event_data;
pub mod receipt;
pub mod sections;

use self::event_data::EventData;
use crate::{
    derivation::self_addressing::SelfAddressing,
    error::Error,
    event_message::{serialization_info::SerializationFormats, EventMessage, EventTypeTag, Typeable},
    prefix::IdentifierPrefix,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KeyEvent {
    #[serde(rename = "i")]
    pub prefix: IdentifierPrefix,

    #[serde(rename = "s", with = "SerHex::<Compact>")]
    pub sn: u64,

    #[serde(flatten)]
    pub event_data: EventData,
}

impl KeyEvent {
    pub fn new(prefix: IdentifierPrefix, sn: u64, event_data: EventData) -> Self {
        KeyEvent {
            prefix,
            sn,
            event_data,
        }
    }

    pub fn get_sn(&self) -> u64 {
        self.sn
    }

    pub fn get_prefix(&self) -> IdentifierPrefix {
        self.prefix.clone()
    }

    pub fn to_message(
        self,
        format: SerializationFormats,
        derivation: SelfAddressing,
    ) -> Result<EventMessage<KeyEvent>, Error> {
        match (&self.prefix, self.event_data.clone()) {
            (IdentifierPrefix::SelfAddressing(_), EventData::Icp(icp)) => {
                icp.incept_self_addressing(derivation, format)
            }
            (IdentifierPrefix::SelfAddressing(_), EventData::Dip(dip)) => {
                dip.incept_self_addressing(derivation, format)
            }
            _ => EventMessage::new(format, derivation, self),
        }
    }
}

impl Typeable for KeyEvent {
    type TypeTag = EventTypeTag;
    fn get_type(&self) -> EventTypeTag {
        self.event_data.get_type()
    }
}
