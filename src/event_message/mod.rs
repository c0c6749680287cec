pub mod dummy_event;
pub mod event_msg_builder;
pub mod key_event_message;
pub mod serialization_info;
pub mod signed_event_message;

use serde::{Deserialize, Serialize};

use self::dummy_event::DummyEvent;
use self::serialization_info::{SerializationFormats, SerializationInfo};
use crate::{
    derivation::self_addressing::SelfAddressing,
    error::Error,
    event::receipt::Receipt,
    prefix::SelfAddressingPrefix,
};

pub trait Typeable {
    type TypeTag;
    fn get_type(&self) -> Self::TypeTag;
}

/// Accessor for the self-addressing digest carried by a message envelope.
pub trait Digestible {
    fn get_digest(&self) -> SelfAddressingPrefix;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventTypeTag {
    Icp,
    Rot,
    Ixn,
    Dip,
    Drt,
    Rct,
    Vrc,
}

impl EventTypeTag {
    pub fn is_establishment_event(&self) -> bool {
        matches!(
            self,
            EventTypeTag::Icp | EventTypeTag::Rot | EventTypeTag::Dip | EventTypeTag::Drt
        )
    }
}

/// Event Message
///
/// A versioned, self-addressed message envelope. For key events the `d`
/// field is the digest of the event's own dummied serialization; for
/// receipts it is the digest of the receipted event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventMessage<D> {
    /// Serialization Information
    ///
    /// Encodes the version, size and serialization format of the event
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,

    #[serde(rename = "t")]
    pub event_type: EventTypeTag,

    #[serde(rename = "d")]
    pub digest: SelfAddressingPrefix,

    #[serde(flatten)]
    pub event: D,
}

impl<D: Serialize + Clone + Typeable<TypeTag = EventTypeTag>> EventMessage<D> {
    pub fn new(
        format: SerializationFormats,
        derivation: SelfAddressing,
        event: D,
    ) -> Result<Self, Error> {
        let dummy = DummyEvent::dummy_event(event.clone(), format, &derivation)?;
        let digest = derivation.derive(&dummy.encode()?);
        Ok(Self {
            serialization_info: dummy.serialization_info,
            event_type: event.get_type(),
            digest,
            event,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        self.serialization_info.kind.encode(self)
    }
}

impl<D> EventMessage<D> {
    pub fn get_digest(&self) -> SelfAddressingPrefix {
        self.digest.clone()
    }
}

impl<D> Digestible for EventMessage<D> {
    fn get_digest(&self) -> SelfAddressingPrefix {
        self.digest.clone()
    }
}

impl EventMessage<Receipt> {
    /// Builds a receipt message for the event with the given digest.
    /// `event_type` distinguishes witness receipts (rct) from validator
    /// receipts (vrc).
    pub fn new_receipt(
        format: SerializationFormats,
        event_type: EventTypeTag,
        receipted_event_digest: SelfAddressingPrefix,
        receipt: Receipt,
    ) -> Result<Self, Error> {
        let mut message = Self {
            serialization_info: SerializationInfo::new_empty(format),
            event_type,
            digest: receipted_event_digest,
            event: receipt,
        };
        let size = message.serialization_info.kind.encode(&message)?.len();
        message.serialization_info.size = size;
        Ok(message)
    }
}
