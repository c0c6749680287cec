use serde::Serialize;
use serde_hex::{Compact, SerHex};

use super::serialization_info::{SerializationFormats, SerializationInfo};
use super::{EventTypeTag, Typeable};
use crate::{
    derivation::self_addressing::{dummy_prefix, SelfAddressing},
    error::Error,
    event::event_data::{DelegatedInceptionEvent, EventData, InceptionEvent},
};

/// Dummy Inception Event
///
/// Encapsulates the identifier derivation process for inception and
/// delegated inception: both the digest and the identifier fields are
/// replaced with placeholders of the eventual length.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct DummyInceptionEvent {
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,
    #[serde(rename = "t")]
    event_type: EventTypeTag,
    #[serde(rename = "d")]
    digest: String,
    #[serde(rename = "i")]
    prefix: String,
    #[serde(rename = "s", with = "SerHex::<Compact>")]
    sn: u8,
    #[serde(flatten)]
    data: EventData,
}

impl DummyInceptionEvent {
    pub fn dummy_inception_data(
        icp: InceptionEvent,
        derivation: &SelfAddressing,
        format: SerializationFormats,
    ) -> Result<Self, Error> {
        DummyInceptionEvent::derive_data(EventData::Icp(icp), derivation, format)
    }

    pub fn dummy_delegated_inception_data(
        dip: DelegatedInceptionEvent,
        derivation: &SelfAddressing,
        format: SerializationFormats,
    ) -> Result<Self, Error> {
        DummyInceptionEvent::derive_data(EventData::Dip(dip), derivation, format)
    }

    fn derive_data(
        data: EventData,
        derivation: &SelfAddressing,
        format: SerializationFormats,
    ) -> Result<Self, Error> {
        let mut dummy = Self {
            serialization_info: SerializationInfo::new_empty(format),
            event_type: (&data).into(),
            digest: dummy_prefix(derivation),
            prefix: dummy_prefix(derivation),
            sn: 0,
            data,
        };
        let size = dummy.encode()?.len();
        dummy.serialization_info.size = size;
        Ok(dummy)
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        self.serialization_info.kind.encode(&self)
    }
}

/// Dummy Event
///
/// Replaces the digest field with a placeholder during event digest
/// computation.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct DummyEvent<T: Serialize, D: Serialize + Typeable<TypeTag = T>> {
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,
    #[serde(rename = "t")]
    pub event_type: T,
    #[serde(rename = "d")]
    pub digest: String,
    #[serde(flatten)]
    pub data: D,
}

impl<T: Serialize, D: Serialize + Typeable<TypeTag = T>> DummyEvent<T, D> {
    pub fn dummy_event(
        event: D,
        format: SerializationFormats,
        derivation: &SelfAddressing,
    ) -> Result<Self, Error> {
        let mut dummy = DummyEvent {
            serialization_info: SerializationInfo::new_empty(format),
            event_type: event.get_type(),
            digest: dummy_prefix(derivation),
            data: event,
        };
        let size = dummy.encode()?.len();
        dummy.serialization_info.size = size;
        Ok(dummy)
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        self.serialization_info.kind.encode(&self)
    }
}
