use serde::{Deserialize, Serialize};

use super::{EventData, InceptionEvent};
use crate::{
    derivation::self_addressing::SelfAddressing,
    error::Error,
    event::KeyEvent,
    event_message::{
        dummy_event::DummyInceptionEvent, serialization_info::SerializationFormats, EventMessage,
        Typeable,
    },
    prefix::IdentifierPrefix,
    state::{EventSemantics, IdentifierState},
};

/// Delegated Inception Event
///
/// An inception whose authority is anchored in the delegator's key event log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DelegatedInceptionEvent {
    #[serde(flatten)]
    pub inception_data: InceptionEvent,

    #[serde(rename = "di")]
    pub delegator: IdentifierPrefix,
}

impl DelegatedInceptionEvent {
    /// Delegated Inception
    ///
    /// Creates an EventMessage with a self-addressing identifier derived
    /// over the dummied serialization, like a regular inception.
    pub fn incept_self_addressing(
        self,
        derivation: SelfAddressing,
        format: SerializationFormats,
    ) -> Result<EventMessage<KeyEvent>, Error> {
        let dummy_event =
            DummyInceptionEvent::dummy_delegated_inception_data(self.clone(), &derivation, format)?;
        let digest = derivation.derive(&dummy_event.encode()?);
        let event = KeyEvent::new(
            IdentifierPrefix::SelfAddressing(digest.clone()),
            0,
            EventData::Dip(self),
        );
        Ok(EventMessage {
            serialization_info: dummy_event.serialization_info,
            event_type: event.get_type(),
            digest,
            event,
        })
    }
}

impl EventSemantics for DelegatedInceptionEvent {
    fn apply_to(&self, state: IdentifierState) -> Result<IdentifierState, Error> {
        Ok(IdentifierState {
            delegator: Some(self.delegator.clone()),
            ..self.inception_data.apply_to(state)?
        })
    }
}
