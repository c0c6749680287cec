use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    event::sections::{seal::Seal, ConfigTrait},
    prefix::SelfAddressingPrefix,
    state::{EventSemantics, IdentifierState},
};

/// Interaction Event
///
/// Anchors data to the key event log without changing signing authority.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    #[serde(rename = "p")]
    pub previous_event_hash: SelfAddressingPrefix,

    #[serde(rename = "a")]
    pub data: Vec<Seal>,
}

impl InteractionEvent {
    pub fn new(previous_event_hash: SelfAddressingPrefix, data: Vec<Seal>) -> Self {
        InteractionEvent {
            previous_event_hash,
            data,
        }
    }
}

impl EventSemantics for InteractionEvent {
    fn apply_to(&self, state: IdentifierState) -> Result<IdentifierState, Error> {
        if state.current.threshold_key_digest.is_none() {
            return Err(Error::NonTransferableError);
        }
        if state.config_traits.contains(&ConfigTrait::EstOnly) {
            return Err(Error::SemanticError(
                "Interaction not allowed for establishment-only identifier".into(),
            ));
        }
        Ok(IdentifierState { ..state })
    }
}
