use serde::{Deserialize, Serialize};

use super::EventMessage;
use crate::{
    error::Error,
    event::{receipt::Receipt, sections::seal::{EventSeal, SourceSeal}, KeyEvent},
    event_parsing::SignedEventData,
    prefix::{AttachedSignaturePrefix, BasicPrefix, IdentifierPrefix, SelfSigningPrefix},
    state::{EventSemantics, IdentifierState},
};

/// A parsed, framed message: a key event or a receipt, with its
/// cryptographic attachments.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Event(SignedEventMessage),
    /// Receipt created by a nontransferable identifier, e.g. a witness
    NontransferableRct(SignedNontransferableReceipt),
    /// Receipt created by a transferable identifier (chit)
    TransferableRct(SignedTransferableReceipt),
}

impl Message {
    pub fn get_prefix(&self) -> IdentifierPrefix {
        match self {
            Message::Event(ev) => ev.event_message.event.get_prefix(),
            Message::NontransferableRct(rct) => rct.body.event.prefix.clone(),
            Message::TransferableRct(vrc) => vrc.body.event.prefix.clone(),
        }
    }

    pub fn to_cesr(&self) -> Result<Vec<u8>, Error> {
        SignedEventData::from(self.clone()).to_cesr()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEventMessage {
    pub event_message: EventMessage<KeyEvent>,
    pub signatures: Vec<AttachedSignaturePrefix>,
    pub delegator_seal: Option<SourceSeal>,
}

impl PartialEq for SignedEventMessage {
    fn eq(&self, other: &Self) -> bool {
        self.event_message == other.event_message && self.signatures == other.signatures
    }
}

impl SignedEventMessage {
    pub fn new(
        message: &EventMessage<KeyEvent>,
        sigs: Vec<AttachedSignaturePrefix>,
        delegator_seal: Option<SourceSeal>,
    ) -> Self {
        Self {
            event_message: message.clone(),
            signatures: sigs,
            delegator_seal,
        }
    }

    /// Serializes the event with its attachments back into stream form.
    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        SignedEventData::from(self).to_cesr()
    }
}

impl EventSemantics for SignedEventMessage {
    fn apply_to(&self, state: IdentifierState) -> Result<IdentifierState, Error> {
        self.event_message.apply_to(state)
    }
}

/// Signed Non-Transferable Receipt
///
/// A receipt whose signers are nontransferable identifiers, attached as
/// (signer, signature) couplets. Mostly intended for use by witnesses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedNontransferableReceipt {
    pub body: EventMessage<Receipt>,
    pub couplets: Vec<(BasicPrefix, SelfSigningPrefix)>,
}

impl SignedNontransferableReceipt {
    pub fn new(
        message: &EventMessage<Receipt>,
        couplets: Vec<(BasicPrefix, SelfSigningPrefix)>,
    ) -> Self {
        Self {
            body: message.clone(),
            couplets,
        }
    }
}

/// Signed Transferable Receipt
///
/// Event receipt made by a transferable identifier. Provides the
/// signatures and a seal of the receipter's latest establishment event.
/// Mostly intended for use by validators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedTransferableReceipt {
    pub body: EventMessage<Receipt>,
    pub validator_seal: EventSeal,
    pub signatures: Vec<AttachedSignaturePrefix>,
}

impl SignedTransferableReceipt {
    pub fn new(
        message: EventMessage<Receipt>,
        event_seal: EventSeal,
        sigs: Vec<AttachedSignaturePrefix>,
    ) -> Self {
        Self {
            body: message,
            validator_seal: event_seal,
            signatures: sigs,
        }
    }
}
