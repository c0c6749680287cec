use std::sync::Arc;

use crate::{
    database::SledEventDatabase,
    error::Error,
    event_message::signed_event_message::Message,
    prefix::IdentifierPrefix,
    state::IdentifierState,
};

pub mod escrow;
pub mod event_storage;
pub mod notification;
pub mod responder;
pub mod tasks;
pub mod validator;

#[cfg(test)]
mod tests;

use self::{
    event_storage::EventStorage,
    notification::{Notification, NotificationBus},
    validator::EventValidator,
};

pub struct EventProcessor {
    db: Arc<SledEventDatabase>,
    validator: EventValidator,
}

impl EventProcessor {
    pub fn new(db: Arc<SledEventDatabase>) -> Self {
        let validator = EventValidator::new(db.clone());
        Self { db, validator }
    }

    /// Process
    ///
    /// Processes a deserialized KERI message, updates the database on
    /// acceptance and reports the outcome for the escrow observers.
    pub fn process(&self, message: Message) -> Result<Notification, Error> {
        match message {
            Message::Event(signed_event) => {
                let id = signed_event.event_message.event.get_prefix();
                let dig = signed_event.event_message.get_digest();
                // an already accepted digest is silently discarded
                if self.db.has_event(&id, &dig) {
                    return Ok(Notification::Duplicate);
                }
                match self.validator.validate_event(&signed_event) {
                    Ok(_) => {
                        EventStorage::new(self.db.clone())
                            .add_kel_finalized_event(&signed_event)?;
                        Ok(Notification::KeyEventAdded(signed_event))
                    }
                    Err(Error::EventOutOfOrderError) => {
                        Ok(Notification::OutOfOrder(signed_event))
                    }
                    Err(Error::NotEnoughSigsError) => {
                        Ok(Notification::PartiallySigned(signed_event))
                    }
                    Err(Error::EventDuplicateError) => {
                        Ok(Notification::DupliciousEvent(signed_event))
                    }
                    Err(Error::MissingDelegatingEventError)
                    | Err(Error::MissingDelegatorSealError(_)) => {
                        Ok(Notification::MissingDelegatingEvent(signed_event))
                    }
                    Err(e) => Err(e),
                }
            }
            Message::NontransferableRct(rct) => {
                let id = rct.body.event.prefix.clone();
                let dig = rct.body.get_digest();
                match self.validator.validate_witness_receipt(&rct) {
                    Ok(_) => {
                        self.db.add_receipt_couplets(&id, &dig, &rct.couplets)?;
                        Ok(Notification::ReceiptAccepted)
                    }
                    Err(Error::MissingEvent) => Ok(Notification::ReceiptOutOfOrder(rct)),
                    Err(e) => Err(e),
                }
            }
            Message::TransferableRct(vrc) => {
                match self.validator.validate_validator_receipt(&vrc) {
                    Ok(_) => {
                        self.db.add_receipt_triplets(
                            &vrc.body.event.prefix,
                            &vrc.body.get_digest(),
                            &vrc.validator_seal,
                            &vrc.signatures,
                        )?;
                        Ok(Notification::ReceiptAccepted)
                    }
                    Err(Error::MissingEvent) | Err(Error::EventOutOfOrderError) => {
                        Ok(Notification::TransReceiptOutOfOrder(vrc))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}

/// Basic Processor
///
/// An event processor wired to a notification bus; the default bus runs
/// the escrow drains.
pub struct BasicProcessor {
    processor: EventProcessor,
    publisher: NotificationBus,
}

impl BasicProcessor {
    pub fn new(db: Arc<SledEventDatabase>, bus: NotificationBus) -> Self {
        Self {
            processor: EventProcessor::new(db),
            publisher: bus,
        }
    }

    pub fn process_notice(&self, message: Message) -> Result<Notification, Error> {
        let notification = self.processor.process(message)?;
        self.publisher.notify(&notification)?;
        Ok(notification)
    }
}

/// Compute State for Prefix
///
/// Returns the current state associated with the given prefix.
pub fn compute_state(
    db: Arc<SledEventDatabase>,
    id: &IdentifierPrefix,
) -> Result<Option<IdentifierState>, Error> {
    EventStorage::new(db).get_state(id)
}
