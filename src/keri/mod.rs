use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::{Arc, RwLock};

use log::warn;

use crate::{
    database::{escrow::EscrowDb, SledEventDatabase},
    error::Error,
    event_message::signed_event_message::Message,
    event_parsing::{
        attachment::attachment,
        message::{signed_message, version},
    },
    prefix::IdentifierPrefix,
    processor::{
        escrow::{default_escrow_bus, EscrowConfig, EscrowHandles},
        event_storage::EventStorage,
        notification::Notification,
        responder::{Cue, Responder},
        BasicProcessor,
    },
    state::IdentifierState,
};

/// Keri
///
/// Owns the whole processing pipeline for one node: the processor wired
/// to the default escrow bus, the storage view over the log, the
/// process-wide map of identifier states and the outgoing cue queue.
pub struct Keri {
    processor: BasicProcessor,
    storage: EventStorage,
    escrows: EscrowHandles,
    kevers: RwLock<HashMap<IdentifierPrefix, IdentifierState>>,
    responder: Responder<Cue>,
}

impl Keri {
    pub fn new(
        db: Arc<SledEventDatabase>,
        escrow_db: Arc<EscrowDb>,
        escrow_config: EscrowConfig,
    ) -> Result<Self, Error> {
        let (bus, escrows) = default_escrow_bus(db.clone(), escrow_db, escrow_config)?;
        Ok(Self {
            processor: BasicProcessor::new(db.clone(), bus),
            storage: EventStorage::new(db),
            escrows,
            kevers: RwLock::new(HashMap::new()),
            responder: Responder::new(),
        })
    }

    /// Process Stream
    ///
    /// Parses and processes all complete frames in the stream, returning
    /// the number of bytes consumed. A trailing incomplete frame is left
    /// unconsumed for the caller to replenish; a malformed frame is
    /// skipped without giving up on the rest of the stream.
    pub fn process_stream(&self, stream: &[u8]) -> Result<usize, Error> {
        let mut rest = stream;
        loop {
            match signed_message(rest) {
                Ok((remainder, parsed)) => {
                    match Message::try_from(parsed) {
                        Ok(message) => self.process_message(message)?,
                        Err(e) => warn!("dropping malformed frame: {}", e),
                    };
                    rest = remainder;
                }
                Err(nom::Err::Incomplete(_)) => break,
                Err(_) => {
                    // unparseable frame: skip it by its declared size,
                    // attachments included, else drop the rest
                    match version(rest) {
                        Ok((_, info)) if info.size > 0 && info.size <= rest.len() => {
                            match nom::multi::many0(attachment)(&rest[info.size..]) {
                                Ok((remainder, _)) => {
                                    let skipped = rest.len() - remainder.len();
                                    warn!("dropping unparseable frame of {} bytes", skipped);
                                    rest = remainder;
                                }
                                // truncated attachments, wait for more
                                Err(nom::Err::Incomplete(_)) => break,
                                Err(_) => {
                                    warn!(
                                        "dropping unparseable frame of {} bytes",
                                        info.size
                                    );
                                    rest = &rest[info.size..];
                                }
                            }
                        }
                        _ => {
                            warn!("dropping undecipherable stream remainder");
                            rest = &rest[rest.len()..];
                        }
                    }
                }
            }
            if rest.is_empty() {
                break;
            }
        }
        Ok(stream.len() - rest.len())
    }

    /// Processes a single parsed message and services the cues and the
    /// kever map.
    pub fn process_message(&self, message: Message) -> Result<(), Error> {
        match self.processor.process_notice(message) {
            Ok(Notification::KeyEventAdded(ev)) => {
                let id = ev.event_message.event.get_prefix();
                self.update_kever(&id)?;
                self.responder.append(Cue::ReceiptRequired(ev))?;
            }
            Ok(Notification::DupliciousEvent(ev)) => {
                self.responder.append(Cue::DuplicityAlarm(
                    ev.event_message.event.get_prefix(),
                ))?;
            }
            Ok(_) => (),
            Err(e) => warn!("dropping frame: {}", e),
        };
        Ok(())
    }

    fn update_kever(&self, id: &IdentifierPrefix) -> Result<(), Error> {
        if let Some(state) = self.storage.get_state(id)? {
            self.kevers
                .write()
                .map_err(|_| Error::MutexPoisoned)?
                .insert(id.clone(), state);
        }
        Ok(())
    }

    /// Current state of an identifier, straight from the store.
    pub fn get_state(&self, id: &IdentifierPrefix) -> Result<Option<IdentifierState>, Error> {
        self.storage.get_state(id)
    }

    /// Snapshot of the in-memory kever map.
    pub fn get_kevers(&self) -> Result<HashMap<IdentifierPrefix, IdentifierState>, Error> {
        Ok(self
            .kevers
            .read()
            .map_err(|_| Error::MutexPoisoned)?
            .clone())
    }

    /// Serialized current KEL of an identifier.
    pub fn get_kel(&self, id: &IdentifierPrefix) -> Result<Option<Vec<u8>>, Error> {
        self.storage.get_kel(id)
    }

    pub fn escrows(&self) -> &EscrowHandles {
        &self.escrows
    }

    /// Sweeps the TTL'd escrow buckets, dropping expired entries.
    pub fn drain_escrows(&self) -> Result<(), Error> {
        self.escrows
            .out_of_order
            .escrowed_out_of_order
            .purge_stale()?;
        self.escrows
            .partially_signed
            .escrowed_partially_signed
            .purge_stale()?;
        self.escrows.nt_receipts.escrowed_nt_receipts.purge_stale()?;
        self.escrows
            .trans_receipts
            .escrowed_trans_receipts
            .purge_stale()?;
        self.escrows.delegation.escrowed_delegated.purge_stale()?;
        Ok(())
    }

    /// Drains the pending cues.
    pub fn cues(&self) -> Vec<Cue> {
        self.responder.original_messages_to_respond()
    }
}
