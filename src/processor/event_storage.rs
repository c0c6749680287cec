use std::sync::Arc;

use chrono::Local;

use crate::{
    database::SledEventDatabase,
    error::Error,
    event::{event_data::EventData, sections::seal::EventSeal, sections::KeyConfig, KeyEvent},
    event_message::{
        signed_event_message::{SignedEventMessage, SignedNontransferableReceipt},
        EventMessage,
    },
    event_parsing::message::key_event_from_raw,
    prefix::{BasicPrefix, IdentifierPrefix, SelfAddressingPrefix, SelfSigningPrefix},
    state::IdentifierState,
};

pub struct EventStorage {
    pub db: Arc<SledEventDatabase>,
}

// Collection of methods for getting data from database.
impl EventStorage {
    pub fn new(db: Arc<SledEventDatabase>) -> Self {
        Self { db }
    }

    /// Compute State for Prefix
    ///
    /// Replays the identifier's events in first-seen order; superseding
    /// recoveries fold in where they were accepted.
    pub fn get_state(
        &self,
        identifier: &IdentifierPrefix,
    ) -> Result<Option<IdentifierState>, Error> {
        let first_seen = self.db.get_first_seen(identifier);
        if first_seen.is_empty() {
            // no inception event, no state
            return Ok(None);
        }
        let mut state = IdentifierState::default();
        for (_fn, dig) in first_seen {
            let event = match self.get_event_by_digest(identifier, &dig)? {
                Some(event) => event,
                None => continue,
            };
            state = match state.clone().apply(&event) {
                Ok(s) => s,
                // skip events that no longer chain after a recovery
                Err(Error::EventOutOfOrderError) | Err(Error::EventDuplicateError) => continue,
                Err(e) => return Err(e),
            };
        }
        Ok(Some(state))
    }

    /// The single commit point: event bytes, signatures, first-sight
    /// datetime, accepted head and first-seen ordinal land together.
    pub fn add_kel_finalized_event(&self, signed: &SignedEventMessage) -> Result<(), Error> {
        let id = signed.event_message.event.get_prefix();
        let dig = signed.event_message.get_digest();
        let sn = signed.event_message.event.get_sn();

        let raw = signed.event_message.serialize()?;
        self.db.add_event_raw(&id, &dig, &raw)?;
        self.db
            .add_signatures(&id, &dig, &signed.signatures)?;
        self.db.set_first_seen_dt(&id, &dig, Local::now())?;
        self.db.append_key_event_head(&id, sn, &dig)?;
        self.db.append_first_seen(&id, &dig)?;
        Ok(())
    }

    pub fn get_event_by_digest(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Result<Option<EventMessage<KeyEvent>>, Error> {
        match self.db.get_event_raw(id, dig)? {
            Some(raw) => Ok(Some(key_event_from_raw(&raw)?)),
            None => Ok(None),
        }
    }

    /// Current accepted event at `(id, sn)`, if any.
    pub fn get_event_at_sn(
        &self,
        id: &IdentifierPrefix,
        sn: u64,
    ) -> Result<Option<EventMessage<KeyEvent>>, Error> {
        match self.db.get_key_event_head(id, sn) {
            Some(dig) => self.get_event_by_digest(id, &dig),
            None => Ok(None),
        }
    }

    /// Get KEL for Prefix
    ///
    /// Returns the current validated KEL for a given Prefix: the chain of
    /// accepted heads with their stored signatures, in stream form.
    pub fn get_kel(&self, id: &IdentifierPrefix) -> Result<Option<Vec<u8>>, Error> {
        let state = match self.get_state(id)? {
            Some(state) => state,
            None => return Ok(None),
        };
        let mut kel = vec![];
        for sn in 0..=state.sn {
            if let Some(dig) = self.db.get_key_event_head(id, sn) {
                if let Some(event) = self.get_event_by_digest(id, &dig)? {
                    let signed =
                        SignedEventMessage::new(&event, self.db.get_signatures(id, &dig), None);
                    kel.extend(signed.serialize()?);
                }
            }
        }
        Ok(Some(kel))
    }

    /// Get keys from Establishment Event
    ///
    /// Returns the key config committed at the establishment event with
    /// the given sn and digest.
    pub fn get_keys_at_event(
        &self,
        id: &IdentifierPrefix,
        sn: u64,
        event_digest: &SelfAddressingPrefix,
    ) -> Result<Option<KeyConfig>, Error> {
        let event = match self.get_event_at_sn(id, sn)? {
            Some(event) => event,
            None => return Err(Error::EventOutOfOrderError),
        };
        if !event.compare_digest(event_digest)? {
            return Err(Error::SemanticError("Event digests don't match".into()));
        }
        Ok(Some(match event.get_event_data() {
            EventData::Icp(icp) => icp.key_config,
            EventData::Rot(rot) => rot.key_config,
            EventData::Dip(dip) => dip.inception_data.key_config,
            EventData::Drt(drt) => drt.key_config,
            _ => return Err(Error::SemanticError("Not an establishment event".into())),
        }))
    }

    /// Get last establishment event seal for Prefix
    pub fn get_last_establishment_event_seal(
        &self,
        id: &IdentifierPrefix,
    ) -> Result<Option<EventSeal>, Error> {
        Ok(self.get_state(id)?.map(|state| {
            EventSeal::new(
                id.clone(),
                state.last_est.sn,
                state.last_est.digest,
            )
        }))
    }

    pub fn get_nt_receipts(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Vec<(BasicPrefix, SelfSigningPrefix)> {
        self.db.get_receipt_couplets(id, dig)
    }

    /// Checks whether the event at `(id, sn)` is receipted by enough of
    /// its witnesses to count as fully witnessed.
    pub fn is_fully_witnessed(&self, id: &IdentifierPrefix, sn: u64) -> Result<bool, Error> {
        let state = match self.get_state(id)? {
            Some(state) => state,
            None => return Ok(false),
        };
        let dig = match self.db.get_key_event_head(id, sn) {
            Some(dig) => dig,
            None => return Ok(false),
        };
        let couplets = self.get_nt_receipts(id, &dig);
        Ok(state.witness_config.enough_receipts(couplets.iter()))
    }

    /// Assembles the receipt message for the accepted event at
    /// `(id, sn)`, merging all stored couplets.
    pub fn get_nt_receipt_message(
        &self,
        id: &IdentifierPrefix,
        sn: u64,
    ) -> Result<Option<SignedNontransferableReceipt>, Error> {
        use crate::event::receipt::Receipt;
        use crate::event_message::{serialization_info::SerializationFormats, EventTypeTag};

        let dig = match self.db.get_key_event_head(id, sn) {
            Some(dig) => dig,
            None => return Ok(None),
        };
        let couplets = self.get_nt_receipts(id, &dig);
        if couplets.is_empty() {
            return Ok(None);
        }
        let body = EventMessage::new_receipt(
            SerializationFormats::JSON,
            EventTypeTag::Rct,
            dig,
            Receipt::new(id.clone(), sn),
        )?;
        Ok(Some(SignedNontransferableReceipt::new(&body, couplets)))
    }
}
