use std::sync::Arc;

use crate::{
    database::SledEventDatabase,
    error::Error,
    event::{event_data::EventData, sections::seal::EventSeal, KeyEvent},
    event_message::{
        signed_event_message::{
            SignedEventMessage, SignedNontransferableReceipt, SignedTransferableReceipt,
        },
        EventMessage,
    },
    state::IdentifierState,
};

use super::event_storage::EventStorage;

pub struct EventValidator {
    event_storage: EventStorage,
}

impl EventValidator {
    pub fn new(db: Arc<SledEventDatabase>) -> Self {
        Self {
            event_storage: EventStorage::new(db),
        }
    }

    /// Validate Event
    ///
    /// Applies the event to the identifier's current state, enforcing
    /// ordering, digest chaining, next-key commitment and witness-set
    /// rules, then checks the attached signatures against the resulting
    /// key configuration. Returns the prospective state on success.
    pub fn validate_event(
        &self,
        signed_event: &SignedEventMessage,
    ) -> Result<IdentifierState, Error> {
        // delegated events must be anchored in their delegator's log
        if let Some(seal) = self.get_delegator_seal(signed_event)? {
            self.validate_seal(seal, &signed_event.event_message)?;
        };

        let event = &signed_event.event_message;
        let prior_state = self
            .event_storage
            .get_state(&event.event.get_prefix())?
            .unwrap_or_default();

        // nothing but an inception can start a log; anything else waits
        // for one
        if prior_state.prefix == Default::default()
            && !matches!(
                event.get_event_data(),
                EventData::Icp(_) | EventData::Dip(_)
            )
        {
            return Err(Error::EventOutOfOrderError);
        }

        // a superseding rotation chains to the log it recovers, not to
        // the current head, so its prior digest is checked here where
        // the event at sn - 1 is visible
        if event.is_recovery(&prior_state) {
            self.check_recovery_chaining(event)?;
        }

        let new_state = prior_state.apply(event)?;

        let serialized = event.serialize()?;
        match new_state.current.verify(&serialized, &signed_event.signatures) {
            Ok(true) => Ok(new_state),
            Ok(false) => Err(Error::SignatureVerificationError),
            Err(e) => Err(e),
        }
    }

    fn check_recovery_chaining(&self, event: &EventMessage<KeyEvent>) -> Result<(), Error> {
        let id = event.event.get_prefix();
        let sn = event.event.get_sn();
        if sn == 0 {
            return Err(Error::RecoveryError);
        }
        let expected_prior = self
            .event_storage
            .db
            .get_key_event_head(&id, sn - 1)
            .ok_or(Error::RecoveryError)?;
        let prior = match event.get_event_data() {
            EventData::Rot(rot) | EventData::Drt(rot) => rot.previous_event_hash,
            _ => return Err(Error::RecoveryError),
        };
        if prior != expected_prior {
            return Err(Error::RecoveryError);
        }
        Ok(())
    }

    /// Validate Witness Receipt
    ///
    /// Locates the receipted event and verifies every attached couplet
    /// over its stored bytes.
    pub fn validate_witness_receipt(
        &self,
        rct: &SignedNontransferableReceipt,
    ) -> Result<(), Error> {
        let id = &rct.body.event.prefix;
        let sn = rct.body.event.sn;

        let receipted = self
            .event_storage
            .get_event_at_sn(id, sn)?
            .ok_or(Error::MissingEvent)?;
        if !receipted.compare_digest(&rct.body.get_digest())? {
            // the receipted version is not (or no longer) the accepted
            // head, wait for the log to catch up
            return Err(Error::MissingEvent);
        }

        let serialized = receipted.serialize()?;
        for (witness, signature) in &rct.couplets {
            if !witness.verify(&serialized, signature)? {
                return Err(Error::ReceiptVerificationError);
            }
        }
        Ok(())
    }

    /// Validate Validator Receipt
    ///
    /// The embedded seal must reference the receipter's *latest*
    /// establishment event; earlier seals make the receipt stale and
    /// later ones mean our copy of the receipter's log is behind.
    pub fn validate_validator_receipt(
        &self,
        vrc: &SignedTransferableReceipt,
    ) -> Result<(), Error> {
        let receipted = self
            .event_storage
            .get_event_at_sn(&vrc.body.event.prefix, vrc.body.event.sn)?
            .ok_or(Error::MissingEvent)?;
        if !receipted.compare_digest(&vrc.body.get_digest())? {
            return Err(Error::MissingEvent);
        }

        let receipter_state = self
            .event_storage
            .get_state(&vrc.validator_seal.prefix)?
            .ok_or(Error::EventOutOfOrderError)?;

        if vrc.validator_seal.event_digest != receipter_state.last_est.digest {
            return if vrc.validator_seal.sn < receipter_state.last_est.sn {
                Err(Error::StaleReceiptError)
            } else {
                Err(Error::EventOutOfOrderError)
            };
        }

        let serialized = receipted.serialize()?;
        let kp = self.event_storage.get_keys_at_event(
            &vrc.validator_seal.prefix,
            vrc.validator_seal.sn,
            &vrc.validator_seal.event_digest,
        )?;
        match kp {
            Some(config) => {
                for sig in &vrc.signatures {
                    let key = config
                        .public_keys
                        .get(sig.index.current() as usize)
                        .ok_or_else(|| {
                            Error::SemanticError("Receipt signature index out of range".into())
                        })?;
                    if !key.verify(&serialized, &sig.signature)? {
                        return Err(Error::ReceiptVerificationError);
                    }
                }
                Ok(())
            }
            None => Err(Error::EventOutOfOrderError),
        }
    }

    /// Validate delegating event seal.
    ///
    /// Checks that the delegating event at the seal's position anchors
    /// the delegated event's digest.
    fn validate_seal(
        &self,
        seal: EventSeal,
        delegated_event: &EventMessage<KeyEvent>,
    ) -> Result<(), Error> {
        use crate::event::sections::seal::Seal;

        let event = self
            .event_storage
            .get_event_at_sn(&seal.prefix, seal.sn)?
            .ok_or(Error::MissingDelegatingEventError)?;

        let data = match event.get_event_data() {
            EventData::Rot(rot) => rot.data,
            EventData::Ixn(ixn) => ixn.data,
            EventData::Drt(drt) => drt.data,
            _ => {
                return Err(Error::SemanticError(
                    "Delegating event of improper type".to_string(),
                ))
            }
        };

        if !data.iter().any(|s| match s {
            Seal::Event(es) => delegated_event
                .compare_digest(&es.event_digest)
                .unwrap_or(false),
            Seal::Digest(ds) => delegated_event.compare_digest(&ds.dig).unwrap_or(false),
        }) {
            return Err(Error::SemanticError(
                "Delegating event doesn't anchor the delegated event".to_string(),
            ));
        };
        Ok(())
    }

    fn get_delegator_seal(
        &self,
        signed_event: &SignedEventMessage,
    ) -> Result<Option<EventSeal>, Error> {
        Ok(match signed_event.event_message.get_event_data() {
            EventData::Dip(dip) => {
                let (sn, dig) = signed_event
                    .delegator_seal
                    .as_ref()
                    .map(|seal| (seal.sn, seal.digest.clone()))
                    .ok_or_else(|| {
                        Error::MissingDelegatorSealError(dip.delegator.clone())
                    })?;
                Some(EventSeal::new(dip.delegator, sn, dig))
            }
            EventData::Drt(_drt) => {
                let delegator = self
                    .event_storage
                    .get_state(&signed_event.event_message.event.get_prefix())?
                    .ok_or(Error::EventOutOfOrderError)?
                    .delegator
                    .ok_or_else(|| {
                        Error::SemanticError("Missing delegator in state".into())
                    })?;
                let (sn, dig) = signed_event
                    .delegator_seal
                    .as_ref()
                    .map(|seal| (seal.sn, seal.digest.clone()))
                    .ok_or_else(|| Error::MissingDelegatorSealError(delegator.clone()))?;
                Some(EventSeal::new(delegator, sn, dig))
            }
            _ => None,
        })
    }
}
