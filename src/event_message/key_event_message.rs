use super::{
    dummy_event::{DummyEvent, DummyInceptionEvent},
    signed_event_message::SignedEventMessage,
    EventMessage, EventTypeTag, Typeable,
};
use crate::{
    error::Error,
    event::{event_data::EventData, sections::seal::SourceSeal, KeyEvent},
    prefix::{AttachedSignaturePrefix, IdentifierPrefix, SelfAddressingPrefix},
    state::{EventSemantics, IdentifierState},
};

impl EventMessage<KeyEvent> {
    /// Event data with the type tag reconciled: a delegated rotation
    /// deserializes as a plain rotation payload, the envelope tag tells
    /// them apart.
    pub fn get_event_data(&self) -> EventData {
        match (&self.event_type, &self.event.event_data) {
            (EventTypeTag::Drt, EventData::Rot(rot)) => EventData::Drt(rot.clone()),
            _ => self.event.event_data.clone(),
        }
    }

    pub fn sign(
        &self,
        sigs: Vec<AttachedSignaturePrefix>,
        delegator_seal: Option<SourceSeal>,
    ) -> SignedEventMessage {
        SignedEventMessage::new(self, sigs, delegator_seal)
    }

    pub fn compare_digest(&self, sai: &SelfAddressingPrefix) -> Result<bool, Error> {
        let self_dig = self.get_digest();
        if self_dig.derivation == sai.derivation {
            Ok(&self_dig == sai)
        } else {
            Ok(sai.verify_binding(&self.to_derivation_data()?))
        }
    }

    /// Checks that the digest field matches the event body it claims to
    /// address.
    pub fn check_digest(&self) -> Result<bool, Error> {
        Ok(self.digest.verify_binding(&self.to_derivation_data()?))
    }

    fn to_derivation_data(&self) -> Result<Vec<u8>, Error> {
        // the identifier field is only dummied out when it is itself
        // derived from the event body
        Ok(match (self.get_event_data(), &self.event.prefix) {
            (EventData::Icp(icp), IdentifierPrefix::SelfAddressing(_)) => {
                DummyInceptionEvent::dummy_inception_data(
                    icp,
                    &self.get_digest().derivation,
                    self.serialization_info.kind,
                )?
                .encode()?
            }
            (EventData::Dip(dip), IdentifierPrefix::SelfAddressing(_)) => {
                DummyInceptionEvent::dummy_delegated_inception_data(
                    dip,
                    &self.get_digest().derivation,
                    self.serialization_info.kind,
                )?
                .encode()?
            }
            _ => DummyEvent::dummy_event(
                self.event.clone(),
                self.serialization_info.kind,
                &self.get_digest().derivation,
            )?
            .encode()?,
        })
    }

    fn previous_event_hash(&self) -> Option<SelfAddressingPrefix> {
        match self.get_event_data() {
            EventData::Rot(rot) | EventData::Drt(rot) => Some(rot.previous_event_hash),
            EventData::Ixn(ixn) => Some(ixn.previous_event_hash),
            EventData::Icp(_) | EventData::Dip(_) => None,
        }
    }

    /// Recovery is admissible for a rotation landing at or below the
    /// current head, as long as it lands above the last establishment
    /// event and everything it supersedes is interaction traffic.
    pub fn is_recovery(&self, state: &IdentifierState) -> bool {
        matches!(
            self.get_event_data(),
            EventData::Rot(_) | EventData::Drt(_)
        ) && state.last_event_type == Some(EventTypeTag::Ixn)
            && state.last_est.sn < self.event.sn
            && self.event.sn <= state.sn
    }
}

impl EventSemantics for EventMessage<KeyEvent> {
    fn apply_to(&self, state: IdentifierState) -> Result<IdentifierState, Error> {
        let event_data = self.get_event_data();
        match event_data {
            EventData::Icp(_) | EventData::Dip(_) => {
                // inception requires an uninitialized state
                if state.prefix != IdentifierPrefix::default() {
                    return Err(Error::EventDuplicateError);
                }
                if self.event.sn != 0 {
                    return Err(Error::SemanticError(
                        "Inception out of sequence".to_string(),
                    ));
                }
                if !self.check_digest()? {
                    return Err(Error::IncorrectDigest);
                }
                if !verify_identifier_binding(self)? {
                    return Err(Error::SemanticError(
                        "Invalid identifier prefix binding".into(),
                    ));
                }
            }
            _ => {
                if self.event.prefix != state.prefix {
                    return Err(Error::SemanticError("Prefix does not match".to_string()));
                }
                if !self.check_digest()? {
                    return Err(Error::IncorrectDigest);
                }
                if self.event.sn == state.sn + 1 {
                    // normal progression, chained to the current head
                    if self.previous_event_hash().as_ref() != Some(&state.last_event_digest) {
                        return Err(Error::SemanticError(
                            "Previous event digest does not match".to_string(),
                        ));
                    }
                } else if self.event.sn > state.sn + 1 {
                    return Err(Error::EventOutOfOrderError);
                } else if !self.is_recovery(&state) {
                    // stale or inadmissible supersession attempt
                    return Err(Error::EventDuplicateError);
                }
                // recovery: chaining against the superseded log is checked
                // by the validator, which can see the event at sn - 1
            }
        };
        // dispatch on the tag-reconciled data: the raw field holds a
        // plain rotation for drt events
        event_data.apply_to(IdentifierState {
            prefix: self.event.prefix.clone(),
            sn: self.event.sn,
            last_event_digest: self.get_digest(),
            last_event_type: Some((&event_data).into()),
            ..state
        })
    }
}

pub fn verify_identifier_binding(icp_event: &EventMessage<KeyEvent>) -> Result<bool, Error> {
    let event_data = icp_event.get_event_data();
    match event_data {
        EventData::Icp(icp) => match &icp_event.event.prefix {
            IdentifierPrefix::Basic(bp) => {
                // a directly-encoded key must stand alone, and a
                // non-transferable derivation must not commit next keys
                let single_key = icp.key_config.public_keys.len() == 1
                    && icp
                        .key_config
                        .public_keys
                        .first()
                        .map(|k| k == bp)
                        .unwrap_or(false);
                let nt_consistent =
                    bp.is_transferable() || icp.key_config.threshold_key_digest.is_none();
                Ok(single_key && nt_consistent)
            }
            IdentifierPrefix::SelfAddressing(sap) => {
                Ok(icp_event.compare_digest(sap)? && &icp_event.get_digest() == sap)
            }
            IdentifierPrefix::SelfSigning(_ssp) => Err(Error::ImproperPrefixType),
        },
        EventData::Dip(_dip) => match &icp_event.event.prefix {
            IdentifierPrefix::SelfAddressing(sap) => icp_event.compare_digest(sap),
            _ => Err(Error::ImproperPrefixType),
        },
        _ => Err(Error::SemanticError("Not an ICP or DIP event".into())),
    }
}
