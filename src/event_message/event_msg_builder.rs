use super::{serialization_info::SerializationFormats, EventMessage, EventTypeTag};
use crate::{
    derivation::{basic::Basic, self_addressing::SelfAddressing},
    error::Error,
    event::{
        event_data::{
            DelegatedInceptionEvent, EventData, InceptionEvent, InteractionEvent, RotationEvent,
        },
        sections::{
            key_config::nxt_commitment, seal::Seal, threshold::SignatureThreshold, ConfigTrait,
            InceptionWitnessConfig, KeyConfig, RotationWitnessConfig,
        },
        KeyEvent,
    },
    keys::PublicKey,
    prefix::{BasicPrefix, IdentifierPrefix, SelfAddressingPrefix},
};

/// Event Message Builder
///
/// Assembles well-formed key event messages out of the pieces relevant to
/// the chosen event kind; everything else gets a sensible default.
pub struct EventMsgBuilder {
    event_type: EventTypeTag,
    prefix: IdentifierPrefix,
    sn: u64,
    key_threshold: SignatureThreshold,
    next_key_threshold: SignatureThreshold,
    keys: Vec<BasicPrefix>,
    next_keys: Vec<BasicPrefix>,
    prev_event: SelfAddressingPrefix,
    data: Vec<Seal>,
    delegator: IdentifierPrefix,
    witness_threshold: u64,
    witnesses: Vec<BasicPrefix>,
    witness_to_add: Vec<BasicPrefix>,
    witness_to_remove: Vec<BasicPrefix>,
    config_traits: Vec<ConfigTrait>,
    format: SerializationFormats,
    derivation: SelfAddressing,
}

impl EventMsgBuilder {
    pub fn new(event_type: EventTypeTag) -> Self {
        let basic_pref = Basic::Ed25519.derive(PublicKey::new(vec![0; 32]));
        EventMsgBuilder {
            event_type,
            prefix: IdentifierPrefix::default(),
            keys: vec![basic_pref.clone()],
            next_keys: vec![basic_pref],
            key_threshold: SignatureThreshold::default(),
            next_key_threshold: SignatureThreshold::default(),
            sn: 1,
            prev_event: SelfAddressingPrefix::default(),
            data: vec![],
            delegator: IdentifierPrefix::default(),
            witness_threshold: 0,
            witnesses: vec![],
            witness_to_add: vec![],
            witness_to_remove: vec![],
            config_traits: vec![],
            format: SerializationFormats::JSON,
            derivation: SelfAddressing::Blake3_256,
        }
    }

    pub fn with_prefix(self, prefix: &IdentifierPrefix) -> Self {
        EventMsgBuilder {
            prefix: prefix.clone(),
            ..self
        }
    }

    pub fn with_keys(self, keys: Vec<BasicPrefix>) -> Self {
        EventMsgBuilder { keys, ..self }
    }

    pub fn with_next_keys(self, next_keys: Vec<BasicPrefix>) -> Self {
        EventMsgBuilder { next_keys, ..self }
    }

    pub fn with_threshold(self, threshold: &SignatureThreshold) -> Self {
        EventMsgBuilder {
            key_threshold: threshold.clone(),
            ..self
        }
    }

    pub fn with_next_threshold(self, threshold: &SignatureThreshold) -> Self {
        EventMsgBuilder {
            next_key_threshold: threshold.clone(),
            ..self
        }
    }

    pub fn with_sn(self, sn: u64) -> Self {
        EventMsgBuilder { sn, ..self }
    }

    pub fn with_previous_event(self, prev_event: &SelfAddressingPrefix) -> Self {
        EventMsgBuilder {
            prev_event: prev_event.clone(),
            ..self
        }
    }

    pub fn with_seal(mut self, seals: Vec<Seal>) -> Self {
        self.data.extend(seals);
        EventMsgBuilder { ..self }
    }

    pub fn with_delegator(self, delegator: &IdentifierPrefix) -> Self {
        EventMsgBuilder {
            delegator: delegator.clone(),
            ..self
        }
    }

    pub fn with_witness_threshold(self, witness_threshold: u64) -> Self {
        EventMsgBuilder {
            witness_threshold,
            ..self
        }
    }

    pub fn with_witness_list(self, witnesses: &[BasicPrefix]) -> Self {
        EventMsgBuilder {
            witnesses: witnesses.to_vec(),
            ..self
        }
    }

    pub fn with_witness_to_add(self, witness_to_add: &[BasicPrefix]) -> Self {
        EventMsgBuilder {
            witness_to_add: witness_to_add.to_vec(),
            ..self
        }
    }

    pub fn with_witness_to_remove(self, witness_to_remove: &[BasicPrefix]) -> Self {
        EventMsgBuilder {
            witness_to_remove: witness_to_remove.to_vec(),
            ..self
        }
    }

    pub fn with_config_traits(self, config_traits: Vec<ConfigTrait>) -> Self {
        EventMsgBuilder {
            config_traits,
            ..self
        }
    }

    /// Next-key commitment over the configured next keys, or none when
    /// the identifier is to be non-transferable.
    fn next_commitment(&self) -> Option<SelfAddressingPrefix> {
        if self.next_keys.is_empty() {
            None
        } else {
            Some(nxt_commitment(
                &self.next_key_threshold,
                &self.next_keys,
                &self.derivation,
            ))
        }
    }

    pub fn build(self) -> Result<EventMessage<KeyEvent>, Error> {
        let next_commitment = self.next_commitment();
        let key_config = KeyConfig::new(
            self.keys.clone(),
            next_commitment,
            Some(self.key_threshold.clone()),
        );
        let prefix = if self.prefix == IdentifierPrefix::default() && self.keys.len() == 1 {
            IdentifierPrefix::Basic(self.keys[0].clone())
        } else {
            self.prefix.clone()
        };

        Ok(match self.event_type {
            EventTypeTag::Icp => {
                let icp_event = InceptionEvent {
                    key_config,
                    witness_config: InceptionWitnessConfig {
                        tally: self.witness_threshold,
                        initial_witnesses: self.witnesses,
                    },
                    inception_configuration: self.config_traits,
                    data: self.data,
                };

                match prefix {
                    IdentifierPrefix::Basic(_) => {
                        KeyEvent::new(prefix, 0, EventData::Icp(icp_event))
                            .to_message(self.format, self.derivation)?
                    }
                    _ => icp_event.incept_self_addressing(self.derivation, self.format)?,
                }
            }

            EventTypeTag::Rot => KeyEvent::new(
                prefix,
                self.sn,
                EventData::Rot(RotationEvent {
                    previous_event_hash: self.prev_event,
                    key_config,
                    witness_config: RotationWitnessConfig {
                        tally: self.witness_threshold,
                        prune: self.witness_to_remove,
                        graft: self.witness_to_add,
                    },
                    data: self.data,
                }),
            )
            .to_message(self.format, self.derivation)?,

            EventTypeTag::Ixn => KeyEvent::new(
                prefix,
                self.sn,
                EventData::Ixn(InteractionEvent {
                    previous_event_hash: self.prev_event,
                    data: self.data,
                }),
            )
            .to_message(self.format, self.derivation)?,

            EventTypeTag::Dip => {
                let icp_data = InceptionEvent {
                    key_config,
                    witness_config: InceptionWitnessConfig {
                        tally: self.witness_threshold,
                        initial_witnesses: self.witnesses,
                    },
                    inception_configuration: self.config_traits,
                    data: self.data,
                };
                DelegatedInceptionEvent {
                    inception_data: icp_data,
                    delegator: self.delegator,
                }
                .incept_self_addressing(self.derivation, self.format)?
            }

            EventTypeTag::Drt => {
                let rotation_data = RotationEvent {
                    previous_event_hash: self.prev_event,
                    key_config,
                    witness_config: RotationWitnessConfig {
                        tally: self.witness_threshold,
                        prune: self.witness_to_remove,
                        graft: self.witness_to_add,
                    },
                    data: self.data,
                };
                KeyEvent::new(prefix, self.sn, EventData::Drt(rotation_data))
                    .to_message(self.format, self.derivation)?
            }

            _ => {
                return Err(Error::SemanticError(
                    "Not a key event kind".to_string(),
                ))
            }
        })
    }
}
