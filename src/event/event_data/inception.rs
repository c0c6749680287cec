use serde::{Deserialize, Serialize};

use super::EventData;
use crate::{
    derivation::self_addressing::SelfAddressing,
    error::Error,
    event::{
        sections::{check_tally, seal::Seal, ConfigTrait, InceptionWitnessConfig, KeyConfig},
        KeyEvent,
    },
    event_message::{
        dummy_event::DummyInceptionEvent, serialization_info::SerializationFormats, EventMessage,
        Typeable,
    },
    prefix::IdentifierPrefix,
    state::{EventSemantics, IdentifierState, LastEstablishmentData, WitnessConfig},
};

/// Inception Event
///
/// Describes the inception (icp) event data
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InceptionEvent {
    #[serde(flatten)]
    pub key_config: KeyConfig,

    #[serde(flatten)]
    pub witness_config: InceptionWitnessConfig,

    #[serde(rename = "c")]
    pub inception_configuration: Vec<ConfigTrait>,

    #[serde(rename = "a")]
    pub data: Vec<Seal>,
}

impl InceptionEvent {
    pub fn new(
        key_config: KeyConfig,
        witness_config: Option<InceptionWitnessConfig>,
        inception_config: Option<Vec<ConfigTrait>>,
    ) -> Self {
        Self {
            key_config,
            witness_config: witness_config.map_or_else(InceptionWitnessConfig::default, |w| w),
            inception_configuration: inception_config.map_or_else(Vec::new, |c| c),
            data: vec![],
        }
    }

    /// Incept Self Addressing
    ///
    /// Creates an EventMessage from the inception data, deriving a
    /// self-addressing identifier over the serialization with both the
    /// digest and identifier fields dummied out.
    pub fn incept_self_addressing(
        self,
        derivation: SelfAddressing,
        format: SerializationFormats,
    ) -> Result<EventMessage<KeyEvent>, Error> {
        let dummy_event =
            DummyInceptionEvent::dummy_inception_data(self.clone(), &derivation, format)?;
        let digest = derivation.derive(&dummy_event.encode()?);
        let event = KeyEvent::new(
            IdentifierPrefix::SelfAddressing(digest.clone()),
            0,
            EventData::Icp(self),
        );
        Ok(EventMessage {
            serialization_info: dummy_event.serialization_info,
            event_type: event.get_type(),
            digest,
            event,
        })
    }
}

impl EventSemantics for InceptionEvent {
    fn apply_to(&self, state: IdentifierState) -> Result<IdentifierState, Error> {
        if self.key_config.public_keys.is_empty() {
            return Err(Error::SemanticError("Missing inception keys".into()));
        }
        self.key_config.validate_threshold()?;
        // witness set must be duplicate free and the tally within bounds
        let wits = &self.witness_config.initial_witnesses;
        if (1..wits.len()).any(|i| wits[i..].contains(&wits[i - 1])) {
            return Err(Error::WitnessSetError(
                "Duplicate witness in inception set".into(),
            ));
        }
        if !check_tally(self.witness_config.tally, wits.len()) {
            return Err(Error::WitnessSetError(
                "Witness threshold out of bounds".into(),
            ));
        }

        let last_est = LastEstablishmentData {
            sn: state.sn,
            digest: state.last_event_digest.clone(),
        };

        Ok(IdentifierState {
            current: self.key_config.clone(),
            witness_config: WitnessConfig {
                tally: self.witness_config.tally,
                witnesses: wits.clone(),
            },
            config_traits: self.inception_configuration.clone(),
            last_est,
            ..state
        })
    }
}

#[test]
fn test_inception_data_derivation() -> Result<(), Error> {
    use crate::event::sections::threshold::SignatureThreshold;
    use crate::prefix::{BasicPrefix, Prefix};

    let keys: Vec<BasicPrefix> = vec![
        "DErocgXD2RGSyvn3MObcx59jeOsEQhv2TqHirVkzrp0Q"
            .parse()
            .unwrap(),
        "DFXLiTjiRdSBPLL6hLa0rskIxk3dh4XwJLfctkJFLRSS"
            .parse()
            .unwrap(),
    ];
    let next_commitment = crate::event::sections::key_config::nxt_commitment(
        &SignatureThreshold::Simple(2),
        &keys,
        &SelfAddressing::Blake3_256,
    );

    let key_config = KeyConfig::new(
        keys,
        Some(next_commitment),
        Some(SignatureThreshold::Simple(2)),
    );
    let icp_data = InceptionEvent::new(key_config, None, None).incept_self_addressing(
        SelfAddressing::Blake3_256,
        SerializationFormats::JSON,
    )?;

    // identifier and digest must agree and bind to the dummied body
    assert_eq!(
        icp_data.event.get_prefix().to_str(),
        icp_data.get_digest().to_str()
    );
    assert!(icp_data.check_digest()?);

    Ok(())
}
