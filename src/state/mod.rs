use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_hex::{Compact, SerHex};

use crate::{
    error::Error,
    event::sections::{ConfigTrait, KeyConfig},
    event_message::EventTypeTag,
    prefix::{BasicPrefix, IdentifierPrefix, SelfAddressingPrefix, SelfSigningPrefix},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LastEstablishmentData {
    #[serde(rename = "s", with = "SerHex::<Compact>")]
    pub sn: u64,
    #[serde(rename = "d")]
    pub digest: SelfAddressingPrefix,
}

#[derive(Default, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct WitnessConfig {
    #[serde(rename = "bt", with = "SerHex::<Compact>")]
    pub tally: u64,

    #[serde(rename = "b")]
    pub witnesses: Vec<BasicPrefix>,
}

impl WitnessConfig {
    /// Checks whether the given receipt couplets satisfy the witness
    /// tally; only members of the witness set are counted, each once.
    pub fn enough_receipts<'a, I>(&self, receipt_couplets: I) -> bool
    where
        I: IntoIterator<Item = &'a (BasicPrefix, SelfSigningPrefix)>,
    {
        let unique: HashSet<_> = receipt_couplets
            .into_iter()
            .filter(|(witness, _sig)| self.witnesses.contains(witness))
            .map(|(witness, _sig)| witness.clone())
            .collect();
        unique.len() as u64 >= self.tally
    }
}

/// Identifier State
///
/// represents the accumulated state after applying events, based on
/// section 13 of the paper
#[derive(Default, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierState {
    #[serde(rename = "i")]
    pub prefix: IdentifierPrefix,

    #[serde(rename = "s", with = "SerHex::<Compact>")]
    pub sn: u64,

    #[serde(rename = "d")]
    pub last_event_digest: SelfAddressingPrefix,

    #[serde(rename = "et")]
    pub last_event_type: Option<EventTypeTag>,

    #[serde(flatten)]
    pub current: KeyConfig,

    #[serde(flatten)]
    pub witness_config: WitnessConfig,

    #[serde(rename = "c")]
    pub config_traits: Vec<ConfigTrait>,

    #[serde(rename = "di", with = "empty_string_as_none")]
    pub delegator: Option<IdentifierPrefix>,

    #[serde(rename = "ee")]
    pub last_est: LastEstablishmentData,
}

impl IdentifierState {
    /// Apply
    ///
    /// validates and applies the semantic rules of the event to the event state
    pub fn apply<T: EventSemantics>(self, event: &T) -> Result<Self, Error> {
        event.apply_to(self)
    }

    /// A state without a next-key commitment belongs to a
    /// non-transferable or abandoned identifier.
    pub fn is_transferable(&self) -> bool {
        self.current.threshold_key_digest.is_some()
    }
}

pub(crate) mod empty_string_as_none {
    use serde::{de::IntoDeserializer, Deserialize, Deserializer, Serializer};

    pub fn deserialize<'d, D, T>(de: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'d>,
        T: Deserialize<'d>,
    {
        let opt = Option::<String>::deserialize(de)?;
        let opt = opt.as_deref();
        match opt {
            None | Some("") => Ok(None),
            Some(s) => T::deserialize(s.into_deserializer()).map(Some),
        }
    }

    pub fn serialize<S, T>(t: &Option<T>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: ToString,
    {
        s.serialize_str(&match &t {
            Some(v) => v.to_string(),
            None => "".into(),
        })
    }
}

/// EventSemantics
///
/// Describes an interface for applying the semantic rule of an event to the state of an Identifier
pub trait EventSemantics {
    fn apply_to(&self, state: IdentifierState) -> Result<IdentifierState, Error> {
        // default impl is the identity transition
        Ok(state)
    }
}
