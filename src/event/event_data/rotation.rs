use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    event::sections::{check_tally, seal::Seal, KeyConfig, RotationWitnessConfig},
    prefix::SelfAddressingPrefix,
    state::{EventSemantics, IdentifierState, LastEstablishmentData, WitnessConfig},
};

/// Rotation Event
///
/// Describes the rotation (rot) event data. Delegated rotations (drt)
/// carry the same payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RotationEvent {
    #[serde(rename = "p")]
    pub previous_event_hash: SelfAddressingPrefix,

    #[serde(flatten)]
    pub key_config: KeyConfig,

    #[serde(flatten)]
    pub witness_config: RotationWitnessConfig,

    #[serde(rename = "a")]
    pub data: Vec<Seal>,
}

impl EventSemantics for RotationEvent {
    fn apply_to(&self, state: IdentifierState) -> Result<IdentifierState, Error> {
        // a rotation is only authorized by a prior next-key commitment
        if state.current.threshold_key_digest.is_none() {
            return Err(Error::NonTransferableError);
        }
        if !state.current.verify_next(&self.key_config) {
            return Err(Error::NextCommitmentMismatchError);
        }
        if self.key_config.public_keys.is_empty() {
            return Err(Error::SemanticError("Missing rotation keys".into()));
        }
        self.key_config.validate_threshold()?;

        let witness_config = self.transform_witnesses(&state.witness_config)?;

        let last_est = LastEstablishmentData {
            sn: state.sn,
            digest: state.last_event_digest.clone(),
        };

        Ok(IdentifierState {
            current: self.key_config.clone(),
            witness_config,
            last_est,
            ..state
        })
    }
}

impl RotationEvent {
    /// Applies the witness cuts and adds to the current witness set:
    /// cuts must come from the current set, adds must be disjoint from
    /// what survives, and the new tally must fit the resulting set.
    fn transform_witnesses(&self, prior: &WitnessConfig) -> Result<WitnessConfig, Error> {
        let prune = &self.witness_config.prune;
        let graft = &self.witness_config.graft;

        if (1..prune.len()).any(|i| prune[i..].contains(&prune[i - 1])) {
            return Err(Error::WitnessSetError("Duplicate witness cut".into()));
        }
        if (1..graft.len()).any(|i| graft[i..].contains(&graft[i - 1])) {
            return Err(Error::WitnessSetError("Duplicate witness add".into()));
        }
        if prune.iter().any(|w| !prior.witnesses.contains(w)) {
            return Err(Error::WitnessSetError(
                "Cut witness not in current set".into(),
            ));
        }

        let mut witnesses: Vec<_> = prior
            .witnesses
            .iter()
            .filter(|w| !prune.contains(w))
            .cloned()
            .collect();
        if graft.iter().any(|w| witnesses.contains(w)) {
            return Err(Error::WitnessSetError(
                "Added witness already in set".into(),
            ));
        }
        witnesses.extend(graft.iter().cloned());

        if !check_tally(self.witness_config.tally, witnesses.len()) {
            return Err(Error::WitnessSetError(
                "Witness threshold out of bounds".into(),
            ));
        }

        Ok(WitnessConfig {
            tally: self.witness_config.tally,
            witnesses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::sections::threshold::SignatureThreshold;
    use crate::keys::PublicKey;
    use crate::prefix::BasicPrefix;

    fn wit(seed: u8) -> BasicPrefix {
        BasicPrefix::Ed25519NT(PublicKey::new(vec![seed; 32]))
    }

    fn rotation(tally: u64, prune: Vec<BasicPrefix>, graft: Vec<BasicPrefix>) -> RotationEvent {
        RotationEvent {
            previous_event_hash: SelfAddressingPrefix::default(),
            key_config: KeyConfig::new(vec![wit(9)], None, Some(SignatureThreshold::Simple(1))),
            witness_config: RotationWitnessConfig {
                tally,
                prune,
                graft,
            },
            data: vec![],
        }
    }

    #[test]
    fn test_witness_transformation() -> Result<(), Error> {
        let prior = WitnessConfig {
            tally: 2,
            witnesses: vec![wit(1), wit(2), wit(3)],
        };

        // cut one, add one
        let rot = rotation(2, vec![wit(2)], vec![wit(4)]);
        let new = rot.transform_witnesses(&prior)?;
        assert_eq!(new.witnesses, vec![wit(1), wit(3), wit(4)]);
        assert_eq!(new.tally, 2);

        // cut of an unknown witness
        let rot = rotation(1, vec![wit(7)], vec![]);
        assert!(matches!(
            rot.transform_witnesses(&prior),
            Err(Error::WitnessSetError(_))
        ));

        // add of a surviving witness
        let rot = rotation(1, vec![], vec![wit(3)]);
        assert!(matches!(
            rot.transform_witnesses(&prior),
            Err(Error::WitnessSetError(_))
        ));

        // tally out of bounds for resulting set
        let rot = rotation(4, vec![], vec![]);
        assert!(matches!(
            rot.transform_witnesses(&prior),
            Err(Error::WitnessSetError(_))
        ));

        Ok(())
    }
}
