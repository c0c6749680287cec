use serde::{Deserialize, Serialize};

use super::threshold::SignatureThreshold;
use crate::{
    derivation::self_addressing::SelfAddressing,
    error::Error,
    prefix::{AttachedSignaturePrefix, BasicPrefix, Prefix, SelfAddressingPrefix},
    state::empty_string_as_none,
};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct KeyConfig {
    #[serde(rename = "kt")]
    pub threshold: SignatureThreshold,

    #[serde(rename = "k")]
    pub public_keys: Vec<BasicPrefix>,

    /// Commitment to the keys authorized to perform the next rotation.
    /// None marks a non-transferable or abandoned identifier.
    #[serde(rename = "n", with = "empty_string_as_none")]
    pub threshold_key_digest: Option<SelfAddressingPrefix>,
}

impl KeyConfig {
    pub fn new(
        public_keys: Vec<BasicPrefix>,
        threshold_key_digest: Option<SelfAddressingPrefix>,
        threshold: Option<SignatureThreshold>,
    ) -> Self {
        Self {
            threshold: threshold.map_or_else(
                || SignatureThreshold::Simple(public_keys.len() as u64 / 2 + 1),
                |t| t,
            ),
            public_keys,
            threshold_key_digest,
        }
    }

    /// Verify
    ///
    /// Verifies the given sigs against the given message using the KeyConfigs
    /// Public Keys, according to the indexes in the sigs.
    pub fn verify(&self, message: &[u8], sigs: &[AttachedSignaturePrefix]) -> Result<bool, Error> {
        // check that sig indexes fit into the key list
        if sigs
            .iter()
            .any(|sig| sig.index.current() as usize >= self.public_keys.len())
        {
            return Err(Error::SemanticError(
                "Signature index not present in key set".into(),
            ));
        }
        // there are no duplicates
        if !(sigs
            .iter()
            .fold(vec![0u64; self.public_keys.len()], |mut acc, sig| {
                acc[sig.index.current() as usize] += 1;
                acc
            })
            .iter()
            .all(|n| *n <= 1))
        {
            Err(Error::DuplicateSignature)
        } else if
        // check if there are not too many
        sigs.len() > self.public_keys.len() {
            Err(Error::TooManySignatures)
        } else {
            // every signature must verify under the key at its index
            for sig in sigs {
                let key = self
                    .public_keys
                    .get(sig.index.current() as usize)
                    .ok_or_else(|| {
                        Error::SemanticError("Key index not present in set".into())
                    })?;
                if !key.verify(message, &sig.signature)? {
                    return Err(Error::SignatureVerificationError);
                }
            }
            // ensure there's enough sigs
            if self.threshold.satisfied_by(sigs)? {
                Ok(true)
            } else {
                Err(Error::NotEnoughSigsError)
            }
        }
    }

    /// The threshold must be expressible over this key list: a weighted
    /// threshold carries exactly one weight per key, a simple one cannot
    /// demand more keys than exist.
    pub fn validate_threshold(&self) -> Result<(), Error> {
        let fits = match &self.threshold {
            SignatureThreshold::Simple(t) => *t as usize <= self.public_keys.len(),
            SignatureThreshold::Weighted(weights) => {
                weights.expected_key_count() == self.public_keys.len()
            }
        };
        if fits {
            Ok(())
        } else {
            Err(Error::SemanticError(
                "Signing threshold doesn't fit key list".into(),
            ))
        }
    }

    /// Verify Next
    ///
    /// Verifies that the given next KeyConfig matches the commitment made
    /// in threshold_key_digest of this KeyConfig
    pub fn verify_next(&self, next: &KeyConfig) -> bool {
        match &self.threshold_key_digest {
            Some(commitment) => {
                commitment
                    == &nxt_commitment(
                        &next.threshold,
                        &next.public_keys,
                        &commitment.derivation,
                    )
            }
            None => false,
        }
    }

    /// Serialize For Next
    ///
    /// Commits to a future set of keys and their threshold.
    pub fn commit(&self, derivation: &SelfAddressing) -> SelfAddressingPrefix {
        nxt_commitment(&self.threshold, &self.public_keys, derivation)
    }
}

/// Serialize For Commitment
///
/// Digest of the canonical threshold encoding concatenated with the digest
/// of each next public key, in order.
pub fn nxt_commitment(
    threshold: &SignatureThreshold,
    keys: &[BasicPrefix],
    derivation: &SelfAddressing,
) -> SelfAddressingPrefix {
    let mut data = serde_json::to_vec(threshold).unwrap_or_default();
    for key in keys {
        data.extend(derivation.digest(key.to_str().as_bytes()));
    }
    derivation.derive(&data)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        derivation::self_addressing::SelfAddressing,
        error::Error,
        event::sections::threshold::SignatureThreshold,
        keys::{PrivateKey, PublicKey},
        prefix::{AttachedSignaturePrefix, SelfSigningPrefix},
    };

    #[test]
    fn test_next_commitment() {
        let next_keys: Vec<BasicPrefix> = [
            "DHqJ2DNmypwMKelWXLgl3V-9pDRcOenM5Wf03O1xx1Ri",
            "DEIISiMvtnaPTpMHkoGs4d0JdbwjreW53OUBfMedLUaF",
        ]
        .iter()
        .map(|x| x.parse().unwrap())
        .collect();
        let sith = SignatureThreshold::Simple(2);
        let nxt = nxt_commitment(&sith, &next_keys, &SelfAddressing::Blake3_256);

        // deterministic and sensitive to threshold and key order
        assert_eq!(
            nxt,
            nxt_commitment(&sith, &next_keys, &SelfAddressing::Blake3_256)
        );
        let other_sith = SignatureThreshold::Simple(1);
        assert_ne!(
            nxt,
            nxt_commitment(&other_sith, &next_keys, &SelfAddressing::Blake3_256)
        );
        let reversed: Vec<BasicPrefix> = next_keys.iter().rev().cloned().collect();
        assert_ne!(
            nxt,
            nxt_commitment(&sith, &reversed, &SelfAddressing::Blake3_256)
        );

        let current = KeyConfig::new(next_keys, None, Some(sith));
        let prior = KeyConfig::new(vec![], Some(nxt), None);
        assert!(prior.verify_next(&current));
    }

    #[test]
    fn test_threshold() -> Result<(), Error> {
        use ed25519_dalek::Keypair;
        use rand::rngs::OsRng;

        let (pub_keys, priv_keys): (Vec<BasicPrefix>, Vec<PrivateKey>) = [0, 1, 2]
            .iter()
            .map(|_| {
                let kp = Keypair::generate(&mut OsRng);
                (
                    BasicPrefix::Ed25519(PublicKey::new(kp.public.to_bytes().to_vec())),
                    PrivateKey::new(kp.secret.to_bytes().to_vec()),
                )
            })
            .unzip();
        let current_threshold = SignatureThreshold::single_weighted(vec![(1, 4), (1, 2), (1, 2)]);
        let key_config = KeyConfig::new(pub_keys, None, Some(current_threshold));

        let msg_to_sign = "message to be signed".as_bytes();

        let mut signatures = vec![];
        for (i, priv_key) in priv_keys.iter().enumerate() {
            let sig = priv_key.sign_ed(msg_to_sign)?;
            signatures.push(AttachedSignaturePrefix::new(
                SelfSigningPrefix::Ed25519Sha512(sig),
                i as u16,
            ));
        }

        // All signatures.
        let st = key_config.verify(
            msg_to_sign,
            &[
                signatures[0].clone(),
                signatures[1].clone(),
                signatures[2].clone(),
            ],
        );
        assert!(matches!(st, Ok(true)));

        // Not enough signatures.
        let st = key_config.verify(
            msg_to_sign,
            &[signatures[0].clone(), signatures[2].clone()],
        );
        assert!(matches!(st, Err(Error::NotEnoughSigsError)));

        // Enough signatures.
        let st = key_config.verify(
            msg_to_sign,
            &[signatures[1].clone(), signatures[2].clone()],
        );
        assert!(matches!(st, Ok(true)));

        // The same signatures.
        let st = key_config.verify(
            msg_to_sign,
            &[
                signatures[0].clone(),
                signatures[0].clone(),
                signatures[0].clone(),
            ],
        );
        assert!(matches!(st, Err(Error::DuplicateSignature)));

        Ok(())
    }
}
