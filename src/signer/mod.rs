use ed25519_dalek::Keypair;
use rand::rngs::OsRng;

use crate::{
    error::Error,
    event::KeyEvent,
    event_message::{signed_event_message::SignedEventMessage, EventMessage},
    keys::{PrivateKey, PublicKey},
    prefix::{AttachedSignaturePrefix, SelfSigningPrefix},
};

/// Signer
///
/// A minimal Ed25519 signing capability, used by tests and event
/// generation helpers. Key management proper lives outside the core.
pub struct Signer {
    priv_key: PrivateKey,
    pub_key: PublicKey,
}

impl Signer {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let kp = Keypair::generate(&mut OsRng);
        Self {
            priv_key: PrivateKey::new(kp.secret.to_bytes().to_vec()),
            pub_key: PublicKey::new(kp.public.to_bytes().to_vec()),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.pub_key.clone()
    }

    pub fn sign(&self, msg: impl AsRef<[u8]>) -> Result<Vec<u8>, Error> {
        Ok(self.priv_key.sign_ed(msg.as_ref())?)
    }

    /// Signs the serialized event, attaching the signature at the given
    /// index into the event's current key list.
    pub fn sign_indexed(
        &self,
        event: &EventMessage<KeyEvent>,
        index: u16,
    ) -> Result<SignedEventMessage, Error> {
        let sig = self.sign(event.serialize()?)?;
        Ok(event.sign(
            vec![AttachedSignaturePrefix::new(
                SelfSigningPrefix::Ed25519Sha512(sig),
                index,
            )],
            None,
        ))
    }
}

/// Generates a fresh batch of signers for tests.
pub fn setup_signers(count: usize) -> Vec<Signer> {
    (0..count).map(|_| Signer::new()).collect()
}
