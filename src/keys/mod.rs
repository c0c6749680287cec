use std::convert::TryFrom;

use ed25519_dalek::Verifier;
use k256::ecdsa::{
    signature::{Signer as EcdsaSigner, Verifier as EcdsaVerifier},
    Signature as EcdsaSignature, SigningKey, VerifyingKey,
};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum KeysError {
    #[error("ED25519Dalek key error")]
    Ed25519DalekKeyError,

    #[error("ED25519Dalek signature error")]
    Ed25519DalekSignatureError,

    #[error("ECDSA signature error")]
    EcdsaError,
}

impl From<ed25519_dalek::SignatureError> for KeysError {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        KeysError::Ed25519DalekSignatureError
    }
}

#[derive(Debug, Clone, PartialEq, Hash, Eq, Default, Serialize, Deserialize)]
pub struct PublicKey {
    pub public_key: Vec<u8>,
}

impl PublicKey {
    pub fn new(key: Vec<u8>) -> Self {
        PublicKey { public_key: key }
    }

    pub fn key(&self) -> Vec<u8> {
        self.public_key.clone()
    }

    pub fn verify_ed(&self, msg: &[u8], sig: &[u8]) -> bool {
        if let Ok(key) = ed25519_dalek::PublicKey::from_bytes(&self.key()) {
            if sig.len() != 64 {
                return false;
            }
            use arrayref::array_ref;
            match ed25519_dalek::Signature::from_bytes(array_ref!(sig, 0, 64)) {
                Ok(sig) => key.verify(msg, &sig).is_ok(),
                Err(_) => false,
            }
        } else {
            false
        }
    }

    pub fn verify_ecdsa(&self, msg: &[u8], sig: &[u8]) -> bool {
        match VerifyingKey::from_sec1_bytes(&self.key()) {
            Ok(k) => {
                if let Ok(sig) = EcdsaSignature::try_from(sig) {
                    k.verify(msg, &sig).is_ok()
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct PrivateKey {
    key: Vec<u8>,
}

impl PrivateKey {
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    pub fn sign_ecdsa(&self, msg: &[u8]) -> Result<Vec<u8>, KeysError> {
        let key = SigningKey::from_bytes(&self.key).map_err(|_e| KeysError::EcdsaError)?;
        let sig: EcdsaSignature = EcdsaSigner::sign(&key, msg);
        Ok(sig.as_ref().to_vec())
    }

    pub fn sign_ed(&self, msg: &[u8]) -> Result<Vec<u8>, KeysError> {
        let sk = ed25519_dalek::SecretKey::from_bytes(&self.key)
            .map_err(|_e| KeysError::Ed25519DalekKeyError)?;
        let pk = ed25519_dalek::PublicKey::from(&sk);
        Ok(ed25519_dalek::ExpandedSecretKey::from(&sk)
            .sign(msg, &pk)
            .to_bytes()
            .to_vec())
    }

    pub fn key(&self) -> Vec<u8> {
        self.key.clone()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.key.zeroize()
    }
}

#[test]
fn test_sign_verify_ed() {
    use rand::rngs::OsRng;

    let kp = ed25519_dalek::Keypair::generate(&mut OsRng);
    let pub_key = PublicKey::new(kp.public.to_bytes().to_vec());
    let priv_key = PrivateKey::new(kp.secret.to_bytes().to_vec());

    let msg = b"are the wrappers consistent?";
    let sig = priv_key.sign_ed(msg).unwrap();

    assert!(pub_key.verify_ed(msg, &sig));
    assert!(!pub_key.verify_ed(b"something else", &sig));
}
