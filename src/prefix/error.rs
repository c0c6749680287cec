use thiserror::Error;

use crate::derivation::DerivationError;
use crate::keys::KeysError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Incorrect prefix length: {0}")]
    IncorrectLengthError(String),

    #[error("Wrong signature type for key type")]
    WrongSignatureTypeError,

    #[error("Wrong key type for signature type")]
    WrongKeyTypeError,

    #[error("Base64 decoding error")]
    Base64DecodingError,

    #[error(transparent)]
    DerivationError(#[from] DerivationError),

    #[error(transparent)]
    KeysError(#[from] KeysError),
}

impl From<base64::DecodeError> for Error {
    fn from(_: base64::DecodeError) -> Self {
        Error::Base64DecodingError
    }
}
