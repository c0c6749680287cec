use core::num::ParseIntError;

use base64::DecodeError;
use thiserror::Error;

use crate::prefix::IdentifierPrefix;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error during serialization: {0}")]
    SerializationError(String),

    #[error("Deserialize error: {0}")]
    DeserializeError(String),

    #[error("Unsupported version string: {0}")]
    VersionError(String),

    #[error("Stream needs {0} more bytes")]
    ShortageError(usize),

    #[error("Error parsing numerical value")]
    ParseIntError,

    #[error("Error while applying event: {0}")]
    SemanticError(String),

    #[error("Error while applying event: out of order event")]
    EventOutOfOrderError,

    #[error("Error while applying event: duplicate event")]
    EventDuplicateError,

    #[error("Error while applying event: improper recovery")]
    RecoveryError,

    #[error("Error while applying event: missing delegator source seal: {0}")]
    MissingDelegatorSealError(IdentifierPrefix),

    #[error("Error while applying event: missing delegating event")]
    MissingDelegatingEventError,

    #[error("Identifier is not transferable")]
    NonTransferableError,

    #[error("Next keys commitment doesn't match rotation keys")]
    NextCommitmentMismatchError,

    #[error("Invalid witness set transformation: {0}")]
    WitnessSetError(String),

    #[error("Not enough signatures while verifying")]
    NotEnoughSigsError,

    #[error("Signature duplicate while verifying")]
    DuplicateSignature,

    #[error("Too many signatures while verifying")]
    TooManySignatures,

    #[error("Signature verification failed")]
    SignatureVerificationError,

    #[error("Receipt signature verification failed")]
    ReceiptVerificationError,

    #[error("Receipt from stale establishment event")]
    StaleReceiptError,

    #[error("Event not yet in database")]
    MissingEvent,

    #[error("Event has no signatures")]
    MissingSignatures,

    #[error("Incorrect event digest")]
    IncorrectDigest,

    #[error("Base64 decoding error")]
    Base64DecodingError,

    #[error("Improper prefix type")]
    ImproperPrefixType,

    #[error("mutex is poisoned")]
    MutexPoisoned,

    #[error(transparent)]
    DbError(#[from] crate::database::DbError),

    #[error(transparent)]
    PrefixModuleError(#[from] crate::prefix::error::Error),

    #[error(transparent)]
    ThresholdError(#[from] crate::event::sections::threshold::ThresholdError),
}

impl From<ParseIntError> for Error {
    fn from(_: ParseIntError) -> Self {
        Error::ParseIntError
    }
}

impl From<base64::DecodeError> for Error {
    fn from(_: DecodeError) -> Self {
        Error::Base64DecodingError
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DeserializeError(e.to_string())
    }
}

impl From<crate::keys::KeysError> for Error {
    fn from(e: crate::keys::KeysError) -> Self {
        Error::PrefixModuleError(e.into())
    }
}
