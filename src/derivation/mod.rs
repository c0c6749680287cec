use thiserror::Error;

pub mod attached_signature_code;
pub mod basic;
pub mod self_addressing;
pub mod self_signing;

#[derive(Debug, Error, PartialEq)]
pub enum DerivationError {
    #[error("Unknown derivation code: {0}")]
    UnknownCode(String),

    #[error("Incorrect primitive length: {0}")]
    IncorrectLength(String),
}

/// Derivation Code
///
/// Common interface of qualified Base64 derivation codes: every code knows
/// its own text length and the text length of the material it qualifies.
pub trait DerivationCode {
    fn code_len(&self) -> usize;
    fn derivative_b64_len(&self) -> usize;
    fn prefix_b64_len(&self) -> usize {
        self.code_len() + self.derivative_b64_len()
    }
    fn to_str(&self) -> String;
}
