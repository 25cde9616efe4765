//! Error types for DH group and key pair operations

use thiserror::Error;

use crate::codec::CodecError;

/// Errors from DH operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DhError {
    /// Group parameters are unusable
    #[error("invalid group parameters: {reason}")]
    InvalidGroup {
        /// Which parameter was rejected
        reason: &'static str,
    },

    /// Private exponent outside the range the group allows
    #[error("private exponent out of range for group")]
    InvalidPrivateExponent,

    /// Public value outside [2, p - 2]
    #[error("public value out of range for group")]
    InvalidPublicValue,

    /// Random source could not supply entropy
    #[error("random source failure: {reason}")]
    RandomSourceFailure {
        /// Error reported by the random source
        reason: String,
    },

    /// Modular arithmetic could not be carried out
    #[error("crypto backend error: {reason}")]
    CryptoBackend {
        /// What went wrong
        reason: String,
    },

    /// Group configuration could not be decoded
    #[error("group config: {0}")]
    Codec(#[from] CodecError),
}
