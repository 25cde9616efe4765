//! Error types for session key operations

use std::fmt;

use thiserror::Error;

use crate::codec::CodecError;

/// Which half of the key material is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKey {
    /// No local key pair has been set
    Local,
    /// No remote public value has been set
    Remote,
    /// Neither side has been set
    Both,
}

impl fmt::Display for MissingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local key pair"),
            Self::Remote => f.write_str("remote public key"),
            Self::Both => f.write_str("local key pair and remote public key"),
        }
    }
}

/// Errors from session key operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionKeyError {
    /// Derivation requested before both sides of the exchange were set
    #[error("session keys not initialized: missing {missing}")]
    NotInitialized {
        /// What is missing
        missing: MissingKey,
    },

    /// Active range of the sending counter is all 0xFF
    #[error("sending counter exhausted")]
    CounterExhausted,

    /// Counter value longer than the counter buffer
    #[error("invalid counter length: at most {max} bytes, got {actual}")]
    InvalidCounterLength {
        /// Counter buffer length
        max: usize,
        /// Length supplied
        actual: usize,
    },

    /// Hash or modular arithmetic failed
    #[error("crypto backend error: {reason}")]
    CryptoBackend {
        /// Underlying failure
        reason: String,
    },

    /// A thread panicked while holding the shared slot
    #[error("session key state poisoned")]
    StatePoisoned,

    /// Serializing the shared secret failed
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl SessionKeyError {
    /// Returns true if this error is fatal to the session.
    ///
    /// Non-fatal errors fail the current message or handshake attempt only;
    /// a later rekey recovers from them.
    pub fn is_fatal(&self) -> bool {
        match self {
            // Broken backend or state - fatal
            Self::CryptoBackend { .. } => true,
            Self::StatePoisoned => true,
            Self::Codec(_) => true,

            // Recoverable by rekeying or by rejecting one message
            Self::NotInitialized { .. } => false,
            Self::CounterExhausted => false,
            Self::InvalidCounterLength { .. } => false,
        }
    }
}
