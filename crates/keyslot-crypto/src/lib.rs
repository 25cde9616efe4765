//! Keyslot Cryptographic Core
//!
//! Per-session key derivation and key-rotation bookkeeping for a messaging
//! protocol built on ephemeral Diffie-Hellman. Pure, synchronous code;
//! callers provide the random source so tests can run deterministically.
//!
//! # Key Lifecycle
//!
//! Each side generates an ephemeral DH key pair, learns the peer's public
//! value from the handshake, and installs both into a [`SessionKeys`] slot.
//! The slot derives the shared secret and four directional keys on demand and
//! keeps the message counters. Installing a new key pair or public value
//! starts a new epoch.
//!
//! ```text
//! GroupParameters + RNG
//!        │
//!        ▼
//! DhKeyPair (local)      PublicValue (remote)
//!        │                       │
//!        └──────────┬────────────┘
//!                   ▼
//!             SessionKeys slot
//!                   │
//!                   ▼
//!   AES / MAC keys per direction + counters
//! ```
//!
//! # Security
//!
//! Secret hygiene:
//! - Private exponents and derived keys are zeroized on drop
//! - Key comparisons run in constant time
//! - Log events carry key IDs and directions, never key bytes
//!
//! Nonce discipline:
//! - The sending counter fails with `CounterExhausted` instead of wrapping
//! - [`SharedSessionKeys`] serializes key reads against rekeys

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod dh;
pub mod session_keys;

pub use codec::CodecError;
pub use dh::{DhError, DhKeyPair, GroupConfig, GroupParameters, PublicValue};
pub use session_keys::{
    AES_KEY_LENGTH, AesKey, COUNTER_LENGTH, Counter, Direction, KeyEvent, KeyObserver,
    MAC_KEY_LENGTH, MacKey, ReceivingKeys, SendingKeys, SessionKeyError, SessionKeys,
    SharedSessionKeys, SlotState, TracingObserver,
};
