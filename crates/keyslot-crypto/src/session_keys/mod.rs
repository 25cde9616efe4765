//! Session Keys: per-epoch key material and derived directional keys
//!
//! # Architecture
//!
//! ```text
//! local DhKeyPair ──┐
//!                   ├─▶ shared secret s = remote^x mod p
//! remote PublicValue┘          │
//!                              ▼ SHA1(tag || MPI(s))
//!                   AES key [Send | Receive]
//!                              │
//!                              ▼ SHA1
//!                   MAC key [Send | Receive]
//! ```
//!
//! Alongside the keys, each slot tracks a sending and a receiving counter
//! that the message layer uses as the AES-CTR initial counter block.
//!
//! # Security Properties
//!
//! - Role symmetry: one peer's sending keys are the other's receiving keys
//! - Rekey isolation: a new key pair or public value discards everything
//!   derived from the previous one
//! - Nonce uniqueness: the sending counter never repeats under one key

pub mod counter;
pub mod derivation;
pub mod error;
pub mod observer;
pub mod shared;
pub mod slot;

pub use counter::{COUNTER_ACTIVE_LENGTH, COUNTER_LENGTH, Counter};
pub use derivation::{
    AES_KEY_LENGTH, AesKey, Direction, HIGH_RECEIVE_BYTE, HIGH_SEND_BYTE, LOW_RECEIVE_BYTE,
    LOW_SEND_BYTE, MAC_KEY_LENGTH, MacKey,
};
pub use error::{MissingKey, SessionKeyError};
pub use observer::{KeyEvent, KeyObserver, TracingObserver};
pub use shared::{ReceivingKeys, SendingKeys, SharedSessionKeys};
pub use slot::{SessionKeys, SlotState};
