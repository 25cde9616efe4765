//! Ephemeral Diffie-Hellman over a prime modulus
//!
//! Group parameters are immutable and shared through `Arc`. Key pairs are
//! generated from a caller-supplied cryptographic RNG so tests can run with a
//! seeded generator.

pub mod error;
pub mod group;
pub mod keypair;

pub use error::DhError;
pub use group::{GroupConfig, GroupParameters, PublicValue};
pub use keypair::DhKeyPair;
