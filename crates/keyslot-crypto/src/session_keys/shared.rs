//! Shared session key slot
//!
//! Encryption reads the sending key and counter, then advances the counter; a
//! rekey replaces both. [`SharedSessionKeys`] puts the whole slot behind one
//! mutex so those read-modify-write sequences never interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    counter::Counter,
    derivation::{AesKey, Direction, MacKey},
    error::SessionKeyError,
    observer::{KeyObserver, TracingObserver},
    slot::SessionKeys,
};
use crate::dh::{DhKeyPair, PublicValue};

/// Everything needed to encrypt and authenticate one outgoing message.
#[derive(Debug, Clone)]
pub struct SendingKeys {
    /// AES key for the sending direction
    pub aes_key: AesKey,
    /// MAC key for the sending direction
    pub mac_key: MacKey,
    /// Counter for this message, already advanced
    pub counter: Counter,
    /// Local key ID the keys belong to
    pub local_key_id: u64,
    /// Remote key ID the keys belong to
    pub remote_key_id: u64,
}

/// Everything needed to verify and decrypt one incoming message.
#[derive(Debug, Clone)]
pub struct ReceivingKeys {
    /// AES key for the receiving direction
    pub aes_key: AesKey,
    /// MAC key for the receiving direction
    pub mac_key: MacKey,
    /// Counter the message declared
    pub counter: Counter,
}

/// A [`SessionKeys`] slot shared between threads.
pub struct SharedSessionKeys<O = TracingObserver> {
    inner: Arc<Mutex<SessionKeys<O>>>,
}

impl<O> Clone for SharedSessionKeys<O> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<O: KeyObserver> SharedSessionKeys<O> {
    /// Take ownership of `slot`.
    pub fn new(slot: SessionKeys<O>) -> Self {
        Self { inner: Arc::new(Mutex::new(slot)) }
    }

    /// Run `f` with exclusive access to the slot.
    ///
    /// # Errors
    ///
    /// - `StatePoisoned` if a previous holder panicked
    pub fn with_slot<T>(
        &self,
        f: impl FnOnce(&mut SessionKeys<O>) -> T,
    ) -> Result<T, SessionKeyError> {
        let mut slot = self.lock()?;
        Ok(f(&mut slot))
    }

    /// Install a new local key pair.
    pub fn set_local_pair(&self, pair: DhKeyPair) -> Result<(), SessionKeyError> {
        self.with_slot(|slot| slot.set_local_pair(pair))
    }

    /// Install a new remote public value.
    pub fn set_remote_public_key(&self, remote: PublicValue) -> Result<(), SessionKeyError> {
        self.with_slot(|slot| slot.set_remote_public_key(remote))
    }

    /// Keys and a fresh counter for the next outgoing message.
    ///
    /// Keys are derived before the counter moves, so a failed derivation
    /// leaves the counter untouched.
    pub fn next_sending_keys(&self) -> Result<SendingKeys, SessionKeyError> {
        let mut slot = self.lock()?;

        let aes_key = slot.aes_key(Direction::Send)?;
        let mac_key = slot.mac_key(Direction::Send)?;
        slot.increment_sending_counter()?;

        Ok(SendingKeys {
            aes_key,
            mac_key,
            counter: slot.sending_counter(),
            local_key_id: slot.local_key_id(),
            remote_key_id: slot.remote_key_id(),
        })
    }

    /// Keys for an incoming message that declared `counter`.
    ///
    /// The receiving counter is only updated once the keys are available.
    pub fn receiving_keys(&self, counter: &[u8]) -> Result<ReceivingKeys, SessionKeyError> {
        let mut slot = self.lock()?;

        let aes_key = slot.aes_key(Direction::Receive)?;
        let mac_key = slot.mac_key(Direction::Receive)?;
        slot.set_receiving_counter(counter)?;

        Ok(ReceivingKeys { aes_key, mac_key, counter: slot.receiving_counter() })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionKeys<O>>, SessionKeyError> {
        self.inner.lock().map_err(|_| SessionKeyError::StatePoisoned)
    }
}
