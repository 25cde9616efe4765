//! Key lifecycle events
//!
//! The store reports what it does through an injected [`KeyObserver`]. Events
//! carry key IDs and directions only, never key material, so they are safe to
//! forward to any log sink.

use super::derivation::Direction;

/// Something the session key store did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A local key pair was installed
    LocalPairSet {
        /// Local key ID after the update
        local_key_id: u64,
    },
    /// A remote public value was installed
    RemoteKeySet {
        /// Remote key ID after the update
        remote_key_id: u64,
    },
    /// Derived keys and counters were cleared
    Reset {
        /// Current local key ID
        local_key_id: u64,
        /// Current remote key ID
        remote_key_id: u64,
    },
    /// Shared secret was computed
    SharedSecretComputed {
        /// Current local key ID
        local_key_id: u64,
        /// Current remote key ID
        remote_key_id: u64,
    },
    /// An AES key was derived
    AesKeyDerived {
        /// Direction of the key
        direction: Direction,
    },
    /// A MAC key was derived
    MacKeyDerived {
        /// Direction of the key
        direction: Direction,
    },
    /// Sending counter advanced
    SendingCounterIncremented {
        /// Current local key ID
        local_key_id: u64,
        /// Current remote key ID
        remote_key_id: u64,
    },
    /// Receiving counter overwritten
    ReceivingCounterSet,
}

/// Sink for [`KeyEvent`]s.
pub trait KeyObserver {
    /// Called synchronously after the event happened.
    fn observe(&self, event: KeyEvent);
}

impl<T: KeyObserver + ?Sized> KeyObserver for std::sync::Arc<T> {
    fn observe(&self, event: KeyEvent) {
        (**self).observe(event);
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl KeyObserver for TracingObserver {
    fn observe(&self, event: KeyEvent) {
        match event {
            KeyEvent::LocalPairSet { local_key_id } => {
                tracing::info!(local_key_id, "local key pair set");
            },
            KeyEvent::RemoteKeySet { remote_key_id } => {
                tracing::info!(remote_key_id, "remote public key set");
            },
            KeyEvent::Reset { local_key_id, remote_key_id } => {
                tracing::info!(local_key_id, remote_key_id, "session keys reset");
            },
            KeyEvent::SharedSecretComputed { local_key_id, remote_key_id } => {
                tracing::debug!(local_key_id, remote_key_id, "computed shared secret");
            },
            KeyEvent::AesKeyDerived { direction } => {
                tracing::debug!(?direction, "derived AES key");
            },
            KeyEvent::MacKeyDerived { direction } => {
                tracing::debug!(?direction, "derived MAC key");
            },
            KeyEvent::SendingCounterIncremented { local_key_id, remote_key_id } => {
                tracing::trace!(local_key_id, remote_key_id, "incremented sending counter");
            },
            KeyEvent::ReceivingCounterSet => {
                tracing::trace!("receiving counter set");
            },
        }
    }
}
