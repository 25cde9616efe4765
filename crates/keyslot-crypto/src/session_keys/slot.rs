//! Session key slot: current key material and everything derived from it
//!
//! # State Machine
//!
//! ```text
//!            set_local_pair / set_remote_public_key
//!  Empty ──────────────────────────────────────────▶ PartiallyKeyed
//!                                                        │
//!                               other side set           │
//!                                                        ▼
//!  Derived ◀──── shared_secret / aes_key / mac_key ── FullyKeyed
//!     │                                                  ▲
//!     └──────────── any setter (rekey) ──────────────────┘
//! ```
//!
//! Derived values live inside the `FullyKeyed` variant, so a rekey replaces
//! them together with the key material they were computed from.

use std::{fmt, mem};

use num_bigint::BigUint;

use super::{
    counter::Counter,
    derivation::{AesKey, Direction, MacKey, derive_aes_key, derive_mac_key},
    error::{MissingKey, SessionKeyError},
    observer::{KeyEvent, KeyObserver, TracingObserver},
};
use crate::dh::{DhKeyPair, PublicValue};

/// Externally visible phase of a [`SessionKeys`] slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing set
    Empty,
    /// Exactly one side set
    PartiallyKeyed,
    /// Both sides set, nothing derived yet
    FullyKeyed,
    /// Shared secret computed
    Derived,
}

/// Cached keys for one direction.
#[derive(Default)]
struct DirectionKeys {
    aes: Option<AesKey>,
    mac: Option<MacKey>,
}

/// Values computed from a fixed (local pair, remote key) epoch.
struct Derived {
    shared_secret: BigUint,
    sending: DirectionKeys,
    receiving: DirectionKeys,
}

impl Derived {
    fn new(shared_secret: BigUint) -> Self {
        Self {
            shared_secret,
            sending: DirectionKeys::default(),
            receiving: DirectionKeys::default(),
        }
    }

    fn keys_mut(&mut self, direction: Direction) -> &mut DirectionKeys {
        match direction {
            Direction::Send => &mut self.sending,
            Direction::Receive => &mut self.receiving,
        }
    }
}

struct Keyed {
    local: DhKeyPair,
    remote: PublicValue,
    is_high: bool,
    derived: Option<Derived>,
}

impl Keyed {
    fn new(local: DhKeyPair, remote: PublicValue) -> Self {
        let is_high = local.public().value() > remote.value();
        Self { local, remote, is_high, derived: None }
    }
}

#[derive(Default)]
enum KeyMaterial {
    #[default]
    Empty,
    LocalOnly(DhKeyPair),
    RemoteOnly(PublicValue),
    Keyed(Box<Keyed>),
}

impl KeyMaterial {
    fn missing(&self) -> Option<MissingKey> {
        match self {
            Self::Empty => Some(MissingKey::Both),
            Self::LocalOnly(_) => Some(MissingKey::Remote),
            Self::RemoteOnly(_) => Some(MissingKey::Local),
            Self::Keyed(_) => None,
        }
    }
}

/// Key IDs of the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct KeyIds {
    local: u64,
    remote: u64,
}

/// Key material and derived keys for one session slot.
///
/// Every call to [`set_local_pair`](Self::set_local_pair) or
/// [`set_remote_public_key`](Self::set_remote_public_key) is a rekey: it
/// advances the matching key ID, discards the shared secret and all derived
/// keys, zeroes both counters and clears the receiving MAC key flag.
///
/// # Invariants
///
/// - Key IDs only increase, by exactly one per setter call
/// - Derived keys are computed at most once per epoch
/// - The sending counter only increases within an epoch
/// - `is_high` is defined iff both sides are set
pub struct SessionKeys<O = TracingObserver> {
    ids: KeyIds,
    material: KeyMaterial,
    sending_counter: Counter,
    receiving_counter: Counter,
    used_receiving_mac_key: bool,
    observer: O,
}

impl SessionKeys {
    /// Create an empty slot that logs through `tracing`.
    pub fn new() -> Self {
        Self::with_observer(TracingObserver)
    }
}

impl Default for SessionKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: KeyObserver> SessionKeys<O> {
    /// Create an empty slot reporting to `observer`.
    pub fn with_observer(observer: O) -> Self {
        Self {
            ids: KeyIds::default(),
            material: KeyMaterial::Empty,
            sending_counter: Counter::ZERO,
            receiving_counter: Counter::ZERO,
            used_receiving_mac_key: false,
            observer,
        }
    }

    /// Install a new local key pair.
    pub fn set_local_pair(&mut self, pair: DhKeyPair) {
        self.material = match mem::take(&mut self.material) {
            KeyMaterial::Empty | KeyMaterial::LocalOnly(_) => KeyMaterial::LocalOnly(pair),
            KeyMaterial::RemoteOnly(remote) => {
                KeyMaterial::Keyed(Box::new(Keyed::new(pair, remote)))
            },
            KeyMaterial::Keyed(keyed) => {
                let Keyed { remote, .. } = *keyed;
                KeyMaterial::Keyed(Box::new(Keyed::new(pair, remote)))
            },
        };
        self.ids.local += 1;

        self.observer.observe(KeyEvent::LocalPairSet { local_key_id: self.ids.local });
        self.reset();
    }

    /// Install a new remote public value.
    pub fn set_remote_public_key(&mut self, remote: PublicValue) {
        self.material = match mem::take(&mut self.material) {
            KeyMaterial::Empty | KeyMaterial::RemoteOnly(_) => KeyMaterial::RemoteOnly(remote),
            KeyMaterial::LocalOnly(local) => {
                KeyMaterial::Keyed(Box::new(Keyed::new(local, remote)))
            },
            KeyMaterial::Keyed(keyed) => {
                let Keyed { local, .. } = *keyed;
                KeyMaterial::Keyed(Box::new(Keyed::new(local, remote)))
            },
        };
        self.ids.remote += 1;

        self.observer.observe(KeyEvent::RemoteKeySet { remote_key_id: self.ids.remote });
        self.reset();
    }

    fn reset(&mut self) {
        self.sending_counter.reset();
        self.receiving_counter.reset();
        self.used_receiving_mac_key = false;

        self.observer.observe(KeyEvent::Reset {
            local_key_id: self.ids.local,
            remote_key_id: self.ids.remote,
        });
    }

    /// Shared secret s = remote^x mod p, computed on first use.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` unless both sides are set
    /// - `CryptoBackend` if the two values belong to different groups
    pub fn shared_secret(&mut self) -> Result<&BigUint, SessionKeyError> {
        let (derived, _) = derive(&mut self.material, &self.observer, self.ids)?;
        Ok(&derived.shared_secret)
    }

    /// AES key for `direction`, computed on first use.
    pub fn aes_key(&mut self, direction: Direction) -> Result<AesKey, SessionKeyError> {
        let (derived, is_high) = derive(&mut self.material, &self.observer, self.ids)?;
        let Derived { shared_secret, sending, receiving } = derived;
        let keys = match direction {
            Direction::Send => sending,
            Direction::Receive => receiving,
        };

        if let Some(key) = &keys.aes {
            return Ok(key.clone());
        }

        let key = derive_aes_key(direction, is_high, shared_secret)?;
        self.observer.observe(KeyEvent::AesKeyDerived { direction });
        Ok(keys.aes.insert(key).clone())
    }

    /// MAC key for `direction` (SHA-1 of the AES key), computed on first use.
    pub fn mac_key(&mut self, direction: Direction) -> Result<MacKey, SessionKeyError> {
        if let Some(mac) = self.cached_keys(direction).and_then(|keys| keys.mac.clone()) {
            return Ok(mac);
        }

        let aes = self.aes_key(direction)?;
        let mac = derive_mac_key(&aes);
        self.observer.observe(KeyEvent::MacKeyDerived { direction });

        if let Some(keys) = self.cached_keys(direction) {
            keys.mac = Some(mac.clone());
        }
        Ok(mac)
    }

    fn cached_keys(&mut self, direction: Direction) -> Option<&mut DirectionKeys> {
        match &mut self.material {
            KeyMaterial::Keyed(keyed) => keyed.derived.as_mut().map(|d| d.keys_mut(direction)),
            _ => None,
        }
    }

    /// Advance the sending counter by one.
    ///
    /// # Errors
    ///
    /// - `CounterExhausted` once the active range is all 0xFF; rekey to
    ///   continue sending
    pub fn increment_sending_counter(&mut self) -> Result<(), SessionKeyError> {
        self.sending_counter.increment()?;
        self.observer.observe(KeyEvent::SendingCounterIncremented {
            local_key_id: self.ids.local,
            remote_key_id: self.ids.remote,
        });
        Ok(())
    }

    /// Overwrite the receiving counter with the value a message declared.
    ///
    /// `bytes` fills the front of the counter and every remaining byte is
    /// zeroed, so an 8-byte active value leaves a zero low half. No ordering
    /// check is made here; rejecting replays is up to the caller.
    ///
    /// # Errors
    ///
    /// - `InvalidCounterLength` if `bytes` is longer than 16 bytes
    pub fn set_receiving_counter(&mut self, bytes: &[u8]) -> Result<(), SessionKeyError> {
        self.receiving_counter.overwrite(bytes)?;
        self.observer.observe(KeyEvent::ReceivingCounterSet);
        Ok(())
    }
}

impl<O> SessionKeys<O> {
    /// Record that the receiving MAC key has been used to verify a message.
    pub fn mark_receiving_mac_key_used(&mut self) {
        self.used_receiving_mac_key = true;
    }

    /// Whether the receiving MAC key was used since the last rekey.
    pub fn was_receiving_mac_key_used(&self) -> bool {
        self.used_receiving_mac_key
    }

    /// Current sending counter.
    pub fn sending_counter(&self) -> Counter {
        self.sending_counter
    }

    /// Current receiving counter.
    pub fn receiving_counter(&self) -> Counter {
        self.receiving_counter
    }

    /// Number of local key pairs installed so far.
    pub fn local_key_id(&self) -> u64 {
        self.ids.local
    }

    /// Number of remote public values installed so far.
    pub fn remote_key_id(&self) -> u64 {
        self.ids.remote
    }

    /// Current local key pair.
    pub fn local_pair(&self) -> Option<&DhKeyPair> {
        match &self.material {
            KeyMaterial::LocalOnly(local) => Some(local),
            KeyMaterial::Keyed(keyed) => Some(&keyed.local),
            KeyMaterial::Empty | KeyMaterial::RemoteOnly(_) => None,
        }
    }

    /// Current remote public value.
    pub fn remote_public_key(&self) -> Option<&PublicValue> {
        match &self.material {
            KeyMaterial::RemoteOnly(remote) => Some(remote),
            KeyMaterial::Keyed(keyed) => Some(&keyed.remote),
            KeyMaterial::Empty | KeyMaterial::LocalOnly(_) => None,
        }
    }

    /// Whether our public value is the larger one. `None` until both sides
    /// are set.
    pub fn is_high(&self) -> Option<bool> {
        match &self.material {
            KeyMaterial::Keyed(keyed) => Some(keyed.is_high),
            _ => None,
        }
    }

    /// Current phase.
    pub fn state(&self) -> SlotState {
        match &self.material {
            KeyMaterial::Empty => SlotState::Empty,
            KeyMaterial::LocalOnly(_) | KeyMaterial::RemoteOnly(_) => SlotState::PartiallyKeyed,
            KeyMaterial::Keyed(keyed) if keyed.derived.is_some() => SlotState::Derived,
            KeyMaterial::Keyed(_) => SlotState::FullyKeyed,
        }
    }

    /// The observer events are reported to.
    pub fn observer(&self) -> &O {
        &self.observer
    }
}

/// Fetch the derived state, computing the shared secret on first use.
fn derive<'a, O: KeyObserver>(
    material: &'a mut KeyMaterial,
    observer: &O,
    ids: KeyIds,
) -> Result<(&'a mut Derived, bool), SessionKeyError> {
    if let Some(missing) = material.missing() {
        return Err(SessionKeyError::NotInitialized { missing });
    }
    let KeyMaterial::Keyed(keyed) = material else {
        unreachable!("only keyed material has nothing missing");
    };

    let is_high = keyed.is_high;
    let derived = match &mut keyed.derived {
        Some(derived) => derived,
        empty => {
            let secret = keyed
                .local
                .agree(&keyed.remote)
                .map_err(|e| SessionKeyError::CryptoBackend { reason: e.to_string() })?;
            observer.observe(KeyEvent::SharedSecretComputed {
                local_key_id: ids.local,
                remote_key_id: ids.remote,
            });
            empty.insert(Derived::new(secret))
        },
    };

    Ok((derived, is_high))
}

impl<O> fmt::Debug for SessionKeys<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("local_key_id", &self.ids.local)
            .field("remote_key_id", &self.ids.remote)
            .field("state", &self.state())
            .field("sending_counter", &self.sending_counter)
            .field("receiving_counter", &self.receiving_counter)
            .finish_non_exhaustive()
    }
}
