//! Fuzz target for the session key store
//!
//! Drives two peers through arbitrary rekey, derive and counter operations
//! over a small safe-prime group.
//!
//! # Invariants
//!
//! - No operation sequence panics
//! - Key IDs advance by exactly one per setter call
//! - Once both peers hold each other's current values, their keys are
//!   complementary
//! - The sending counter strictly increases between rekeys

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use keyslot_crypto::{Counter, DhKeyPair, Direction, GroupParameters, SessionKeyError, SessionKeys};
use libfuzzer_sys::fuzz_target;
use num_bigint::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    operations: Vec<Operation>,
}

#[derive(Debug, Arbitrary)]
enum Operation {
    /// Alice generates a new pair and Bob learns its public value
    RekeyAlice,
    /// Bob generates a new pair and Alice learns its public value
    RekeyBob,
    /// Alice installs a pair Bob never hears about
    OrphanAlicePair,
    /// Derive a key on Alice's side
    Derive { send: bool, mac: bool },
    /// Advance Alice's sending counter
    Send,
    /// Alice receives a declared counter
    Receive { counter: Vec<u8> },
}

fuzz_target!(|scenario: Scenario| {
    // p = 2039 = 2 * 1019 + 1
    let group = Arc::new(
        GroupParameters::new(
            BigUint::from(2039u16),
            BigUint::from(7u8),
            BigUint::from(1019u16),
            None,
        )
        .unwrap(),
    );
    let mut rng = ChaCha20Rng::seed_from_u64(scenario.seed);

    let mut alice = SessionKeys::new();
    let mut bob = SessionKeys::new();
    // Whether each side's current public value has reached the other
    let mut alice_known = false;
    let mut bob_known = false;
    let mut last_sent = Counter::ZERO;

    for op in scenario.operations.into_iter().take(64) {
        let ids = (alice.local_key_id(), alice.remote_key_id());

        match op {
            Operation::RekeyAlice => {
                let pair = DhKeyPair::generate(Arc::clone(&group), &mut rng).unwrap();
                bob.set_remote_public_key(pair.public().clone());
                alice.set_local_pair(pair);
                assert_eq!(alice.local_key_id(), ids.0 + 1);
                alice_known = true;
                last_sent = Counter::ZERO;
            },
            Operation::RekeyBob => {
                let pair = DhKeyPair::generate(Arc::clone(&group), &mut rng).unwrap();
                alice.set_remote_public_key(pair.public().clone());
                bob.set_local_pair(pair);
                assert_eq!(alice.remote_key_id(), ids.1 + 1);
                bob_known = true;
                last_sent = Counter::ZERO;
            },
            Operation::OrphanAlicePair => {
                let pair = DhKeyPair::generate(Arc::clone(&group), &mut rng).unwrap();
                alice.set_local_pair(pair);
                assert_eq!(alice.local_key_id(), ids.0 + 1);
                alice_known = false;
                last_sent = Counter::ZERO;
            },
            Operation::Derive { send, mac } => {
                // Equal public values leave both sides low; tiny groups hit that
                let in_sync = alice_known && bob_known && alice.is_high() != bob.is_high();
                let (ours, theirs) = if send {
                    (Direction::Send, Direction::Receive)
                } else {
                    (Direction::Receive, Direction::Send)
                };

                if mac {
                    let result = alice.mac_key(ours);
                    if in_sync {
                        assert_eq!(result.unwrap(), bob.mac_key(theirs).unwrap());
                    } else if let Err(e) = result {
                        assert!(matches!(e, SessionKeyError::NotInitialized { .. }), "{e}");
                    }
                } else {
                    let result = alice.aes_key(ours);
                    if in_sync {
                        assert_eq!(result.unwrap(), bob.aes_key(theirs).unwrap());
                    } else if let Err(e) = result {
                        assert!(matches!(e, SessionKeyError::NotInitialized { .. }), "{e}");
                    }
                }
            },
            Operation::Send => {
                if alice.increment_sending_counter().is_ok() {
                    let now = alice.sending_counter();
                    assert!(now.active() > last_sent.active(), "counter must increase");
                    last_sent = now;
                }
            },
            Operation::Receive { counter } => {
                let result = alice.set_receiving_counter(&counter);
                assert_eq!(result.is_ok(), counter.len() <= 16);
            },
        }
    }
});
