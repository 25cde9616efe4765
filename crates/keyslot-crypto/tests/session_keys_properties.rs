//! Property-based tests for session key derivation
//!
//! These tests verify the invariants the message layer relies on:
//!
//! 1. **Role symmetry**: one side's sending keys are the other's receiving keys
//! 2. **Counter monotonicity**: each increment adds exactly one
//! 3. **Fixed-length encoding**: padding preserves the value, overflow fails
//! 4. **Rekey isolation**: a new epoch never reuses derived keys

use std::sync::Arc;

use keyslot_crypto::{
    Counter, DhKeyPair, Direction, GroupParameters, SessionKeys, SlotState,
    codec::{
        CodecError, big_int_from_unsigned_bytes, big_int_to_fixed_bytes, big_int_to_unsigned_bytes,
    },
    session_keys::COUNTER_ACTIVE_LENGTH,
};
use num_bigint::BigUint;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn group() -> Arc<GroupParameters> {
    Arc::new(GroupParameters::rfc3526_modp1536())
}

fn slots_for(seed: u64) -> (SessionKeys, SessionKeys) {
    let group = group();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let a = DhKeyPair::generate(Arc::clone(&group), &mut rng).unwrap();
    let b = DhKeyPair::generate(group, &mut rng).unwrap();

    let mut alice = SessionKeys::new();
    let mut bob = SessionKeys::new();
    alice.set_remote_public_key(b.public().clone());
    bob.set_remote_public_key(a.public().clone());
    alice.set_local_pair(a);
    bob.set_local_pair(b);
    (alice, bob)
}

fn counter_at(active: u64) -> Counter {
    let mut bytes = [0u8; 16];
    bytes[..COUNTER_ACTIVE_LENGTH].copy_from_slice(&active.to_be_bytes());
    Counter::from_bytes(bytes)
}

fn active_value(counter: &Counter) -> u64 {
    u64::from_be_bytes(counter.active())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_directional_keys_are_role_symmetric(seed in any::<u64>()) {
        let (mut alice, mut bob) = slots_for(seed);

        prop_assert_ne!(alice.is_high(), bob.is_high());
        let pairs = [(Direction::Send, Direction::Receive), (Direction::Receive, Direction::Send)];
        for (ours, theirs) in pairs {
            prop_assert_eq!(alice.aes_key(ours).unwrap(), bob.aes_key(theirs).unwrap());
            prop_assert_eq!(alice.mac_key(ours).unwrap(), bob.mac_key(theirs).unwrap());
        }
    }

    #[test]
    fn prop_rekey_produces_fresh_keys(seed in any::<u64>()) {
        let (mut alice, _) = slots_for(seed);
        let mut rng = ChaCha20Rng::seed_from_u64(seed.wrapping_add(1));

        let before = alice.aes_key(Direction::Send).unwrap();
        alice.set_local_pair(DhKeyPair::generate(group(), &mut rng).unwrap());

        prop_assert_eq!(alice.state(), SlotState::FullyKeyed);
        prop_assert_ne!(alice.aes_key(Direction::Send).unwrap(), before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_counter_increments_by_one(
        start in 0u64..(u64::MAX - 1_000),
        steps in 0u64..300,
    ) {
        let mut counter = counter_at(start);
        for _ in 0..steps {
            let before = active_value(&counter);
            counter.increment().unwrap();
            prop_assert_eq!(active_value(&counter), before + 1);
        }

        prop_assert_eq!(active_value(&counter), start + steps);
        prop_assert_eq!(&counter.as_bytes()[COUNTER_ACTIVE_LENGTH..], &[0u8; 8][..]);
    }

    #[test]
    fn prop_fixed_length_encoding_pads(
        bytes in prop::collection::vec(any::<u8>(), 1..64),
        extra in 0usize..8,
    ) {
        let value = big_int_from_unsigned_bytes(&bytes);
        let minimal = big_int_to_unsigned_bytes(&value).len();
        let length = minimal + extra;

        let encoded = big_int_to_fixed_bytes(&value, length).unwrap();
        prop_assert_eq!(encoded.len(), length);
        prop_assert!(encoded[..extra].iter().all(|&b| b == 0));
        prop_assert_eq!(big_int_from_unsigned_bytes(&encoded), value);
    }

    #[test]
    fn prop_fixed_length_encoding_rejects_short_field(
        bytes in prop::collection::vec(1u8..=255, 2..64),
    ) {
        // Non-zero leading byte, so the minimal encoding is exactly `bytes`
        let value = BigUint::from_bytes_be(&bytes);
        let length = bytes.len() - 1;

        prop_assert_eq!(
            big_int_to_fixed_bytes(&value, length),
            Err(CodecError::LengthExceeded { max: length, actual: bytes.len() })
        );
    }
}
