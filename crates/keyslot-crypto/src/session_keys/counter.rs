//! Per-direction message counters
//!
//! A counter is a 16-byte big-endian buffer used as the initial counter block
//! of AES-CTR. Only the top 8 bytes are incremented; the low 8 bytes stay
//! zero and hold the block counter of the cipher itself.

use std::fmt;

use super::error::SessionKeyError;
use crate::codec::hex_encode;

/// Length of a counter buffer.
pub const COUNTER_LENGTH: usize = 16;

/// Leading bytes of the counter that [`Counter::increment`] advances.
pub const COUNTER_ACTIVE_LENGTH: usize = 8;

/// A 16-byte big-endian message counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Counter([u8; COUNTER_LENGTH]);

impl Counter {
    /// All-zero counter.
    pub const ZERO: Self = Self([0; COUNTER_LENGTH]);

    /// Wrap raw counter bytes.
    pub const fn from_bytes(bytes: [u8; COUNTER_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw counter bytes.
    pub fn as_bytes(&self) -> &[u8; COUNTER_LENGTH] {
        &self.0
    }

    /// The active (top) half, as carried in data messages.
    pub fn active(&self) -> [u8; COUNTER_ACTIVE_LENGTH] {
        let mut top = [0u8; COUNTER_ACTIVE_LENGTH];
        top.copy_from_slice(&self.0[..COUNTER_ACTIVE_LENGTH]);
        top
    }

    /// Whether another increment would overflow the active range.
    pub fn is_exhausted(&self) -> bool {
        self.0[..COUNTER_ACTIVE_LENGTH].iter().all(|&b| b == 0xFF)
    }

    /// Add one to the active range, carrying towards the most significant
    /// byte.
    ///
    /// # Errors
    ///
    /// - `CounterExhausted` if the active range is all 0xFF. The counter is
    ///   left unchanged.
    pub fn increment(&mut self) -> Result<(), SessionKeyError> {
        if self.is_exhausted() {
            return Err(SessionKeyError::CounterExhausted);
        }

        for byte in self.0[..COUNTER_ACTIVE_LENGTH].iter_mut().rev() {
            let (next, carry) = byte.overflowing_add(1);
            *byte = next;
            if !carry {
                break;
            }
        }
        Ok(())
    }

    /// Replace the counter with `bytes`, zero-filling any remaining suffix.
    ///
    /// # Errors
    ///
    /// - `InvalidCounterLength` if `bytes` is longer than [`COUNTER_LENGTH`]
    pub fn overwrite(&mut self, bytes: &[u8]) -> Result<(), SessionKeyError> {
        if bytes.len() > COUNTER_LENGTH {
            return Err(SessionKeyError::InvalidCounterLength {
                max: COUNTER_LENGTH,
                actual: bytes.len(),
            });
        }

        self.0 = [0; COUNTER_LENGTH];
        self.0[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Set back to zero.
    pub fn reset(&mut self) {
        self.0 = [0; COUNTER_LENGTH];
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Counter({})", hex_encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_with_active(active: [u8; COUNTER_ACTIVE_LENGTH]) -> Counter {
        let mut bytes = [0u8; COUNTER_LENGTH];
        bytes[..COUNTER_ACTIVE_LENGTH].copy_from_slice(&active);
        Counter::from_bytes(bytes)
    }

    #[test]
    fn increment_from_zero() {
        let mut counter = Counter::ZERO;
        counter.increment().unwrap();
        assert_eq!(counter.active(), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&counter.as_bytes()[COUNTER_ACTIVE_LENGTH..], &[0u8; 8]);
    }

    #[test]
    fn increment_carries() {
        let mut counter = counter_with_active([0, 0, 0, 0, 0, 0, 0x00, 0xFF]);
        counter.increment().unwrap();
        assert_eq!(counter.active(), [0, 0, 0, 0, 0, 0, 0x01, 0x00]);
    }

    #[test]
    fn increment_carries_across_several_bytes() {
        let mut counter = counter_with_active([0, 0, 0, 0x41, 0xFF, 0xFF, 0xFF, 0xFF]);
        counter.increment().unwrap();
        assert_eq!(counter.active(), [0, 0, 0, 0x42, 0, 0, 0, 0]);
    }

    #[test]
    fn increment_never_touches_low_half() {
        let mut counter = counter_with_active([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]);
        counter.increment().unwrap();
        assert!(counter.is_exhausted());
        assert_eq!(&counter.as_bytes()[COUNTER_ACTIVE_LENGTH..], &[0u8; 8]);
    }

    #[test]
    fn exhausted_counter_fails_unchanged() {
        let mut counter = counter_with_active([0xFF; COUNTER_ACTIVE_LENGTH]);
        let before = counter;

        assert_eq!(counter.increment(), Err(SessionKeyError::CounterExhausted));
        assert_eq!(counter, before);
    }

    #[test]
    fn overwrite_short_value_zero_fills() {
        let mut counter = counter_with_active([0xAA; COUNTER_ACTIVE_LENGTH]);
        counter.overwrite(&[1, 2, 3]).unwrap();

        let mut expected = [0u8; COUNTER_LENGTH];
        expected[..3].copy_from_slice(&[1, 2, 3]);
        assert_eq!(counter.as_bytes(), &expected);
    }

    #[test]
    fn overwrite_full_length_is_verbatim() {
        let mut counter = Counter::ZERO;
        let value = [0x5Au8; COUNTER_LENGTH];
        counter.overwrite(&value).unwrap();
        assert_eq!(counter.as_bytes(), &value);
    }

    #[test]
    fn overwrite_rejects_oversized_value() {
        let mut counter = Counter::ZERO;
        let result = counter.overwrite(&[0u8; COUNTER_LENGTH + 1]);
        assert_eq!(result, Err(SessionKeyError::InvalidCounterLength { max: 16, actual: 17 }));
        assert_eq!(counter, Counter::ZERO);
    }

    #[test]
    fn debug_is_hex() {
        let counter = counter_with_active([0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(format!("{counter:?}"), "Counter(00000000000000010000000000000000)");
    }
}
