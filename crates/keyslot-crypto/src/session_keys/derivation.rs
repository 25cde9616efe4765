//! Directional key derivation from the DH shared secret
//!
//! ```text
//! aes_key = SHA1(tag || MPI(s))[..16]
//! mac_key = SHA1(aes_key)
//! ```
//!
//! The tag depends on the direction and on which side holds the larger public
//! value. The high side's sending tag is the low side's receiving tag, so the
//! two peers always derive complementary keys.

use std::fmt;

use num_bigint::BigUint;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::codec::{CodecError, MPI_LENGTH_PREFIX, write_mpi};

/// AES-128 key length.
pub const AES_KEY_LENGTH: usize = 16;

/// SHA-1 MAC key length.
pub const MAC_KEY_LENGTH: usize = 20;

/// Tag for the sending key of the side with the larger public value
pub const HIGH_SEND_BYTE: u8 = 0x01;

/// Tag for the receiving key of the side with the larger public value
pub const HIGH_RECEIVE_BYTE: u8 = 0x02;

/// Tag for the sending key of the side with the smaller public value
pub const LOW_SEND_BYTE: u8 = 0x02;

/// Tag for the receiving key of the side with the smaller public value
pub const LOW_RECEIVE_BYTE: u8 = 0x01;

/// Direction of a derived key, from the local side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Keys for messages we send
    Send,
    /// Keys for messages we receive
    Receive,
}

impl Direction {
    /// Role tag hashed in front of the shared secret.
    pub fn role_tag(self, is_high: bool) -> u8 {
        match (self, is_high) {
            (Self::Send, true) => HIGH_SEND_BYTE,
            (Self::Send, false) => LOW_SEND_BYTE,
            (Self::Receive, true) => HIGH_RECEIVE_BYTE,
            (Self::Receive, false) => LOW_RECEIVE_BYTE,
        }
    }
}

macro_rules! secret_key {
    ($name:ident, $len:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Raw key bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0[..].ct_eq(&other.0[..]).into()
            }
        }

        impl Eq for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "([redacted])"))
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.0.zeroize();
            }
        }
    };
}

secret_key!(AesKey, AES_KEY_LENGTH, "A 16-byte AES-128 key for one direction.");
secret_key!(MacKey, MAC_KEY_LENGTH, "A 20-byte HMAC-SHA1 key for one direction.");

/// `SHA1(tag || MPI(secret))`.
pub fn h1(tag: u8, secret: &BigUint) -> Result<[u8; MAC_KEY_LENGTH], CodecError> {
    let capacity = 1 + MPI_LENGTH_PREFIX + secret.bits().div_ceil(8) as usize;
    let mut input = Zeroizing::new(Vec::with_capacity(capacity));
    input.push(tag);
    write_mpi(&mut input, secret)?;

    Ok(Sha1::digest(input.as_slice()).into())
}

/// Derive the AES key for `direction`.
pub fn derive_aes_key(
    direction: Direction,
    is_high: bool,
    secret: &BigUint,
) -> Result<AesKey, CodecError> {
    let digest = Zeroizing::new(h1(direction.role_tag(is_high), secret)?);

    let mut key = [0u8; AES_KEY_LENGTH];
    key.copy_from_slice(&digest[..AES_KEY_LENGTH]);
    Ok(AesKey(key))
}

/// Derive the MAC key paired with `aes_key`.
pub fn derive_mac_key(aes_key: &AesKey) -> MacKey {
    MacKey(Sha1::digest(aes_key.as_bytes()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::hex_decode;

    #[test]
    fn role_tags_are_complementary() {
        assert_eq!(Direction::Send.role_tag(true), Direction::Receive.role_tag(false));
        assert_eq!(Direction::Receive.role_tag(true), Direction::Send.role_tag(false));
        assert_ne!(Direction::Send.role_tag(true), Direction::Receive.role_tag(true));
    }

    #[test]
    fn h1_hashes_tag_then_mpi() {
        let secret = BigUint::from(0x0102u32);
        let expected: [u8; 20] =
            Sha1::digest([0x01u8, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02]).into();
        assert_eq!(h1(0x01, &secret).unwrap(), expected);
    }

    #[test]
    fn h1_of_zero_secret_uses_empty_mpi() {
        let expected: [u8; 20] = Sha1::digest([0x02u8, 0x00, 0x00, 0x00, 0x00]).into();
        assert_eq!(h1(0x02, &BigUint::from(0u8)).unwrap(), expected);
    }

    #[test]
    fn digest_backend_known_answer() {
        let abc: [u8; 20] = Sha1::digest(b"abc").into();
        assert_eq!(abc.to_vec(), hex_decode("a9993e364706816aba3e25717850c26c9cd0d89d").unwrap());
    }

    #[test]
    fn aes_key_is_digest_prefix() {
        let secret = BigUint::from(123_456_789u64);
        let key = derive_aes_key(Direction::Send, true, &secret).unwrap();
        let digest = h1(HIGH_SEND_BYTE, &secret).unwrap();
        assert_eq!(key.as_bytes(), &digest[..AES_KEY_LENGTH]);
    }

    #[test]
    fn mac_key_is_hash_of_aes_key() {
        let secret = BigUint::from(987_654_321u64);
        let aes = derive_aes_key(Direction::Receive, false, &secret).unwrap();
        let mac = derive_mac_key(&aes);

        let expected: [u8; 20] = Sha1::digest(aes.as_bytes()).into();
        assert_eq!(mac.as_bytes(), &expected);
    }

    #[test]
    fn directions_differ() {
        let secret = BigUint::from(42u8);
        let send = derive_aes_key(Direction::Send, true, &secret).unwrap();
        let receive = derive_aes_key(Direction::Receive, true, &secret).unwrap();
        assert_ne!(send, receive);
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = derive_aes_key(Direction::Send, false, &BigUint::from(7u8)).unwrap();
        assert_eq!(format!("{key:?}"), "AesKey([redacted])");
    }
}
