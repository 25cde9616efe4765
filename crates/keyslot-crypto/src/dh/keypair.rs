//! Ephemeral key pair generation and agreement

use std::{fmt, sync::Arc};

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use super::{
    error::DhError,
    group::{GroupParameters, PublicValue},
};

/// Private exponent x, held as big-endian bytes so it can be wiped on drop.
struct PrivateExponent(Zeroizing<Vec<u8>>);

impl PrivateExponent {
    fn from_value(x: &BigUint) -> Self {
        Self(Zeroizing::new(x.to_bytes_be()))
    }

    fn value(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

/// An ephemeral DH key pair: private exponent x and y = g^x mod p.
///
/// The private exponent is not exposed; it is only used by
/// [`agree`](Self::agree).
pub struct DhKeyPair {
    private: PrivateExponent,
    public: PublicValue,
}

impl DhKeyPair {
    /// Generate a fresh key pair.
    ///
    /// If the group fixes a private value length `l`, x is a random `l`-bit
    /// integer with its top bit set. Otherwise x is uniform over [2, q - 2].
    /// Exponents whose public value falls outside [2, p - 2] (x a multiple of
    /// the generator's order, or half of it) are discarded and redrawn.
    ///
    /// # Errors
    ///
    /// - `RandomSourceFailure` if `rng` cannot supply bytes
    pub fn generate<R>(group: Arc<GroupParameters>, rng: &mut R) -> Result<Self, DhError>
    where
        R: RngCore + CryptoRng,
    {
        loop {
            let x = sample_private(&group, rng)?;
            let y = group.generator().modpow(&x, group.modulus());
            if group.accepts_public(&y) {
                let public = PublicValue::new(group, y)?;
                return Ok(Self { private: PrivateExponent::from_value(&x), public });
            }
        }
    }

    /// Rebuild a key pair from a known private exponent.
    ///
    /// Used for fixtures and for restoring persisted state.
    ///
    /// # Errors
    ///
    /// - `InvalidPrivateExponent` if `x` is outside the group's exponent range
    /// - `InvalidPublicValue` if g^x mod p falls outside [2, p - 2]
    pub fn from_private(group: Arc<GroupParameters>, x: &BigUint) -> Result<Self, DhError> {
        if !exponent_in_range(&group, x) {
            return Err(DhError::InvalidPrivateExponent);
        }
        let y = group.generator().modpow(x, group.modulus());
        let public = PublicValue::new(group, y)?;

        Ok(Self { private: PrivateExponent::from_value(x), public })
    }

    /// Public half of the pair.
    pub fn public(&self) -> &PublicValue {
        &self.public
    }

    /// Group this pair was generated in.
    pub fn group(&self) -> &Arc<GroupParameters> {
        self.public.group()
    }

    /// Compute the shared secret s = remote^x mod p.
    ///
    /// # Errors
    ///
    /// - `CryptoBackend` if `remote` belongs to a different group
    pub fn agree(&self, remote: &PublicValue) -> Result<BigUint, DhError> {
        let ours = self.group();
        if !Arc::ptr_eq(ours, remote.group()) && **ours != **remote.group() {
            return Err(DhError::CryptoBackend {
                reason: "remote public value belongs to a different group".to_owned(),
            });
        }

        let x = self.private.value();
        Ok(remote.value().modpow(&x, ours.modulus()))
    }
}

impl fmt::Debug for DhKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhKeyPair")
            .field("private", &"[redacted]")
            .field("public", self.public.value())
            .finish()
    }
}

fn exponent_in_range(group: &GroupParameters, x: &BigUint) -> bool {
    match group.private_value_bits() {
        Some(bits) => x.bits() == bits,
        None => *x >= BigUint::from(2u8) && *x <= group.subgroup_order() - 2u8,
    }
}

fn sample_private<R>(group: &GroupParameters, rng: &mut R) -> Result<BigUint, DhError>
where
    R: RngCore + CryptoRng,
{
    if let Some(bits) = group.private_value_bits() {
        let x = random_bits(rng, bits)?;
        return Ok(x | (BigUint::from(1u8) << (bits - 1)));
    }

    // Rejection sampling over [2, q - 2]
    let upper = group.subgroup_order() - 2u8;
    let bits = upper.bits();
    loop {
        let candidate = random_bits(rng, bits)?;
        if exponent_in_range(group, &candidate) {
            return Ok(candidate);
        }
    }
}

/// Uniform integer in [0, 2^bits).
fn random_bits<R>(rng: &mut R, bits: u64) -> Result<BigUint, DhError>
where
    R: RngCore + CryptoRng,
{
    let len = bits.div_ceil(8) as usize;
    let mut buf = Zeroizing::new(vec![0u8; len]);
    rng.try_fill_bytes(&mut buf)
        .map_err(|e| DhError::RandomSourceFailure { reason: e.to_string() })?;

    let excess = len * 8 - bits as usize;
    if let Some(top) = buf.first_mut() {
        *top &= 0xFF >> excess;
    }
    Ok(BigUint::from_bytes_be(&buf))
}
