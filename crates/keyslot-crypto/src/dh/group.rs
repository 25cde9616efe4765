//! DH group parameters and validated public values

use std::sync::Arc;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use super::error::DhError;
use crate::codec::{big_int_from_unsigned_bytes, hex_decode};

/// 1536-bit MODP prime from RFC 3526, section 2.
pub const RFC3526_MODP1536_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA237327FFFFFFFFFFFFFFFF",
);

/// Generator used with the RFC 3526 group.
pub const RFC3526_GENERATOR: u32 = 2;

/// Private exponent length used with the RFC 3526 group.
pub const DEFAULT_PRIVATE_VALUE_BITS: u64 = 320;

/// Serializable description of a DH group.
///
/// Hex fields accept either case. When `subgroup_order_hex` is absent the
/// modulus is taken to be a safe prime and q = (p - 1) / 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Prime modulus p, hex encoded
    pub modulus_hex: String,
    /// Generator g
    pub generator: u32,
    /// Subgroup order q, hex encoded
    #[serde(default)]
    pub subgroup_order_hex: Option<String>,
    /// Fixed private exponent length in bits
    #[serde(default)]
    pub private_value_bits: Option<u64>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            modulus_hex: RFC3526_MODP1536_HEX.to_owned(),
            generator: RFC3526_GENERATOR,
            subgroup_order_hex: None,
            private_value_bits: Some(DEFAULT_PRIVATE_VALUE_BITS),
        }
    }
}

/// Immutable DH group: modulus p, generator g, subgroup order q.
///
/// # Invariants
///
/// - p > 3
/// - 2 <= g <= p - 2
/// - q >= 4, so [2, q - 2] is non-empty
/// - If set, 2 <= `private_value_bits` <= bits(p)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParameters {
    modulus: BigUint,
    generator: BigUint,
    subgroup_order: BigUint,
    private_value_bits: Option<u64>,
}

impl GroupParameters {
    /// Validate and build group parameters.
    pub fn new(
        modulus: BigUint,
        generator: BigUint,
        subgroup_order: BigUint,
        private_value_bits: Option<u64>,
    ) -> Result<Self, DhError> {
        if modulus <= BigUint::from(3u8) {
            return Err(DhError::InvalidGroup { reason: "modulus must be greater than 3" });
        }
        if generator < BigUint::from(2u8) || generator > &modulus - 2u8 {
            return Err(DhError::InvalidGroup { reason: "generator must lie in [2, p - 2]" });
        }
        if subgroup_order < BigUint::from(4u8) {
            return Err(DhError::InvalidGroup { reason: "subgroup order must be at least 4" });
        }
        if let Some(bits) = private_value_bits
            && (bits < 2 || bits > modulus.bits())
        {
            return Err(DhError::InvalidGroup {
                reason: "private value length must lie in [2, bits(p)]",
            });
        }

        Ok(Self { modulus, generator, subgroup_order, private_value_bits })
    }

    /// Build parameters from a [`GroupConfig`].
    pub fn from_config(config: &GroupConfig) -> Result<Self, DhError> {
        let modulus = big_int_from_unsigned_bytes(&hex_decode(&config.modulus_hex)?);
        let subgroup_order = match &config.subgroup_order_hex {
            Some(q) => big_int_from_unsigned_bytes(&hex_decode(q)?),
            None if modulus > BigUint::from(3u8) => (&modulus - 1u8) >> 1u8,
            None => BigUint::default(),
        };

        Self::new(
            modulus,
            BigUint::from(config.generator),
            subgroup_order,
            config.private_value_bits,
        )
    }

    /// The 1536-bit MODP group of RFC 3526 with 320-bit private exponents.
    pub fn rfc3526_modp1536() -> Self {
        let Ok(group) = Self::from_config(&GroupConfig::default()) else {
            unreachable!("RFC 3526 parameters are valid");
        };
        group
    }

    /// Prime modulus p.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Generator g.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Subgroup order q.
    pub fn subgroup_order(&self) -> &BigUint {
        &self.subgroup_order
    }

    /// Fixed private exponent length, if the group mandates one.
    pub fn private_value_bits(&self) -> Option<u64> {
        self.private_value_bits
    }

    /// Whether `value` is an acceptable public value, i.e. 2 <= y <= p - 2.
    pub fn accepts_public(&self, value: &BigUint) -> bool {
        *value >= BigUint::from(2u8) && *value <= &self.modulus - 2u8
    }
}

/// A DH public value checked against its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicValue {
    group: Arc<GroupParameters>,
    value: BigUint,
}

impl PublicValue {
    /// Wrap `value`, rejecting anything outside [2, p - 2].
    ///
    /// # Errors
    ///
    /// - `InvalidPublicValue` for 0, 1, p - 1 and anything >= p
    pub fn new(group: Arc<GroupParameters>, value: BigUint) -> Result<Self, DhError> {
        if !group.accepts_public(&value) {
            return Err(DhError::InvalidPublicValue);
        }
        Ok(Self { group, value })
    }

    /// The integer y.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Group this value belongs to.
    pub fn group(&self) -> &Arc<GroupParameters> {
        &self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_group() -> Arc<GroupParameters> {
        // p = 23 is a safe prime, q = 11
        Arc::new(
            GroupParameters::new(BigUint::from(23u8), BigUint::from(5u8), BigUint::from(11u8), None)
                .unwrap(),
        )
    }

    #[test]
    fn rfc3526_group_shape() {
        let group = GroupParameters::rfc3526_modp1536();
        assert_eq!(group.modulus().bits(), 1536);
        assert_eq!(group.generator(), &BigUint::from(2u8));
        assert_eq!(group.private_value_bits(), Some(320));
        assert_eq!(group.subgroup_order() * 2u8 + 1u8, *group.modulus());
    }

    #[test]
    fn rejects_tiny_modulus() {
        let result =
            GroupParameters::new(BigUint::from(3u8), BigUint::from(2u8), BigUint::from(4u8), None);
        assert!(matches!(result, Err(DhError::InvalidGroup { .. })));
    }

    #[test]
    fn rejects_generator_out_of_range() {
        for g in [1u8, 22] {
            let result = GroupParameters::new(
                BigUint::from(23u8),
                BigUint::from(g),
                BigUint::from(11u8),
                None,
            );
            assert!(matches!(result, Err(DhError::InvalidGroup { .. })), "g = {g}");
        }
    }

    #[test]
    fn rejects_private_length_longer_than_modulus() {
        let result = GroupParameters::new(
            BigUint::from(23u8),
            BigUint::from(5u8),
            BigUint::from(11u8),
            Some(6),
        );
        assert!(matches!(result, Err(DhError::InvalidGroup { .. })));
    }

    #[test]
    fn config_defaults_subgroup_order() {
        let config = GroupConfig {
            modulus_hex: "17".to_owned(),
            generator: 5,
            subgroup_order_hex: None,
            private_value_bits: None,
        };
        let group = GroupParameters::from_config(&config).unwrap();
        assert_eq!(group.subgroup_order(), &BigUint::from(11u8));
    }

    #[test]
    fn config_rejects_bad_hex() {
        let config = GroupConfig { modulus_hex: "XYZ".to_owned(), ..GroupConfig::default() };
        assert!(matches!(GroupParameters::from_config(&config), Err(DhError::Codec(_))));
    }

    #[test]
    fn public_value_range() {
        let group = small_group();
        for bad in [0u8, 1, 22, 23, 200] {
            let result = PublicValue::new(Arc::clone(&group), BigUint::from(bad));
            assert_eq!(result, Err(DhError::InvalidPublicValue), "{bad} must be rejected");
        }
        for good in [2u8, 10, 21] {
            assert!(PublicValue::new(Arc::clone(&group), BigUint::from(good)).is_ok());
        }
    }
}
