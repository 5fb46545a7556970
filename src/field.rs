use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use ark_bn254::Fr;
use ark_ff::{BigInt, BigInteger, Field, One, PrimeField, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of bytes in the canonical big-endian encoding.
pub const FIELD_BYTES: usize = 32;
/// Number of hex digits in the canonical text encoding.
pub const FIELD_HEX_DIGITS: usize = FIELD_BYTES * 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldParseError {
    #[error("invalid hex digit in field element `{0}`")]
    InvalidHex(String),
    #[error("field element width mismatch: expected {expected} hex digits, found {found}")]
    WidthMismatch { expected: usize, found: usize },
    #[error("field element `{0}` is not reduced modulo the field order")]
    NotCanonical(String),
}

/// An element of the BN254 scalar field, the native field of every circuit value.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldElement(Fr);

impl FieldElement {
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    pub fn one() -> Self {
        Self(Fr::one())
    }

    pub fn from_i64(x: i64) -> Self {
        let x_abs = x.unsigned_abs();
        if x < 0 {
            -Self::from(x_abs)
        } else {
            Self::from(x_abs)
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.0.is_one()
    }

    pub fn inverse(&self) -> Option<Self> {
        self.0.inverse().map(Self)
    }

    /// Position of the highest set bit plus one; zero for the additive identity.
    pub fn num_bits(&self) -> u32 {
        self.0.into_bigint().num_bits()
    }

    pub fn fits_in_bits(&self, bits: u32) -> bool {
        self.num_bits() <= bits
    }

    pub fn to_u128(&self) -> Option<u128> {
        if self.num_bits() > 128 {
            return None;
        }
        let limbs = self.0.into_bigint().0;
        Some(((limbs[1] as u128) << 64) | limbs[0] as u128)
    }

    pub fn to_be_bytes(&self) -> [u8; FIELD_BYTES] {
        let mut out = [0u8; FIELD_BYTES];
        out.copy_from_slice(&self.0.into_bigint().to_bytes_be());
        out
    }

    /// Interprets `bytes` as a big-endian integer of any length, reduced modulo the field order.
    pub fn from_be_bytes_reduce(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    /// Strict decoding of a 32-byte big-endian value; `None` unless it is already reduced.
    pub fn from_be_bytes_canonical(bytes: &[u8; FIELD_BYTES]) -> Option<Self> {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let end = FIELD_BYTES - i * 8;
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[end - 8..end]);
            *limb = u64::from_be_bytes(word);
        }
        Fr::from_bigint(BigInt::new(limbs)).map(Self)
    }

    /// Fixed-width lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// Parses exactly 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, FieldParseError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != FIELD_HEX_DIGITS {
            return Err(FieldParseError::WidthMismatch {
                expected: FIELD_HEX_DIGITS,
                found: digits.len(),
            });
        }
        let mut bytes = [0u8; FIELD_BYTES];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| FieldParseError::InvalidHex(s.to_string()))?;
        Self::from_be_bytes_canonical(&bytes)
            .ok_or_else(|| FieldParseError::NotCanonical(s.to_string()))
    }

    pub(crate) fn from_repr(inner: Fr) -> Self {
        Self(inner)
    }

    pub(crate) fn into_repr(self) -> Fr {
        self.0
    }
}

impl From<u128> for FieldElement {
    fn from(x: u128) -> Self {
        Self(Fr::from(x))
    }
}

impl From<u64> for FieldElement {
    fn from(x: u64) -> Self {
        Self(Fr::from(x))
    }
}

impl From<u32> for FieldElement {
    fn from(x: u32) -> Self {
        Self(Fr::from(x))
    }
}

impl From<bool> for FieldElement {
    fn from(x: bool) -> Self {
        if x {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for FieldElement {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// Circuits carry constants as fixed-width hex strings.
impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
