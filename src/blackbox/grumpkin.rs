//! Grumpkin, the curve embedded in the BN254 scalar field (`y² = x³ − 17`).
//!
//! Its base field is the circuit field, so points can be carried as pairs of
//! witnesses. Generators are derived deterministically from a domain string.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, Field, PrimeField};
use ark_grumpkin::{Affine, Fq, Fr, Projective};

use super::BlackBoxError;
use crate::field::FieldElement;

pub const DEFAULT_DOMAIN: &[u8] = b"DEFAULT_DOMAIN_SEPARATOR";

pub fn generator() -> Affine {
    Affine::generator()
}

pub fn to_base(value: FieldElement) -> Fq {
    Fq::from_be_bytes_mod_order(&value.to_be_bytes())
}

pub fn from_base(value: Fq) -> FieldElement {
    FieldElement::from_be_bytes_reduce(&value.into_bigint().to_bytes_be())
}

/// Reads a base-field value as a scalar, reducing modulo the group order.
pub fn to_scalar(value: FieldElement) -> Fr {
    Fr::from_be_bytes_mod_order(&value.to_be_bytes())
}

/// Builds a point from its coordinates, checking it lies on the curve.
pub fn point(x: FieldElement, y: FieldElement, is_infinite: bool) -> Result<Affine, BlackBoxError> {
    if is_infinite {
        return Ok(Affine::identity());
    }
    let p = Affine::new_unchecked(to_base(x), to_base(y));
    if p.is_on_curve() {
        Ok(p)
    } else {
        Err(BlackBoxError::InvalidInput(format!("({x}, {y}) is not on the curve")))
    }
}

/// `(x, y, is_infinite)` with the identity encoded as `(0, 0, 1)`.
pub fn coordinates(p: Affine) -> [FieldElement; 3] {
    match p.xy() {
        Some((x, y)) => [from_base(x), from_base(y), FieldElement::zero()],
        None => [FieldElement::zero(), FieldElement::zero(), FieldElement::one()],
    }
}

/// Try-and-increment hash to a curve point.
///
/// `x` is the 512-bit big-endian value `blake3(seed ‖ i ‖ 0) ‖ blake3(seed ‖ i ‖ 1)`
/// reduced into the base field; the sign of `y` follows the top bit of the first digest.
pub fn hash_to_curve(seed: &[u8]) -> Option<Affine> {
    let mut buffer = seed.to_vec();
    buffer.extend_from_slice(&[0, 0]);
    let n = buffer.len();
    for attempt in 0..=u8::MAX {
        buffer[n - 2] = attempt;
        buffer[n - 1] = 0;
        let hi = blake3::hash(&buffer);
        buffer[n - 1] = 1;
        let lo = blake3::hash(&buffer);

        let mut wide = [0u8; 64];
        wide[..32].copy_from_slice(hi.as_bytes());
        wide[32..].copy_from_slice(lo.as_bytes());
        let x = Fq::from_be_bytes_mod_order(&wide);
        let rhs = x.square() * x - Fq::from(17u64);
        if let Some(mut y) = rhs.sqrt() {
            let odd = hi.as_bytes()[0] > 127;
            if y.into_bigint().is_odd() != odd {
                y = -y;
            }
            return Some(Affine::new_unchecked(x, y));
        }
    }
    None
}

/// Generators `start .. start + count` for `domain`.
pub fn derive_generators(
    domain: &[u8],
    count: usize,
    start: u32,
) -> Result<Vec<Affine>, BlackBoxError> {
    let domain_hash = blake3::hash(domain);
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(domain_hash.as_bytes());
    (0..count)
        .map(|i| {
            let index = u32::try_from(i)
                .ok()
                .and_then(|i| start.checked_add(i))
                .ok_or_else(|| {
                    BlackBoxError::InvalidInput("generator index overflow".to_string())
                })?;
            preimage[32..36].copy_from_slice(&index.to_be_bytes());
            hash_to_curve(&preimage).ok_or_else(|| {
                BlackBoxError::InvalidInput(format!("no curve point for generator {index}"))
            })
        })
        .collect()
}

/// `Σ scalars[i] · points[i]`.
pub fn msm(points: &[Affine], scalars: &[Fr]) -> Affine {
    points
        .iter()
        .zip(scalars)
        .fold(Projective::default(), |acc, (p, s)| acc + *p * s)
        .into_affine()
}
