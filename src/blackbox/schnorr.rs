//! Schnorr signatures over Grumpkin with a Pedersen/Blake2s challenge.
//!
//! Signature bytes are `s ‖ e`, both big-endian. A signature verifies iff
//! `blake2s(pedersen(R.x, P.x, P.y) ‖ message) == e` where `R = s·G + e·P`.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{PrimeField, Zero};
use ark_grumpkin::Fr;

use super::grumpkin;
use super::hash::blake2s_digest;
use super::pedersen;
use super::{to_bytes, Args, Arity, BlackBoxError};
use crate::field::FieldElement;

pub const SIGNATURE_BYTES: usize = 64;
/// Public key coordinates plus signature bytes; the message follows.
pub const FIXED_INPUTS: usize = 2 + SIGNATURE_BYTES;

/// Verifies `signature` over `message` for the public key `(x, y)`.
///
/// Malformed keys and degenerate signatures verify as `false`.
pub fn verify_signature(
    x: FieldElement,
    y: FieldElement,
    signature: &[u8; SIGNATURE_BYTES],
    message: &[u8],
) -> Result<bool, BlackBoxError> {
    let Ok(public_key) = grumpkin::point(x, y, false) else {
        return Ok(false);
    };
    let s = Fr::from_be_bytes_mod_order(&signature[..32]);
    let e = Fr::from_be_bytes_mod_order(&signature[32..]);
    if s.is_zero() || e.is_zero() {
        return Ok(false);
    }

    let r = (grumpkin::generator() * s + public_key * e).into_affine();
    let Some(r_x) = r.x() else {
        return Ok(false);
    };
    let commitment =
        pedersen::hash_inputs(&[grumpkin::from_base(r_x), x, y], 0)?.to_be_bytes();

    let mut preimage = Vec::with_capacity(32 + message.len());
    preimage.extend_from_slice(&commitment);
    preimage.extend_from_slice(message);
    Ok(blake2s_digest(&preimage)[..] == signature[32..])
}

pub fn verify(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    if args.values.len() < FIXED_INPUTS {
        return Err(BlackBoxError::InputArity {
            expected: Arity::AtLeast(FIXED_INPUTS),
            found: args.values.len(),
        });
    }
    let (key, rest) = args.values.split_at(2);
    let (signature, message) = rest.split_at(SIGNATURE_BYTES);
    let mut sig = [0u8; SIGNATURE_BYTES];
    sig.copy_from_slice(&to_bytes(signature)?);
    let message = to_bytes(message)?;
    let valid = verify_signature(key[0], key[1], &sig, &message)?;
    Ok(vec![FieldElement::from(valid)])
}
