use ark_ff::{BigInteger, PrimeField};

use super::{Args, BlackBoxError};
use crate::field::FieldElement;

fn checked_operands(args: &Args<'_>) -> Result<(FieldElement, FieldElement), BlackBoxError> {
    let (lhs, rhs) = (args.values[0], args.values[1]);
    for (value, bits) in [(lhs, args.num_bits[0]), (rhs, args.num_bits[1])] {
        if !value.fits_in_bits(bits) {
            return Err(BlackBoxError::InvalidInput(format!(
                "{value} does not fit in {bits} bits"
            )));
        }
    }
    Ok((lhs, rhs))
}

fn bitwise(
    lhs: FieldElement,
    rhs: FieldElement,
    op: impl Fn(u64, u64) -> u64,
) -> FieldElement {
    let a = lhs.into_repr().into_bigint();
    let b = rhs.into_repr().into_bigint();
    let mut out = a;
    for (limb, (x, y)) in out.0.iter_mut().zip(a.0.iter().zip(b.0.iter())) {
        *limb = op(*x, *y);
    }
    FieldElement::from_be_bytes_reduce(&out.to_bytes_be())
}

pub fn and(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    let (lhs, rhs) = checked_operands(args)?;
    Ok(vec![bitwise(lhs, rhs, |x, y| x & y)])
}

pub fn xor(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    let (lhs, rhs) = checked_operands(args)?;
    Ok(vec![bitwise(lhs, rhs, |x, y| x ^ y)])
}

pub fn range(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    let (value, bits) = (args.values[0], args.num_bits[0]);
    if value.fits_in_bits(bits) {
        Ok(vec![])
    } else {
        Err(BlackBoxError::ConstraintViolated(format!(
            "{value} exceeds {bits} bits"
        )))
    }
}
