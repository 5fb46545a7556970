use ark_ec::CurveGroup;
use ark_grumpkin::{Affine, Fr};

use super::grumpkin;
use super::{Args, Arity, BlackBoxError};
use crate::field::FieldElement;

fn flag(value: FieldElement) -> Result<bool, BlackBoxError> {
    if value.is_zero() {
        Ok(false)
    } else if value.is_one() {
        Ok(true)
    } else {
        Err(BlackBoxError::InvalidInput(format!(
            "infinity flag {value} is not boolean"
        )))
    }
}

fn read_point(triple: &[FieldElement]) -> Result<Affine, BlackBoxError> {
    grumpkin::point(triple[0], triple[1], flag(triple[2])?)
}

/// Joins `(lo, hi)` 128-bit limbs into a scalar.
fn read_scalar(lo: FieldElement, hi: FieldElement) -> Result<Fr, BlackBoxError> {
    for (limb, name) in [(lo, "low"), (hi, "high")] {
        if !limb.fits_in_bits(128) {
            return Err(BlackBoxError::InvalidInput(format!(
                "{name} scalar limb {limb} is not below 2^128"
            )));
        }
    }
    let shift = Fr::from(u128::MAX) + Fr::from(1u64);
    Ok(grumpkin::to_scalar(lo) + grumpkin::to_scalar(hi) * shift)
}

pub fn add(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    if args.values.len() != 6 {
        return Err(BlackBoxError::InputArity {
            expected: Arity::Exact(6),
            found: args.values.len(),
        });
    }
    let lhs = read_point(&args.values[0..3])?;
    let rhs = read_point(&args.values[3..6])?;
    Ok(grumpkin::coordinates((lhs + rhs).into_affine()).to_vec())
}

/// Points `(x, y, is_infinite)` followed by as many `(lo, hi)` scalars.
pub fn multi_scalar_mul(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    if args.values.len() % 5 != 0 {
        return Err(BlackBoxError::InvalidInput(format!(
            "{} inputs do not split into points and scalars",
            args.values.len()
        )));
    }
    let count = args.values.len() / 5;
    let (points, scalars) = args.values.split_at(3 * count);
    let points = points
        .chunks(3)
        .map(read_point)
        .collect::<Result<Vec<_>, _>>()?;
    let scalars = scalars
        .chunks(2)
        .map(|limbs| read_scalar(limbs[0], limbs[1]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(grumpkin::coordinates(grumpkin::msm(&points, &scalars)).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackbox::grumpkin::tests::fe_hex;

    fn call(
        f: fn(&Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError>,
        values: &[FieldElement],
    ) -> Result<Vec<FieldElement>, BlackBoxError> {
        let num_bits = vec![254; values.len()];
        f(&Args {
            values,
            num_bits: &num_bits,
            params: &[],
        })
    }

    fn g() -> [FieldElement; 3] {
        grumpkin::coordinates(grumpkin::generator())
    }

    #[test]
    fn test_add() {
        let values: Vec<_> = g().into_iter().chain(g()).collect();
        assert_eq!(
            call(add, &values).unwrap(),
            vec![
                fe_hex("06ce1b0827aafa85ddeb49cdaa36306d19a74caa311e13d46d8bc688cdbffffe"),
                fe_hex("1c122f81a3a14964909ede0ba2a6855fc93faf6fa1a788bf467be7e7a43f80ac"),
                FieldElement::zero(),
            ]
        );
    }

    #[test]
    fn test_add_identity_and_inverse() {
        let infinity = [FieldElement::zero(), FieldElement::zero(), FieldElement::one()];
        let values: Vec<_> = g().into_iter().chain(infinity).collect();
        assert_eq!(call(add, &values).unwrap(), g().to_vec());

        let [x, y, _] = g();
        let values = [x, y, FieldElement::zero(), x, -y, FieldElement::zero()];
        assert_eq!(call(add, &values).unwrap(), infinity.to_vec());
    }

    #[test]
    fn test_add_rejects_off_curve() {
        let mut values: Vec<_> = g().into_iter().chain(g()).collect();
        values[4] += FieldElement::one();
        assert!(matches!(call(add, &values), Err(BlackBoxError::InvalidInput(_))));
        values = g().into_iter().chain(g()).collect();
        values[5] = FieldElement::from(2u64);
        assert!(call(add, &values).is_err());
    }

    #[test]
    fn test_multi_scalar_mul() {
        let five_g = grumpkin::coordinates(
            (grumpkin::generator() * Fr::from(5u64)).into_affine(),
        );
        let mut values: Vec<FieldElement> = g().into_iter().chain(five_g).collect();
        // (2^130 + 12345)·G + 3·5G
        values.extend([
            FieldElement::from(12345u64),
            FieldElement::from(4u64),
            FieldElement::from(3u64),
            FieldElement::zero(),
        ]);
        assert_eq!(
            call(multi_scalar_mul, &values).unwrap(),
            vec![
                fe_hex("0b3063de61bb1dfab95e62af4f068d08d9fcdb6536563a269c4e775af96cf93c"),
                fe_hex("1c90dee93dbe427e92cab633deda1dd01d1b890c0b23568c57e37016c607d259"),
                FieldElement::zero(),
            ]
        );
    }

    #[test]
    fn test_multi_scalar_mul_limb_bounds() {
        let mut values: Vec<FieldElement> = g().to_vec();
        values.extend([FieldElement::from(u128::MAX) + FieldElement::one(), FieldElement::zero()]);
        assert!(matches!(
            call(multi_scalar_mul, &values),
            Err(BlackBoxError::InvalidInput(_))
        ));
        assert!(call(multi_scalar_mul, &values[..4]).is_err());
        assert_eq!(
            call(multi_scalar_mul, &[]).unwrap(),
            vec![FieldElement::zero(), FieldElement::zero(), FieldElement::one()]
        );
    }
}
