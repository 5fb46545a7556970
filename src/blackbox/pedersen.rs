use std::sync::OnceLock;

use ark_ec::{AffineRepr, CurveGroup};
use ark_grumpkin::{Affine, Fr};

use super::grumpkin::{self, DEFAULT_DOMAIN};
use super::{Args, BlackBoxError};
use crate::field::FieldElement;

const LENGTH_DOMAIN: &[u8] = b"pedersen_hash_length";

fn length_generator() -> Result<Affine, BlackBoxError> {
    static GENERATOR: OnceLock<Option<Affine>> = OnceLock::new();
    let generator = *GENERATOR.get_or_init(|| {
        grumpkin::derive_generators(LENGTH_DOMAIN, 1, 0)
            .ok()
            .and_then(|generators| generators.first().copied())
    });
    generator.ok_or_else(|| BlackBoxError::InvalidInput("no length generator".to_string()))
}

/// `Σ inputs[i] · G[start + i]` over the default generators.
pub fn commit(inputs: &[FieldElement], start: u32) -> Result<Affine, BlackBoxError> {
    let generators = grumpkin::derive_generators(DEFAULT_DOMAIN, inputs.len(), start)?;
    let scalars: Vec<Fr> = inputs.iter().map(|v| grumpkin::to_scalar(*v)).collect();
    Ok(grumpkin::msm(&generators, &scalars))
}

/// x-coordinate of `len · H + commit(inputs)`.
pub fn hash_inputs(inputs: &[FieldElement], start: u32) -> Result<FieldElement, BlackBoxError> {
    let length = length_generator()? * Fr::from(inputs.len() as u64);
    let point = (length + commit(inputs, start)?).into_affine();
    Ok(point
        .x()
        .map(grumpkin::from_base)
        .unwrap_or_else(FieldElement::zero))
}

fn domain_separator(args: &Args<'_>) -> Result<u32, BlackBoxError> {
    args.params
        .first()
        .copied()
        .ok_or_else(|| BlackBoxError::InvalidInput("missing domain separator".to_string()))
}

pub fn commitment(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    let point = commit(args.values, domain_separator(args)?)?;
    let [x, y, _] = grumpkin::coordinates(point);
    Ok(vec![x, y])
}

pub fn hash(args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    Ok(vec![hash_inputs(args.values, domain_separator(args)?)?])
}
