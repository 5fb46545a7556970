//! Native implementations of black-box functions.
//!
//! A [`CapabilityTable`] maps each supported [`BlackBoxFunc`] to a pure function
//! over field elements. The dispatcher resolves a call's inputs against the
//! witness map, checks arities and hands the values to the capability.

use std::collections::BTreeMap;
use std::fmt;

use crate::circuit::{BlackBoxCall, BlackBoxFunc, ConstantOrWitness, Witness};
use crate::field::FieldElement;
use crate::witness::WitnessMap;

pub mod embedded_curve;
pub mod grumpkin;
pub mod hash;
pub mod logic;
pub mod pedersen;
pub mod schnorr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn admits(self, n: usize) -> bool {
        match self {
            Arity::Exact(m) => n == m,
            Arity::AtLeast(m) => n >= m,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlackBoxError {
    #[error("no capability registered for `{0}`")]
    Unsupported(BlackBoxFunc),
    #[error("expected {expected} inputs, found {found}")]
    InputArity { expected: Arity, found: usize },
    #[error("expected {expected} outputs, found {found}")]
    OutputArity { expected: Arity, found: usize },
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    ConstraintViolated(String),
}

/// Resolved operands handed to a capability.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    pub values: &'a [FieldElement],
    pub num_bits: &'a [u32],
    pub params: &'a [u32],
}

pub type CapabilityFn = fn(&Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError>;

#[derive(Debug, Clone, Copy)]
pub struct Capability {
    pub func: BlackBoxFunc,
    pub inputs: Arity,
    pub outputs: Arity,
    pub run: CapabilityFn,
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Some input witness is not assigned yet.
    Pending,
    /// Output values paired with the witnesses they belong to.
    Solved(Vec<(Witness, FieldElement)>),
}

#[derive(Debug, Clone)]
pub struct CapabilityTable {
    entries: BTreeMap<BlackBoxFunc, Capability>,
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CapabilityTable {
    pub fn empty() -> Self {
        CapabilityTable {
            entries: BTreeMap::new(),
        }
    }

    /// Every built-in capability.
    pub fn standard() -> Self {
        use Arity::*;
        use BlackBoxFunc as F;

        let builtins: [(BlackBoxFunc, Arity, Arity, CapabilityFn); 13] = [
            (F::And, Exact(2), Exact(1), logic::and),
            (F::Xor, Exact(2), Exact(1), logic::xor),
            (F::Range, Exact(1), Exact(0), logic::range),
            (F::Sha256, AtLeast(0), Exact(32), hash::sha256),
            (F::Blake2s, AtLeast(0), Exact(32), hash::blake2s),
            (F::Blake3, AtLeast(0), Exact(32), hash::blake3),
            (F::Keccak256, AtLeast(1), Exact(32), hash::keccak256),
            (F::SchnorrVerify, AtLeast(schnorr::FIXED_INPUTS), Exact(1), schnorr::verify),
            (F::PedersenCommitment, AtLeast(0), Exact(2), pedersen::commitment),
            (F::PedersenHash, AtLeast(0), Exact(1), pedersen::hash),
            (F::EmbeddedCurveAdd, Exact(6), Exact(3), embedded_curve::add),
            (F::MultiScalarMul, AtLeast(0), Exact(3), embedded_curve::multi_scalar_mul),
            (F::RecursiveAggregation, AtLeast(1), Exact(0), recursive_aggregation),
        ];
        let mut table = Self::empty();
        for (func, inputs, outputs, run) in builtins {
            table.register(Capability {
                func,
                inputs,
                outputs,
                run,
            });
        }
        table
    }

    /// Adds or replaces the capability for `capability.func`.
    pub fn register(&mut self, capability: Capability) -> Option<Capability> {
        self.entries.insert(capability.func, capability)
    }

    pub fn remove(&mut self, func: BlackBoxFunc) -> Option<Capability> {
        self.entries.remove(&func)
    }

    pub fn lookup(&self, func: BlackBoxFunc) -> Option<&Capability> {
        self.entries.get(&func)
    }

    /// Runs `call` if every input is known.
    ///
    /// Capability lookup comes first so a missing capability is reported even
    /// while inputs are still unresolved.
    pub fn dispatch(
        &self,
        call: &BlackBoxCall,
        witnesses: &WitnessMap,
    ) -> Result<Dispatch, BlackBoxError> {
        let capability = self
            .lookup(call.func)
            .ok_or(BlackBoxError::Unsupported(call.func))?;

        let inputs = call.inputs();
        let mut values = Vec::with_capacity(inputs.len());
        for input in &inputs {
            match input.input {
                ConstantOrWitness::Constant(value) => values.push(value),
                ConstantOrWitness::Witness(w) => match witnesses.get(w) {
                    Some(value) => values.push(value),
                    None => return Ok(Dispatch::Pending),
                },
            }
        }

        let outputs = call.outputs();
        if !capability.inputs.admits(values.len()) {
            return Err(BlackBoxError::InputArity {
                expected: capability.inputs,
                found: values.len(),
            });
        }
        if !capability.outputs.admits(outputs.len()) {
            return Err(BlackBoxError::OutputArity {
                expected: capability.outputs,
                found: outputs.len(),
            });
        }

        let num_bits: Vec<u32> = inputs.iter().map(|input| input.num_bits).collect();
        let params = call.params();
        let results = (capability.run)(&Args {
            values: &values,
            num_bits: &num_bits,
            params: &params,
        })?;
        if results.len() != outputs.len() {
            return Err(BlackBoxError::OutputArity {
                expected: Arity::Exact(results.len()),
                found: outputs.len(),
            });
        }
        Ok(Dispatch::Solved(outputs.into_iter().zip(results).collect()))
    }
}

// Proof verification belongs to the proving backend; solving only needs the inputs assigned.
fn recursive_aggregation(_args: &Args<'_>) -> Result<Vec<FieldElement>, BlackBoxError> {
    Ok(vec![])
}

/// Narrows byte-typed inputs, rejecting anything above 255.
pub(crate) fn to_bytes(values: &[FieldElement]) -> Result<Vec<u8>, BlackBoxError> {
    values
        .iter()
        .map(|value| match value.to_u128() {
            Some(byte) if byte <= u8::MAX as u128 => Ok(byte as u8),
            _ => Err(BlackBoxError::InvalidInput(format!("{value} is not a byte"))),
        })
        .collect()
}

pub(crate) fn from_bytes(bytes: &[u8]) -> Vec<FieldElement> {
    bytes.iter().map(|b| FieldElement::from(*b as u64)).collect()
}
