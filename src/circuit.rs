use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::bytecode::WireOpcode;
use crate::field::FieldElement;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub struct Witness(pub u32);

impl Witness {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Witness {
    fn from(index: u32) -> Self {
        Witness(index)
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

// Σ q·a·b + Σ c·w + q_c = 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Expression {
    pub mul_terms: Vec<(FieldElement, Witness, Witness)>,
    pub linear_combinations: Vec<(FieldElement, Witness)>,
    pub q_c: FieldElement,
}

impl Expression {
    pub fn constant(q_c: FieldElement) -> Self {
        Expression {
            q_c,
            ..Default::default()
        }
    }

    pub fn linear(terms: Vec<(FieldElement, Witness)>, q_c: FieldElement) -> Self {
        Expression {
            mul_terms: vec![],
            linear_combinations: terms,
            q_c,
        }
    }

    pub fn witnesses(&self) -> BTreeSet<Witness> {
        let mut witnesses = BTreeSet::new();
        for (_, a, b) in &self.mul_terms {
            witnesses.insert(*a);
            witnesses.insert(*b);
        }
        for (_, w) in &self.linear_combinations {
            witnesses.insert(*w);
        }
        witnesses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ConstantOrWitness {
    Constant(FieldElement),
    Witness(Witness),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FunctionInput {
    pub input: ConstantOrWitness,
    pub num_bits: u32,
}

impl FunctionInput {
    pub fn witness(witness: Witness, num_bits: u32) -> Self {
        FunctionInput {
            input: ConstantOrWitness::Witness(witness),
            num_bits,
        }
    }

    pub fn constant(value: FieldElement, num_bits: u32) -> Self {
        FunctionInput {
            input: ConstantOrWitness::Constant(value),
            num_bits,
        }
    }

    pub fn as_witness(&self) -> Option<Witness> {
        match self.input {
            ConstantOrWitness::Witness(w) => Some(w),
            ConstantOrWitness::Constant(_) => None,
        }
    }
}

/// Black-box functions known to the bytecode format, in wire tag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlackBoxFunc {
    Aes128Encrypt,
    And,
    Xor,
    Range,
    Sha256,
    Blake2s,
    Blake3,
    SchnorrVerify,
    PedersenCommitment,
    PedersenHash,
    EcdsaSecp256k1,
    EcdsaSecp256r1,
    MultiScalarMul,
    EmbeddedCurveAdd,
    Keccak256,
    Keccakf1600,
    RecursiveAggregation,
    BigIntAdd,
    BigIntSub,
    BigIntMul,
    BigIntDiv,
    BigIntFromLeBytes,
    BigIntToLeBytes,
    Poseidon2Permutation,
    Sha256Compression,
}

impl BlackBoxFunc {
    pub const ALL: [BlackBoxFunc; 25] = [
        BlackBoxFunc::Aes128Encrypt,
        BlackBoxFunc::And,
        BlackBoxFunc::Xor,
        BlackBoxFunc::Range,
        BlackBoxFunc::Sha256,
        BlackBoxFunc::Blake2s,
        BlackBoxFunc::Blake3,
        BlackBoxFunc::SchnorrVerify,
        BlackBoxFunc::PedersenCommitment,
        BlackBoxFunc::PedersenHash,
        BlackBoxFunc::EcdsaSecp256k1,
        BlackBoxFunc::EcdsaSecp256r1,
        BlackBoxFunc::MultiScalarMul,
        BlackBoxFunc::EmbeddedCurveAdd,
        BlackBoxFunc::Keccak256,
        BlackBoxFunc::Keccakf1600,
        BlackBoxFunc::RecursiveAggregation,
        BlackBoxFunc::BigIntAdd,
        BlackBoxFunc::BigIntSub,
        BlackBoxFunc::BigIntMul,
        BlackBoxFunc::BigIntDiv,
        BlackBoxFunc::BigIntFromLeBytes,
        BlackBoxFunc::BigIntToLeBytes,
        BlackBoxFunc::Poseidon2Permutation,
        BlackBoxFunc::Sha256Compression,
    ];

    pub fn tag(self) -> u32 {
        self as u32
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            BlackBoxFunc::Aes128Encrypt => "aes128_encrypt",
            BlackBoxFunc::And => "and",
            BlackBoxFunc::Xor => "xor",
            BlackBoxFunc::Range => "range",
            BlackBoxFunc::Sha256 => "sha256",
            BlackBoxFunc::Blake2s => "blake2s",
            BlackBoxFunc::Blake3 => "blake3",
            BlackBoxFunc::SchnorrVerify => "schnorr_verify",
            BlackBoxFunc::PedersenCommitment => "pedersen_commitment",
            BlackBoxFunc::PedersenHash => "pedersen_hash",
            BlackBoxFunc::EcdsaSecp256k1 => "ecdsa_secp256k1",
            BlackBoxFunc::EcdsaSecp256r1 => "ecdsa_secp256r1",
            BlackBoxFunc::MultiScalarMul => "multi_scalar_mul",
            BlackBoxFunc::EmbeddedCurveAdd => "embedded_curve_add",
            BlackBoxFunc::Keccak256 => "keccak256",
            BlackBoxFunc::Keccakf1600 => "keccakf1600",
            BlackBoxFunc::RecursiveAggregation => "recursive_aggregation",
            BlackBoxFunc::BigIntAdd => "bigint_add",
            BlackBoxFunc::BigIntSub => "bigint_sub",
            BlackBoxFunc::BigIntMul => "bigint_mul",
            BlackBoxFunc::BigIntDiv => "bigint_div",
            BlackBoxFunc::BigIntFromLeBytes => "bigint_from_le_bytes",
            BlackBoxFunc::BigIntToLeBytes => "bigint_to_le_bytes",
            BlackBoxFunc::Poseidon2Permutation => "poseidon2_permutation",
            BlackBoxFunc::Sha256Compression => "sha256_compression",
        }
    }
}

impl fmt::Display for BlackBoxFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One field of a black-box call, in the order the function declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Inputs(Vec<FunctionInput>),
    Outputs(Vec<Witness>),
    Param(u32),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackBoxCall {
    pub func: BlackBoxFunc,
    pub operands: Vec<Operand>,
}

impl BlackBoxCall {
    pub fn new(func: BlackBoxFunc, operands: Vec<Operand>) -> Self {
        BlackBoxCall { func, operands }
    }

    /// All inputs flattened in declaration order.
    pub fn inputs(&self) -> Vec<FunctionInput> {
        self.operands
            .iter()
            .flat_map(|operand| match operand {
                Operand::Inputs(inputs) => inputs.clone(),
                _ => vec![],
            })
            .collect()
    }

    pub fn outputs(&self) -> Vec<Witness> {
        self.operands
            .iter()
            .flat_map(|operand| match operand {
                Operand::Outputs(outputs) => outputs.clone(),
                _ => vec![],
            })
            .collect()
    }

    pub fn params(&self) -> Vec<u32> {
        self.operands
            .iter()
            .filter_map(|operand| match operand {
                Operand::Param(param) => Some(*param),
                _ => None,
            })
            .collect()
    }

    pub fn witnesses(&self) -> BTreeSet<Witness> {
        let mut witnesses: BTreeSet<Witness> = self
            .inputs()
            .iter()
            .filter_map(FunctionInput::as_witness)
            .collect();
        witnesses.extend(self.outputs());
        witnesses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedKind {
    Directive,
    MemoryOp,
    MemoryInit,
    BrilligCall,
    Call,
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnsupportedKind::Directive => "directive",
            UnsupportedKind::MemoryOp => "memory_op",
            UnsupportedKind::MemoryInit => "memory_init",
            UnsupportedKind::BrilligCall => "brillig_call",
            UnsupportedKind::Call => "call",
        };
        f.write_str(name)
    }
}

/// An opcode this solver does not evaluate. It keeps the witnesses it touches so
/// the driver can tell whether it is already satisfied by other opcodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedOpcode {
    pub kind: UnsupportedKind,
    pub witnesses: BTreeSet<Witness>,
    pub(crate) wire: Box<WireOpcode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opcode {
    Arithmetic(Expression),
    BlackBoxCall(BlackBoxCall),
    Unsupported(UnsupportedOpcode),
}

impl Opcode {
    pub fn witnesses(&self) -> BTreeSet<Witness> {
        match self {
            Opcode::Arithmetic(expr) => expr.witnesses(),
            Opcode::BlackBoxCall(call) => call.witnesses(),
            Opcode::Unsupported(op) => op.witnesses.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ExpressionWidth {
    #[default]
    Unbounded,
    Bounded {
        width: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Circuit {
    pub current_witness_index: u32,
    pub opcodes: Vec<Opcode>,
    pub expression_width: ExpressionWidth,
    pub private_parameters: BTreeSet<Witness>,
    pub public_parameters: BTreeSet<Witness>,
    pub return_values: BTreeSet<Witness>,
    /// Static assertion messages keyed by opcode index.
    pub assert_messages: BTreeMap<usize, String>,
    pub recursive: bool,
}

impl Circuit {
    pub fn input_witnesses(&self) -> BTreeSet<Witness> {
        self.private_parameters
            .union(&self.public_parameters)
            .copied()
            .collect()
    }

    pub fn referenced_witnesses(&self) -> BTreeSet<Witness> {
        let mut witnesses = self.input_witnesses();
        witnesses.extend(self.return_values.iter().copied());
        for opcode in &self.opcodes {
            witnesses.extend(opcode.witnesses());
        }
        witnesses
    }
}
