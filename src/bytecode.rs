//! Bincode codec for circuit bytecode.
//!
//! Layout: fixed-width little-endian integers, `u32` enum tags, `u64` sequence
//! lengths, field elements as 64-digit hex strings. Black-box calls are driven
//! by a per-function slot table so decoding and encoding share one definition.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bincode::Options;
use serde::de::{self, EnumAccess, SeqAccess, VariantAccess, Visitor};
use serde::ser::{SerializeSeq, SerializeTupleVariant};
use serde_derive::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit::{
    BlackBoxCall, BlackBoxFunc, Circuit, Expression, ExpressionWidth, FunctionInput, Opcode,
    Operand, UnsupportedKind, UnsupportedOpcode, Witness,
};
use crate::error::SolverError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
struct WireProgram {
    functions: Vec<WireCircuit>,
    unconstrained_functions: NoUnconstrained,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
struct WireCircuit {
    current_witness_index: u32,
    opcodes: Vec<WireOpcode>,
    expression_width: ExpressionWidth,
    private_parameters: BTreeSet<Witness>,
    public_parameters: BTreeSet<Witness>,
    return_values: BTreeSet<Witness>,
    assert_messages: Vec<(OpcodeLocation, AssertionPayload)>,
    recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) enum WireOpcode {
    AssertZero(Expression),
    BlackBoxFuncCall(BlackBoxCall),
    Directive(Directive),
    MemoryOp {
        block_id: BlockId,
        op: MemOp,
        predicate: Option<Expression>,
    },
    MemoryInit {
        block_id: BlockId,
        init: Vec<Witness>,
        block_type: BlockType,
    },
    BrilligCall {
        id: u32,
        inputs: Vec<BrilligInputs>,
        outputs: Vec<BrilligOutputs>,
        predicate: Option<Expression>,
    },
    Call {
        id: u32,
        inputs: Vec<Witness>,
        outputs: Vec<Witness>,
        predicate: Option<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct BlockId(u32);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) enum Directive {
    ToLeRadix {
        a: Expression,
        b: Vec<Witness>,
        radix: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct MemOp {
    operation: Expression,
    index: Expression,
    value: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) enum BlockType {
    Memory,
    CallData,
    ReturnData,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) enum BrilligInputs {
    Single(Expression),
    Array(Vec<Expression>),
    MemoryArray(BlockId),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) enum BrilligOutputs {
    Simple(Witness),
    Array(Vec<Witness>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
enum OpcodeLocation {
    Acir(usize),
    Brillig { acir_index: usize, brillig_index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
enum AssertionPayload {
    StaticString(String),
    Dynamic(u64, Vec<ExpressionOrMemory>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
enum ExpressionOrMemory {
    Expression(Expression),
    Memory(BlockId),
}

/// Unconstrained (Brillig) functions are not decoded; only an empty list is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NoUnconstrained;

impl serde::Serialize for NoUnconstrained {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_seq(Some(0))?.end()
    }
}

impl<'de> serde::Deserialize<'de> for NoUnconstrained {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EmptySeq;

        impl<'de> Visitor<'de> for EmptySeq {
            type Value = NoUnconstrained;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an empty list of unconstrained functions")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
                match seq.size_hint() {
                    Some(0) => Ok(NoUnconstrained),
                    _ => Err(de::Error::custom(
                        "unconstrained functions are not supported",
                    )),
                }
            }
        }

        deserializer.deserialize_seq(EmptySeq)
    }
}

/// One serialized field of a black-box call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Input,
    InputArray(usize),
    InputVec,
    Output,
    OutputArray(usize),
    OutputVec,
    Param,
    Bytes,
}

impl Slot {
    fn elements(self) -> usize {
        match self {
            Slot::InputArray(n) | Slot::OutputArray(n) => n,
            _ => 1,
        }
    }
}

fn layout(func: BlackBoxFunc) -> &'static [Slot] {
    use Slot::*;
    match func {
        BlackBoxFunc::Aes128Encrypt => &[InputVec, InputArray(16), InputArray(16), OutputVec],
        BlackBoxFunc::And | BlackBoxFunc::Xor => &[Input, Input, Output],
        BlackBoxFunc::Range => &[Input],
        BlackBoxFunc::Sha256 | BlackBoxFunc::Blake2s | BlackBoxFunc::Blake3 => {
            &[InputVec, OutputArray(32)]
        }
        BlackBoxFunc::SchnorrVerify => &[Input, Input, InputArray(64), InputVec, Output],
        BlackBoxFunc::PedersenCommitment => &[InputVec, Param, OutputArray(2)],
        BlackBoxFunc::PedersenHash => &[InputVec, Param, Output],
        BlackBoxFunc::EcdsaSecp256k1 | BlackBoxFunc::EcdsaSecp256r1 => &[
            InputArray(32),
            InputArray(32),
            InputArray(64),
            InputArray(32),
            Output,
        ],
        BlackBoxFunc::MultiScalarMul => &[InputVec, InputVec, OutputArray(3)],
        BlackBoxFunc::EmbeddedCurveAdd => &[InputArray(3), InputArray(3), OutputArray(3)],
        BlackBoxFunc::Keccak256 => &[InputVec, Input, OutputArray(32)],
        BlackBoxFunc::Keccakf1600 => &[InputArray(25), OutputArray(25)],
        BlackBoxFunc::RecursiveAggregation => &[InputVec, InputVec, InputVec, Input],
        BlackBoxFunc::BigIntAdd
        | BlackBoxFunc::BigIntSub
        | BlackBoxFunc::BigIntMul
        | BlackBoxFunc::BigIntDiv => &[Param, Param, Param],
        BlackBoxFunc::BigIntFromLeBytes => &[InputVec, Bytes, Param],
        BlackBoxFunc::BigIntToLeBytes => &[Param, OutputVec],
        BlackBoxFunc::Poseidon2Permutation => &[InputVec, OutputVec, Param],
        BlackBoxFunc::Sha256Compression => &[InputArray(16), InputArray(8), OutputArray(8)],
    }
}

const BLACK_BOX_VARIANTS: &[&str] = &[
    "AES128Encrypt",
    "AND",
    "XOR",
    "RANGE",
    "SHA256",
    "Blake2s",
    "Blake3",
    "SchnorrVerify",
    "PedersenCommitment",
    "PedersenHash",
    "EcdsaSecp256k1",
    "EcdsaSecp256r1",
    "MultiScalarMul",
    "EmbeddedCurveAdd",
    "Keccak256",
    "Keccakf1600",
    "RecursiveAggregation",
    "BigIntAdd",
    "BigIntSub",
    "BigIntMul",
    "BigIntDiv",
    "BigIntFromLeBytes",
    "BigIntToLeBytes",
    "Poseidon2Permutation",
    "Sha256Compression",
];

impl serde::Serialize for BlackBoxCall {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;

        let slots = layout(self.func);
        if slots.len() != self.operands.len() {
            return Err(S::Error::custom(format!(
                "{} expects {} operands, found {}",
                self.func,
                slots.len(),
                self.operands.len()
            )));
        }
        let len = slots.iter().map(|slot| slot.elements()).sum();
        let mut state = serializer.serialize_tuple_variant(
            "BlackBoxFuncCall",
            self.func.tag(),
            BLACK_BOX_VARIANTS[self.func.tag() as usize],
            len,
        )?;
        for (slot, operand) in slots.iter().zip(&self.operands) {
            match (slot, operand) {
                (Slot::Input, Operand::Inputs(inputs)) if inputs.len() == 1 => {
                    state.serialize_field(&inputs[0])?
                }
                (Slot::InputArray(n), Operand::Inputs(inputs)) if inputs.len() == *n => {
                    for input in inputs {
                        state.serialize_field(input)?;
                    }
                }
                (Slot::InputVec, Operand::Inputs(inputs)) => state.serialize_field(inputs)?,
                (Slot::Output, Operand::Outputs(outputs)) if outputs.len() == 1 => {
                    state.serialize_field(&outputs[0])?
                }
                (Slot::OutputArray(n), Operand::Outputs(outputs)) if outputs.len() == *n => {
                    for output in outputs {
                        state.serialize_field(output)?;
                    }
                }
                (Slot::OutputVec, Operand::Outputs(outputs)) => state.serialize_field(outputs)?,
                (Slot::Param, Operand::Param(param)) => state.serialize_field(param)?,
                (Slot::Bytes, Operand::Bytes(bytes)) => state.serialize_field(bytes)?,
                (slot, operand) => {
                    return Err(S::Error::custom(format!(
                        "{}: operand {operand:?} does not fit slot {slot:?}",
                        self.func
                    )))
                }
            }
        }
        state.end()
    }
}

impl<'de> serde::Deserialize<'de> for BlackBoxCall {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_enum("BlackBoxFuncCall", BLACK_BOX_VARIANTS, CallVisitor)
    }
}

struct CallVisitor;

impl<'de> Visitor<'de> for CallVisitor {
    type Value = BlackBoxCall;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a black box function call")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Self::Value, A::Error> {
        let (tag, variant): (u32, _) = data.variant()?;
        let func = BlackBoxFunc::from_tag(tag).ok_or_else(|| {
            <A::Error as de::Error>::custom(format!("unknown black box function tag {tag}"))
        })?;
        let slots = layout(func);
        let len = slots.iter().map(|slot| slot.elements()).sum();
        variant.tuple_variant(len, OperandsVisitor { func, slots })
    }
}

struct OperandsVisitor {
    func: BlackBoxFunc,
    slots: &'static [Slot],
}

impl OperandsVisitor {
    fn next<'de, T, A>(&self, seq: &mut A, read: &mut usize) -> Result<T, A::Error>
    where
        T: serde::Deserialize<'de>,
        A: SeqAccess<'de>,
    {
        let value = seq
            .next_element()?
            .ok_or_else(|| <A::Error as de::Error>::invalid_length(*read, self))?;
        *read += 1;
        Ok(value)
    }
}

impl<'de> Visitor<'de> for OperandsVisitor {
    type Value = BlackBoxCall;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "operands of {}", self.func)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut read = 0;
        let mut operands = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            let operand = match *slot {
                Slot::Input => Operand::Inputs(vec![self.next(&mut seq, &mut read)?]),
                Slot::InputArray(n) => Operand::Inputs(
                    (0..n)
                        .map(|_| self.next::<FunctionInput, _>(&mut seq, &mut read))
                        .collect::<Result<_, _>>()?,
                ),
                Slot::InputVec => Operand::Inputs(self.next(&mut seq, &mut read)?),
                Slot::Output => Operand::Outputs(vec![self.next(&mut seq, &mut read)?]),
                Slot::OutputArray(n) => Operand::Outputs(
                    (0..n)
                        .map(|_| self.next::<Witness, _>(&mut seq, &mut read))
                        .collect::<Result<_, _>>()?,
                ),
                Slot::OutputVec => Operand::Outputs(self.next(&mut seq, &mut read)?),
                Slot::Param => Operand::Param(self.next(&mut seq, &mut read)?),
                Slot::Bytes => Operand::Bytes(self.next(&mut seq, &mut read)?),
            };
            operands.push(operand);
        }
        Ok(BlackBoxCall::new(self.func, operands))
    }
}

fn options() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

/// Decodes raw (already decompressed) bytecode into its entry circuit.
pub fn deserialize(raw: &[u8]) -> Result<Circuit, SolverError> {
    let program: WireProgram = options()
        .deserialize(raw)
        .map_err(|e| SolverError::MalformedCircuit(e.to_string()))?;
    let mut functions = program.functions.into_iter();
    let main = functions
        .next()
        .ok_or_else(|| SolverError::MalformedCircuit("program has no functions".to_string()))?;
    if functions.len() > 0 {
        debug!(
            skipped = functions.len(),
            "only the entry function is solved"
        );
    }
    Ok(main.into())
}

/// Encodes a circuit as a single-function program.
pub fn serialize(circuit: &Circuit) -> Result<Vec<u8>, SolverError> {
    let program = WireProgram {
        functions: vec![WireCircuit::from(circuit)],
        unconstrained_functions: NoUnconstrained,
    };
    options()
        .serialize(&program)
        .map_err(|e| SolverError::MalformedCircuit(e.to_string()))
}

fn unsupported(kind: UnsupportedKind, witnesses: BTreeSet<Witness>, wire: WireOpcode) -> Opcode {
    Opcode::Unsupported(UnsupportedOpcode {
        kind,
        witnesses,
        wire: Box::new(wire),
    })
}

fn predicate_witnesses(predicate: &Option<Expression>) -> BTreeSet<Witness> {
    predicate
        .as_ref()
        .map(Expression::witnesses)
        .unwrap_or_default()
}

impl From<WireOpcode> for Opcode {
    fn from(wire: WireOpcode) -> Self {
        match wire {
            WireOpcode::AssertZero(expr) => Opcode::Arithmetic(expr),
            WireOpcode::BlackBoxFuncCall(call) => Opcode::BlackBoxCall(call),
            WireOpcode::Directive(Directive::ToLeRadix { ref a, ref b, .. }) => {
                let mut witnesses = a.witnesses();
                witnesses.extend(b.iter().copied());
                unsupported(UnsupportedKind::Directive, witnesses, wire)
            }
            WireOpcode::MemoryOp {
                ref op,
                ref predicate,
                ..
            } => {
                let mut witnesses = predicate_witnesses(predicate);
                witnesses.extend(op.operation.witnesses());
                witnesses.extend(op.index.witnesses());
                witnesses.extend(op.value.witnesses());
                unsupported(UnsupportedKind::MemoryOp, witnesses, wire)
            }
            WireOpcode::MemoryInit { ref init, .. } => {
                let witnesses = init.iter().copied().collect();
                unsupported(UnsupportedKind::MemoryInit, witnesses, wire)
            }
            WireOpcode::BrilligCall {
                ref inputs,
                ref outputs,
                ref predicate,
                ..
            } => {
                let mut witnesses = predicate_witnesses(predicate);
                for input in inputs {
                    match input {
                        BrilligInputs::Single(expr) => witnesses.extend(expr.witnesses()),
                        BrilligInputs::Array(exprs) => {
                            exprs.iter().for_each(|e| witnesses.extend(e.witnesses()))
                        }
                        BrilligInputs::MemoryArray(_) => {}
                    }
                }
                for output in outputs {
                    match output {
                        BrilligOutputs::Simple(w) => {
                            witnesses.insert(*w);
                        }
                        BrilligOutputs::Array(ws) => witnesses.extend(ws.iter().copied()),
                    }
                }
                unsupported(UnsupportedKind::BrilligCall, witnesses, wire)
            }
            WireOpcode::Call {
                ref inputs,
                ref outputs,
                ref predicate,
                ..
            } => {
                let mut witnesses = predicate_witnesses(predicate);
                witnesses.extend(inputs.iter().chain(outputs).copied());
                unsupported(UnsupportedKind::Call, witnesses, wire)
            }
        }
    }
}

impl From<&Opcode> for WireOpcode {
    fn from(opcode: &Opcode) -> Self {
        match opcode {
            Opcode::Arithmetic(expr) => WireOpcode::AssertZero(expr.clone()),
            Opcode::BlackBoxCall(call) => WireOpcode::BlackBoxFuncCall(call.clone()),
            Opcode::Unsupported(op) => (*op.wire).clone(),
        }
    }
}

impl From<WireCircuit> for Circuit {
    fn from(wire: WireCircuit) -> Self {
        let assert_messages: BTreeMap<usize, String> = wire
            .assert_messages
            .into_iter()
            .filter_map(|(location, payload)| match (location, payload) {
                (OpcodeLocation::Acir(index), AssertionPayload::StaticString(message)) => {
                    Some((index, message))
                }
                _ => None,
            })
            .collect();
        Circuit {
            current_witness_index: wire.current_witness_index,
            opcodes: wire.opcodes.into_iter().map(Opcode::from).collect(),
            expression_width: wire.expression_width,
            private_parameters: wire.private_parameters,
            public_parameters: wire.public_parameters,
            return_values: wire.return_values,
            assert_messages,
            recursive: wire.recursive,
        }
    }
}

impl From<&Circuit> for WireCircuit {
    fn from(circuit: &Circuit) -> Self {
        WireCircuit {
            current_witness_index: circuit.current_witness_index,
            opcodes: circuit.opcodes.iter().map(WireOpcode::from).collect(),
            expression_width: circuit.expression_width,
            private_parameters: circuit.private_parameters.clone(),
            public_parameters: circuit.public_parameters.clone(),
            return_values: circuit.return_values.clone(),
            assert_messages: circuit
                .assert_messages
                .iter()
                .map(|(index, message)| {
                    (
                        OpcodeLocation::Acir(*index),
                        AssertionPayload::StaticString(message.clone()),
                    )
                })
                .collect(),
            recursive: circuit.recursive,
        }
    }
}
