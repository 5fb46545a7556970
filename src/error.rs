use crate::circuit::{UnsupportedKind, Witness};
use crate::field::FieldElement;

/// Every way a solve invocation can fail. Each variant is deterministic in the
/// (bytecode, witness) pair, so retrying with the same inputs reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("malformed circuit: {0}")]
    MalformedCircuit(String),
    #[error("conflicting assignment for witness {witness}: resolved to {existing}, attempted {attempted}")]
    ConflictingAssignment {
        witness: Witness,
        existing: FieldElement,
        attempted: FieldElement,
    },
    #[error(
        "unsatisfied constraint at opcode {opcode_index}{}",
        .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    UnsatisfiedConstraint {
        opcode_index: usize,
        message: Option<String>,
    },
    #[error("unsupported black box function `{name}` at opcode {opcode_index}")]
    UnsupportedFunction {
        opcode_index: usize,
        name: &'static str,
    },
    #[error("unsupported {kind} opcode at index {opcode_index} has unresolved witnesses")]
    UnsupportedOpcode {
        opcode_index: usize,
        kind: UnsupportedKind,
    },
    #[error("black box function `{name}` failed at opcode {opcode_index}: {reason}")]
    BlackBoxFailed {
        opcode_index: usize,
        name: &'static str,
        reason: String,
    },
    #[error(
        "solver stuck with {} unresolved opcode(s) and {} missing witness(es)",
        .unresolved_opcodes.len(),
        .missing_witnesses.len()
    )]
    Stuck {
        unresolved_opcodes: Vec<usize>,
        missing_witnesses: Vec<Witness>,
    },
}
