pub mod api;
pub mod arithmetic;
pub mod blackbox;
pub mod bytecode;
pub mod circuit;
pub mod decompress;
pub mod error;
pub mod field;
pub mod loader;
pub mod solver;
pub mod witness;

// bytecode, initial witness -> complete witness
//
// 1. decompress
// gzip(bincode(Program)) -> bincode(Program)
//
// 2. deserialize
// bincode(Program) -> Circuit (first function)
//
// 3. solve
// Circuit, WitnessMap -> passes over opcodes in declaration order
//   Arithmetic   -> reduce, assign the single unknown
//   BlackBoxCall -> CapabilityTable::dispatch, assign outputs
//   Unsupported  -> resolved once every witness it touches is known
//
// 4. result
// WitnessMap (superset of the initial one) | SolverError

pub use api::{solve, solve_batch, solve_hex, solve_with_config, BytecodeFormat, SolverConfig};
pub use blackbox::CapabilityTable;
pub use circuit::{Circuit, Witness};
pub use error::SolverError;
pub use field::FieldElement;
pub use witness::WitnessMap;
