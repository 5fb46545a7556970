/// Solve flow
///
/// 1. Caller
///     bytecode, initial witness -> solve
///
/// 2. Loading
///     bytecode -> decompress -> raw
///     raw -> deserialize -> Circuit
///
/// 3. Solving
///     Circuit, CapabilityTable, initial witness -> Solver
///     Solver -> passes until every opcode is resolved
///
/// 4. Caller
///     Solver -> complete witness (superset of the initial one)
use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::info;

use crate::blackbox::CapabilityTable;
use crate::bytecode;
use crate::circuit::Circuit;
use crate::decompress::decompress;
use crate::error::SolverError;
use crate::solver::Solver;
use crate::witness::WitnessMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BytecodeFormat {
    /// gzip-compressed bincode
    #[default]
    Gzip,
    /// bincode without compression
    Raw,
}

#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub format: BytecodeFormat,
    /// Worker threads for [`solve_batch`]; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub capabilities: CapabilityTable,
}

impl SolverConfig {
    pub fn with_format(mut self, format: BytecodeFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = capabilities;
        self
    }
}

pub fn load_circuit(bytecode: &[u8], format: BytecodeFormat) -> Result<Circuit, SolverError> {
    match format {
        BytecodeFormat::Gzip => bytecode::deserialize(&decompress(bytecode)?),
        BytecodeFormat::Raw => bytecode::deserialize(bytecode),
    }
}

/// Solves compressed `bytecode` from `initial_witness` with the built-in capabilities.
pub fn solve(bytecode: &[u8], initial_witness: WitnessMap) -> Result<WitnessMap, SolverError> {
    solve_with_config(bytecode, initial_witness, &SolverConfig::default())
}

pub fn solve_with_config(
    bytecode: &[u8],
    initial_witness: WitnessMap,
    config: &SolverConfig,
) -> Result<WitnessMap, SolverError> {
    let circuit = load_circuit(bytecode, config.format)?;
    let initial = initial_witness.len();
    let solution = Solver::new(&circuit, &config.capabilities, initial_witness).solve()?;
    info!(
        opcodes = circuit.opcodes.len(),
        passes = solution.passes,
        initial,
        solved = solution.witness.len() - initial,
        "circuit solved"
    );
    Ok(solution.witness)
}

/// Same as [`solve`], with witnesses in the index to hex-string form.
pub fn solve_hex(
    bytecode: &[u8],
    initial_witness: &BTreeMap<u32, String>,
) -> Result<BTreeMap<u32, String>, SolverError> {
    let witness = WitnessMap::from_hex_map(initial_witness)?;
    Ok(solve(bytecode, witness)?.to_hex_map())
}

/// Solves independent jobs in parallel. Results keep the order of `jobs`.
pub fn solve_batch(
    jobs: Vec<(Vec<u8>, WitnessMap)>,
    config: &SolverConfig,
) -> Result<Vec<Result<WitnessMap, SolverError>>, rayon::ThreadPoolBuildError> {
    let run = || {
        jobs.into_par_iter()
            .map(|(bytecode, witness)| solve_with_config(&bytecode, witness, config))
            .collect::<Vec<_>>()
    };
    match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            Ok(pool.install(run))
        }
        None => Ok(run()),
    }
}
