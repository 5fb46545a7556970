//! Fixpoint solver over a circuit's opcodes.
//!
//! Each pass walks the opcodes in declaration order and attempts every one
//! that is not yet resolved. Solving stops when all opcodes are resolved, or
//! fails when a pass makes no progress. Every productive pass resolves at
//! least one opcode, so a circuit with `n` opcodes finishes within `n` passes.

use tracing::{debug, trace, warn};

use crate::arithmetic::{reduce, Reduction};
use crate::blackbox::{BlackBoxError, CapabilityTable, Dispatch};
use crate::circuit::{BlackBoxCall, Circuit, Opcode};
use crate::error::SolverError;
use crate::witness::WitnessMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeStatus {
    /// Not attempted yet.
    Pending,
    Resolved,
    /// Attempted without enough known inputs.
    Stuck,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub witness: WitnessMap,
    pub passes: usize,
}

pub struct Solver<'a> {
    circuit: &'a Circuit,
    capabilities: &'a CapabilityTable,
    witnesses: WitnessMap,
    status: Vec<OpcodeStatus>,
}

impl<'a> Solver<'a> {
    pub fn new(
        circuit: &'a Circuit,
        capabilities: &'a CapabilityTable,
        initial_witness: WitnessMap,
    ) -> Self {
        Solver {
            circuit,
            capabilities,
            witnesses: initial_witness,
            status: vec![OpcodeStatus::Pending; circuit.opcodes.len()],
        }
    }

    pub fn status(&self) -> &[OpcodeStatus] {
        &self.status
    }

    pub fn witnesses(&self) -> &WitnessMap {
        &self.witnesses
    }

    fn unresolved(&self) -> Vec<usize> {
        self.status
            .iter()
            .enumerate()
            .filter(|(_, status)| **status != OpcodeStatus::Resolved)
            .map(|(index, _)| index)
            .collect()
    }

    /// Runs one full pass and returns how many opcodes it resolved.
    pub fn pass(&mut self) -> Result<usize, SolverError> {
        let circuit = self.circuit;
        let mut resolved = 0;
        for (index, opcode) in circuit.opcodes.iter().enumerate() {
            if self.status[index] == OpcodeStatus::Resolved {
                continue;
            }
            if self.attempt(index, opcode)? {
                trace!(opcode = index, "resolved");
                self.status[index] = OpcodeStatus::Resolved;
                resolved += 1;
            } else {
                self.status[index] = OpcodeStatus::Stuck;
            }
        }
        Ok(resolved)
    }

    fn attempt(&mut self, index: usize, opcode: &Opcode) -> Result<bool, SolverError> {
        match opcode {
            Opcode::Arithmetic(expr) => match reduce(expr, &self.witnesses) {
                Reduction::Satisfied => Ok(true),
                Reduction::Violated(residual) => {
                    debug!(opcode = index, %residual, "arithmetic constraint violated");
                    Err(SolverError::UnsatisfiedConstraint {
                        opcode_index: index,
                        message: self.circuit.assert_messages.get(&index).cloned(),
                    })
                }
                Reduction::Solvable(witness, value) => {
                    self.witnesses.set(witness, value)?;
                    Ok(true)
                }
                Reduction::Underdetermined => Ok(false),
            },
            Opcode::BlackBoxCall(call) => self.attempt_black_box(index, call),
            Opcode::Unsupported(op) => Ok(op.witnesses.iter().all(|w| self.witnesses.contains(*w))),
        }
    }

    fn attempt_black_box(
        &mut self,
        index: usize,
        call: &BlackBoxCall,
    ) -> Result<bool, SolverError> {
        let name = call.func.name();
        match self.capabilities.dispatch(call, &self.witnesses) {
            Ok(Dispatch::Pending) => Ok(false),
            Ok(Dispatch::Solved(outputs)) => {
                for (witness, value) in outputs {
                    self.witnesses.set(witness, value)?;
                }
                Ok(true)
            }
            Err(BlackBoxError::Unsupported(_)) => Err(SolverError::UnsupportedFunction {
                opcode_index: index,
                name,
            }),
            Err(BlackBoxError::ConstraintViolated(reason)) => {
                Err(SolverError::UnsatisfiedConstraint {
                    opcode_index: index,
                    message: Some(
                        self.circuit
                            .assert_messages
                            .get(&index)
                            .cloned()
                            .unwrap_or(reason),
                    ),
                })
            }
            Err(e) => Err(SolverError::BlackBoxFailed {
                opcode_index: index,
                name,
                reason: e.to_string(),
            }),
        }
    }

    fn stalled(&self) -> SolverError {
        let unresolved = self.unresolved();
        warn!(
            unresolved = unresolved.len(),
            first = ?unresolved.first(),
            "solver made no progress"
        );
        if let Some(&first) = unresolved.first() {
            if let Opcode::Unsupported(op) = &self.circuit.opcodes[first] {
                return SolverError::UnsupportedOpcode {
                    opcode_index: first,
                    kind: op.kind,
                };
            }
        }
        SolverError::Stuck {
            unresolved_opcodes: unresolved,
            missing_witnesses: self.witnesses.missing(self.circuit).into_iter().collect(),
        }
    }

    pub fn solve(mut self) -> Result<Solution, SolverError> {
        let total = self.status.len();
        let mut passes = 0;
        let mut remaining = total;
        while remaining > 0 {
            passes += 1;
            let resolved = self.pass()?;
            remaining -= resolved;
            debug!(pass = passes, resolved, remaining, "pass finished");
            if resolved == 0 {
                return Err(self.stalled());
            }
        }

        let missing = self.witnesses.missing(self.circuit);
        if !missing.is_empty() {
            warn!(missing = missing.len(), "opcodes resolved but witnesses remain unassigned");
            return Err(SolverError::Stuck {
                unresolved_opcodes: vec![],
                missing_witnesses: missing.into_iter().collect(),
            });
        }
        Ok(Solution {
            witness: self.witnesses,
            passes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode;
    use crate::circuit::{
        BlackBoxFunc, Expression, FunctionInput, Operand, UnsupportedKind, Witness,
    };
    use crate::field::FieldElement;

    fn fe(x: i64) -> FieldElement {
        FieldElement::from_i64(x)
    }

    fn w(index: u32) -> Witness {
        Witness(index)
    }

    // a - b = 0
    fn copy(a: u32, b: u32) -> Opcode {
        Opcode::Arithmetic(Expression::linear(vec![(fe(1), w(a)), (fe(-1), w(b))], fe(0)))
    }

    fn run(circuit: &Circuit, initial: &[(u32, i64)]) -> Result<Solution, SolverError> {
        let table = CapabilityTable::standard();
        let witness = initial.iter().map(|(i, v)| (w(*i), fe(*v))).collect();
        Solver::new(circuit, &table, witness).solve()
    }

    #[test]
    fn test_forward_references_take_extra_passes() {
        // w4 = w3, w3 = w2, w2 = w1: reversed chain needs one pass per link
        let circuit = Circuit {
            opcodes: vec![copy(4, 3), copy(3, 2), copy(2, 1)],
            private_parameters: [w(1)].into(),
            ..Default::default()
        };
        let solution = run(&circuit, &[(1, 9)]).unwrap();
        assert_eq!(solution.passes, 3);
        for i in 1..=4 {
            assert_eq!(solution.witness.get(w(i)), Some(fe(9)));
        }
    }

    #[test]
    fn test_in_order_chain_takes_one_pass() {
        let circuit = Circuit {
            opcodes: vec![copy(2, 1), copy(3, 2), copy(4, 3)],
            ..Default::default()
        };
        let solution = run(&circuit, &[(1, 5)]).unwrap();
        assert_eq!(solution.passes, 1);
        assert_eq!(solution.witness.len(), 4);
    }

    #[test]
    fn test_empty_circuit() {
        let solution = run(&Circuit::default(), &[(1, 1)]).unwrap();
        assert_eq!(solution.passes, 0);
        assert_eq!(solution.witness.len(), 1);
    }

    #[test]
    fn test_stuck() {
        let circuit = Circuit {
            opcodes: vec![
                copy(1, 2),
                Opcode::Arithmetic(Expression::linear(
                    vec![(fe(1), w(3)), (fe(1), w(4))],
                    fe(0),
                )),
            ],
            ..Default::default()
        };
        assert_eq!(
            run(&circuit, &[(1, 1)]),
            Err(SolverError::Stuck {
                unresolved_opcodes: vec![1],
                missing_witnesses: vec![w(3), w(4)],
            })
        );
    }

    #[test]
    fn test_vanishing_coefficient_is_stuck() {
        // w1 - w1 + 5 = 0
        let cancelling = Circuit {
            opcodes: vec![Opcode::Arithmetic(Expression::linear(
                vec![(fe(1), w(1)), (fe(-1), w(1))],
                fe(5),
            ))],
            ..Default::default()
        };
        assert_eq!(
            run(&cancelling, &[]),
            Err(SolverError::Stuck {
                unresolved_opcodes: vec![0],
                missing_witnesses: vec![w(1)],
            })
        );

        // w1·w2 + 5 = 0 with w1 = 0
        let zero_factor = Circuit {
            opcodes: vec![Opcode::Arithmetic(Expression {
                mul_terms: vec![(fe(1), w(1), w(2))],
                linear_combinations: vec![],
                q_c: fe(5),
            })],
            ..Default::default()
        };
        assert_eq!(
            run(&zero_factor, &[(1, 0)]),
            Err(SolverError::Stuck {
                unresolved_opcodes: vec![0],
                missing_witnesses: vec![w(2)],
            })
        );
    }

    #[test]
    fn test_unsatisfied_carries_message() {
        let mut circuit = Circuit {
            opcodes: vec![copy(2, 1), copy(1, 3)],
            ..Default::default()
        };
        circuit.assert_messages.insert(1, "values differ".to_string());
        assert_eq!(
            run(&circuit, &[(1, 1), (3, 2)]),
            Err(SolverError::UnsatisfiedConstraint {
                opcode_index: 1,
                message: Some("values differ".to_string()),
            })
        );
    }

    #[test]
    fn test_conflicting_assignment() {
        // w2 = w1 and w2 = w3 with w1 != w3
        let circuit = Circuit {
            opcodes: vec![copy(2, 1), copy(2, 3)],
            ..Default::default()
        };
        assert!(matches!(
            run(&circuit, &[(1, 1), (3, 2)]),
            Err(SolverError::UnsatisfiedConstraint { opcode_index: 1, .. })
        ));

        let xor = Opcode::BlackBoxCall(BlackBoxCall::new(
            BlackBoxFunc::Xor,
            vec![
                Operand::Inputs(vec![FunctionInput::witness(w(1), 8)]),
                Operand::Inputs(vec![FunctionInput::witness(w(1), 8)]),
                Operand::Outputs(vec![w(2)]),
            ],
        ));
        let circuit = Circuit {
            opcodes: vec![xor],
            ..Default::default()
        };
        assert_eq!(
            run(&circuit, &[(1, 3), (2, 1)]),
            Err(SolverError::ConflictingAssignment {
                witness: w(2),
                existing: fe(1),
                attempted: fe(0),
            })
        );
    }

    #[test]
    fn test_unsupported_function_is_fatal_before_inputs() {
        let call = BlackBoxCall::new(
            BlackBoxFunc::Poseidon2Permutation,
            vec![
                Operand::Inputs(vec![FunctionInput::witness(w(5), 254)]),
                Operand::Outputs(vec![w(6)]),
                Operand::Param(1),
            ],
        );
        let circuit = Circuit {
            opcodes: vec![copy(1, 2), Opcode::BlackBoxCall(call)],
            ..Default::default()
        };
        assert_eq!(
            run(&circuit, &[(2, 1)]),
            Err(SolverError::UnsupportedFunction {
                opcode_index: 1,
                name: "poseidon2_permutation",
            })
        );
    }

    #[test]
    fn test_range_violation() {
        let call = BlackBoxCall::new(
            BlackBoxFunc::Range,
            vec![Operand::Inputs(vec![FunctionInput::witness(w(1), 4)])],
        );
        let circuit = Circuit {
            opcodes: vec![Opcode::BlackBoxCall(call)],
            ..Default::default()
        };
        assert!(run(&circuit, &[(1, 15)]).is_ok());
        assert!(matches!(
            run(&circuit, &[(1, 16)]),
            Err(SolverError::UnsatisfiedConstraint { opcode_index: 0, message: Some(_) })
        ));
    }

    #[test]
    fn test_black_box_failure_reported() {
        let call = BlackBoxCall::new(
            BlackBoxFunc::Sha256,
            vec![
                Operand::Inputs(vec![FunctionInput::witness(w(1), 8)]),
                Operand::Outputs((10..42).map(Witness).collect()),
            ],
        );
        let circuit = Circuit {
            opcodes: vec![Opcode::BlackBoxCall(call)],
            ..Default::default()
        };
        assert!(matches!(
            run(&circuit, &[(1, 300)]),
            Err(SolverError::BlackBoxFailed { opcode_index: 0, name: "sha256", .. })
        ));
        assert_eq!(run(&circuit, &[(1, 0x61)]).unwrap().witness.len(), 33);
    }

    fn directive_circuit(extra: Vec<Opcode>) -> Circuit {
        let mut opcodes = vec![bytecode::tests::directive(w(1), &[w(2), w(3)])];
        opcodes.extend(extra);
        Circuit {
            opcodes,
            ..Default::default()
        }
    }

    #[test]
    fn test_unsupported_opcode_stall() {
        let circuit = directive_circuit(vec![]);
        assert_eq!(
            run(&circuit, &[(1, 6)]),
            Err(SolverError::UnsupportedOpcode {
                opcode_index: 0,
                kind: UnsupportedKind::Directive,
            })
        );
    }

    #[test]
    fn test_unsupported_opcode_satisfied_elsewhere() {
        // the directive's outputs are pinned by later arithmetic gates
        let circuit = directive_circuit(vec![copy(2, 1), copy(3, 1)]);
        let solution = run(&circuit, &[(1, 6)]).unwrap();
        assert_eq!(solution.passes, 2);
        assert_eq!(solution.witness.get(w(3)), Some(fe(6)));
    }

    #[test]
    fn test_pass_bound() {
        let n = 12;
        let opcodes = (1..=n).rev().map(|i| copy(i + 1, i)).collect::<Vec<_>>();
        let circuit = Circuit {
            opcodes,
            ..Default::default()
        };
        let solution = run(&circuit, &[(1, 1)]).unwrap();
        assert_eq!(solution.passes, n as usize);
        assert!(solution.passes <= circuit.opcodes.len());
    }

    #[test]
    fn test_status_tracking() {
        let circuit = Circuit {
            opcodes: vec![copy(3, 2), copy(2, 1)],
            ..Default::default()
        };
        let table = CapabilityTable::standard();
        let witness = [(w(1), fe(4))].into_iter().collect();
        let mut solver = Solver::new(&circuit, &table, witness);
        assert_eq!(solver.status(), &[OpcodeStatus::Pending, OpcodeStatus::Pending]);
        assert_eq!(solver.pass().unwrap(), 1);
        assert_eq!(solver.status(), &[OpcodeStatus::Stuck, OpcodeStatus::Resolved]);
        assert_eq!(solver.pass().unwrap(), 1);
        assert_eq!(solver.witnesses().get(w(3)), Some(fe(4)));
    }
}
