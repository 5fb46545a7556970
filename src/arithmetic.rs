use std::collections::BTreeMap;

use crate::circuit::{Expression, Witness};
use crate::field::FieldElement;
use crate::witness::WitnessMap;

/// Outcome of substituting the known witnesses into one arithmetic gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Fully assigned and evaluates to zero.
    Satisfied,
    /// Fully assigned with the given nonzero residual.
    Violated(FieldElement),
    /// Exactly one unknown with a nonzero coefficient; it must take this value.
    Solvable(Witness, FieldElement),
    /// More than one unknown, a product of two unknowns, or an unknown with a zero coefficient.
    Underdetermined,
}

/// Collapses `expr` to `c0 + c1·x` against `witnesses` and classifies the result.
pub fn reduce(expr: &Expression, witnesses: &WitnessMap) -> Reduction {
    let mut c0 = expr.q_c;
    let mut unknowns: BTreeMap<Witness, FieldElement> = BTreeMap::new();

    for (q, a, b) in &expr.mul_terms {
        if q.is_zero() {
            continue;
        }
        match (witnesses.get(*a), witnesses.get(*b)) {
            (Some(va), Some(vb)) => c0 += *q * va * vb,
            (Some(va), None) => *unknowns.entry(*b).or_default() += *q * va,
            (None, Some(vb)) => *unknowns.entry(*a).or_default() += *q * vb,
            (None, None) => return Reduction::Underdetermined,
        }
    }
    for (c, w) in &expr.linear_combinations {
        match witnesses.get(*w) {
            Some(v) => c0 += *c * v,
            None => *unknowns.entry(*w).or_default() += *c,
        }
    }

    // an unknown whose coefficient collapsed to zero is unconstrained here,
    // not assigned
    let had_unknowns = !unknowns.is_empty();
    unknowns.retain(|_, c| !c.is_zero());
    let mut unknowns = unknowns.into_iter();
    match (unknowns.next(), unknowns.next()) {
        (None, _) if had_unknowns => Reduction::Underdetermined,
        (None, _) if c0.is_zero() => Reduction::Satisfied,
        (None, _) => Reduction::Violated(c0),
        (Some((w, c1)), None) => match c1.inverse() {
            Some(inv) => Reduction::Solvable(w, -(c0 * inv)),
            None => Reduction::Underdetermined,
        },
        (Some(_), Some(_)) => Reduction::Underdetermined,
    }
}
