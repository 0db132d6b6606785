use crate::formula::{ClauseIdx, Variable};
use crate::solver::state::SearchState;
use std::collections::BTreeSet;

/// Orders the variables that could satisfy `clause`: its live positive variables that are
/// not excluded, fewest shared open constraints first, ties broken by variable number.
///
/// A candidate's overlap is the number of other candidates it shares a still-open clause with,
/// not counting `clause` itself, which every candidate shares.
pub(crate) fn candidates(state: &SearchState, clause: ClauseIdx) -> Vec<Variable> {
    let formula = state.formula();
    let values = state.values();

    let mut candidates: Vec<Variable> = formula
        .clause(clause)
        .positives()
        .filter(|&v| !values.is_true(v) && !values.is_forced_false(v) && !values.is_excluded(v))
        .collect();
    candidates.sort();
    candidates.dedup();

    let mut scored: Vec<(usize, Variable)> = candidates
        .iter()
        .map(|&var| {
            let mut partners = BTreeSet::new();
            for &idx in formula.occurrences(var) {
                if idx == clause || !state.weight(idx).is_open() {
                    continue;
                }
                for literal in formula.clause(idx).literals() {
                    let other = literal.variable();
                    if other != var && candidates.binary_search(&other).is_ok() {
                        partners.insert(other);
                    }
                }
            }
            (partners.len(), var)
        })
        .collect();
    scored.sort();

    scored.into_iter().map(|(_, var)| var).collect()
}
