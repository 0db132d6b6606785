//! A branch-and-bound SAT solver for CNF formulas that always expands the most tightly
//! constrained clause next, and can enumerate the minimal true-sets it reaches.

pub mod batch;
mod error;
pub mod formula;
pub mod report;
pub mod solver;

#[cfg(test)]
mod brute_force;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SatResult {
    Satisfiable,
    Unsatisfiable,
}

pub use error::Error;
pub use formula::dimacs::{parse, parse_file, ParsePolicy};
pub use formula::{Clause, ClauseIdx, Formula, Literal, Model, Variable};
pub use solver::{Decision, HeuristicKind, Outcome, SolveMode, Solver, SolverConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brute_force::solve_brute_force;
    use crate::formula::{n, p};

    #[test]
    fn solve_simple() {
        // (!1 | !1 | !1) & (!1 | !2 | !2) & (!2 | 3 | 4) & (!2 | 4 | !4)
        let c1 = Clause::new(vec![n(1), n(1), n(1)]);
        let c2 = Clause::new(vec![n(1), n(2), n(2)]);
        let c3 = Clause::new(vec![n(2), p(3), p(4)]);
        let c4 = Clause::new(vec![n(2), p(4), n(4)]);
        let f = Formula::new(4, vec![c1, c2, c3, c4]).unwrap();

        let outcome = Solver::new(&f).solve();
        assert_eq!(outcome.result(), SatResult::Satisfiable);
        // every clause has a negative literal, so the empty set already works
        assert_eq!(outcome.solutions, vec![Model::new()]);
    }

    #[test]
    fn solve_pigeonhole_unsat() {
        // three pigeons, two holes: variable 2 * pigeon + hole + 1
        let var = |pigeon: i64, hole: i64| 2 * pigeon + hole + 1;
        let mut clauses = vec![];
        for pigeon in 0..3 {
            clauses.push(vec![var(pigeon, 0), var(pigeon, 1)]);
        }
        for hole in 0..2 {
            for a in 0..3 {
                for b in (a + 1)..3 {
                    clauses.push(vec![-var(a, hole), -var(b, hole)]);
                }
            }
        }
        let f = Formula::from_dimacs(6, clauses).unwrap();

        assert_eq!(solve_brute_force(&f), SatResult::Unsatisfiable);
        for &mode in &[SolveMode::FirstSolutionOrUnsat, SolveMode::EnumerateMinimal] {
            let config = SolverConfig {
                mode,
                ..SolverConfig::default()
            };
            assert_eq!(
                Solver::with_config(&f, config).solve().result(),
                SatResult::Unsatisfiable
            );
        }
    }

    #[test]
    fn parse_and_solve() {
        let cnf = "p cnf 3 3\n1 2 0\n-1 3 0\n-2 -3 0\n";
        let f = parse(cnf.as_bytes(), ParsePolicy::Strict).unwrap();
        let outcome = Solver::new(&f).solve();
        assert!(f.verify(&outcome.solutions[0]).is_empty());
    }
}
