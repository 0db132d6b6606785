//! Branch-and-bound search over clauses.
//!
//! Each search node drains unit clauses, then opens the most urgent clause that still needs
//! a True variable and tries each of its candidate variables in turn. A candidate that has
//! been tried is excluded for the remaining siblings and everything below them, so no
//! subtree repeats a choice already explored. All state changes are undone on the way back
//! up, which keeps the search a plain depth-first recursion over one mutable context.

mod heuristic;
mod order;
mod queue;
mod state;

pub use heuristic::{Band, Bonus, Heuristic, HeuristicKind, Plain, Priority, Tier, Urgency, Weight};
pub use state::Valuation;

use crate::formula::{Formula, Model, Variable};
use crate::SatResult;
use log::{debug, trace};
use state::{Conflict, SearchState};
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolveMode {
    /// Collect every true-set the search reaches.
    EnumerateMinimal,
    /// Stop at the first true-set, or exhaust the search to prove unsatisfiability.
    FirstSolutionOrUnsat,
}

impl Default for SolveMode {
    fn default() -> Self {
        SolveMode::FirstSolutionOrUnsat
    }
}

impl FromStr for SolveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(SolveMode::FirstSolutionOrUnsat),
            "all" => Ok(SolveMode::EnumerateMinimal),
            _ => Err(format!("unknown mode '{}'", s)),
        }
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct SolverConfig {
    pub mode: SolveMode,
    pub heuristic: HeuristicKind,
    /// Keep every branching decision in [`Outcome::decisions`].
    pub record_decisions: bool,
}

/// Variable `variable` was set True as a branching choice at search node `node`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Decision {
    pub node: u64,
    pub variable: Variable,
    /// The node searched under this choice, or `None` if propagation rejected it outright.
    pub child: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct Outcome {
    /// True-sets in the order they were found; empty if the formula is unsatisfiable.
    pub solutions: Vec<Model>,
    /// Number of search nodes visited.
    pub branches: u64,
    pub elapsed: Duration,
    pub decisions: Vec<Decision>,
}

impl Outcome {
    pub fn result(&self) -> SatResult {
        if self.solutions.is_empty() {
            SatResult::Unsatisfiable
        } else {
            SatResult::Satisfiable
        }
    }
}

pub struct Solver<'f> {
    formula: &'f Formula,
    config: SolverConfig,
}

impl<'f> Solver<'f> {
    pub fn new(formula: &'f Formula) -> Self {
        Self::with_config(formula, SolverConfig::default())
    }

    pub fn with_config(formula: &'f Formula, config: SolverConfig) -> Self {
        Self { formula, config }
    }

    pub fn solve(&self) -> Outcome {
        let start = Instant::now();
        let heuristic = self.config.heuristic.build();

        let mut search = Search {
            state: SearchState::new(self.formula, heuristic.as_ref()),
            mode: self.config.mode,
            solutions: vec![],
            branches: 0,
            decisions: if self.config.record_decisions {
                Some(vec![])
            } else {
                None
            },
            done: false,
        };
        search.expand();

        let elapsed = start.elapsed();
        debug!(
            "{} solution(s) after {} branches in {:?}",
            search.solutions.len(),
            search.branches,
            elapsed
        );

        Outcome {
            solutions: search.solutions,
            branches: search.branches,
            elapsed,
            decisions: search.decisions.unwrap_or_default(),
        }
    }
}

struct Search<'a> {
    state: SearchState<'a>,
    mode: SolveMode,
    solutions: Vec<Model>,
    branches: u64,
    decisions: Option<Vec<Decision>>,
    // set once a solution is recorded in FirstSolutionOrUnsat mode; every frame stops
    done: bool,
}

impl<'a> Search<'a> {
    /// Visits one search node and restores the state it was entered with.
    fn expand(&mut self) {
        self.branches += 1;
        let node = self.branches;
        let checkpoint = self.state.checkpoint();
        let exclusions = self.state.exclusion_mark();
        #[cfg(test)]
        let fingerprint = {
            self.state.assert_queue_covers_open_clauses();
            self.state.fingerprint()
        };

        self.branch(node);

        self.state.rollback(checkpoint);
        self.state.release_exclusions(exclusions);
        #[cfg(test)]
        assert_eq!(
            fingerprint,
            self.state.fingerprint(),
            "node {} did not restore the search state",
            node
        );
    }

    fn branch(&mut self, node: u64) {
        if let Err(conflict) = self.state.propagate() {
            debug!("node {} fails on entry: {:?}", node, conflict);
            return;
        }

        let entry = match self.state.peek_valid() {
            Some(entry) => entry,
            None => return self.record(node),
        };
        match self.state.weight(entry.clause).band {
            Band::Empty => {
                debug!("node {} fails: clause {} is empty", node, entry.clause.0);
                return;
            }
            // nothing ahead of this clause needs a True variable
            Band::Negative | Band::Satisfied => return self.record(node),
            Band::Unit(_) | Band::Positive { .. } => {}
        }

        self.state.pop(entry);
        self.state.touch_positives(entry.clause);
        let candidates = order::candidates(&self.state, entry.clause);
        trace!(
            "node {} opens clause {} {} with candidates {:?}",
            node,
            entry.clause.0,
            self.state.formula().clause(entry.clause),
            candidates
        );

        for var in candidates {
            let trial = self.state.checkpoint();
            let accepted = self.try_candidate(var);
            let next_node = self.branches + 1;
            if let Some(decisions) = &mut self.decisions {
                let child = accepted.ok().map(|()| next_node);
                decisions.push(Decision {
                    node,
                    variable: var,
                    child,
                });
            }
            match accepted {
                Ok(()) => self.expand(),
                Err(conflict) => trace!("node {} rejects {}: {:?}", node, var.0, conflict),
            }
            self.state.rollback(trial);

            if self.done {
                return;
            }
            self.state.exclude(var);
        }
    }

    fn try_candidate(&mut self, var: Variable) -> Result<(), Conflict> {
        self.state.assign(var)?;
        self.state.propagate()
    }

    fn record(&mut self, node: u64) {
        let model = self.state.values().true_set();
        debug!("node {} found {:?}", node, model);
        self.solutions.push(model);
        if self.mode == SolveMode::FirstSolutionOrUnsat {
            self.done = true;
        }
    }
}
