//! Clause classification.
//!
//! Every clause is sorted into a [`Band`] under the current partial assignment, and a
//! [`Heuristic`] may refine a clause that still needs branching with a [`Bonus`]. The pair is
//! a [`Weight`]; its [`Priority`] is the key the search queue orders clauses by, lowest first.

use crate::formula::{Clause, Literal};
use crate::solver::state::Valuation;
use std::str::FromStr;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Band {
    /// No literal can still be satisfied.
    Empty,
    /// Exactly one literal is still unresolved and must be made true.
    Unit(Literal),
    /// Only positive literals are unresolved; one of them has to become True.
    /// `slack` counts them, `fresh` counts those no ancestor branch has opened.
    Positive { slack: usize, fresh: usize },
    /// Some negative literal is unresolved, so the clause holds while its variable stays False.
    Negative,
    /// Some literal is already true.
    Satisfied,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bonus {
    None,
    /// Every live positive variable but one is excluded at this point of the search.
    LastCandidate,
    /// Every live positive variable is excluded: no remaining candidate can satisfy the clause.
    Exhausted,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Tier {
    Empty,
    Unit,
    LastCandidate,
    Positive,
    Negative,
    Satisfied,
}

/// Queue ordering key. Fewer options first, then clauses whose options are mostly unopened.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Priority {
    pub tier: Tier,
    pub slack: usize,
    pub opened: usize,
}

impl Priority {
    fn of(tier: Tier) -> Self {
        Self {
            tier,
            slack: 0,
            opened: 0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Weight {
    pub band: Band,
    pub bonus: Bonus,
}

impl Weight {
    pub fn new(band: Band) -> Self {
        Self {
            band,
            bonus: Bonus::None,
        }
    }

    pub fn priority(&self) -> Priority {
        match self.band {
            Band::Empty => Priority::of(Tier::Empty),
            Band::Unit(_) => Priority::of(Tier::Unit),
            Band::Positive { slack, fresh } => Priority {
                tier: if self.bonus == Bonus::LastCandidate {
                    Tier::LastCandidate
                } else {
                    Tier::Positive
                },
                slack,
                opened: slack - fresh,
            },
            Band::Negative => Priority::of(Tier::Negative),
            Band::Satisfied => Priority::of(Tier::Satisfied),
        }
    }

    /// Whether the clause still has to be picked up by the search.
    pub fn is_open(&self) -> bool {
        matches!(self.band, Band::Unit(_) | Band::Positive { .. })
    }
}

/// A clause-classification strategy.
pub trait Heuristic {
    /// Classifies `clause` under the current valuation. Must not cache across assignments.
    fn classify(&self, clause: &Clause, values: &Valuation) -> Band;

    /// Refines an open clause using the exclusion set.
    fn bonus(&self, _clause: &Clause, _values: &Valuation) -> Bonus {
        Bonus::None
    }
}

/// The default strategy: favours unopened variables and clauses running out of candidates.
#[derive(Clone, Copy, Default, Debug)]
pub struct Urgency;

/// Band-only classification with no freshness signal and no bonus.
#[derive(Clone, Copy, Default, Debug)]
pub struct Plain;

impl Heuristic for Urgency {
    fn classify(&self, clause: &Clause, values: &Valuation) -> Band {
        band(clause, values, true)
    }

    fn bonus(&self, clause: &Clause, values: &Valuation) -> Bonus {
        let mut open = 0;
        let mut excluded = 0;
        for var in clause.positives() {
            if values.is_forced_false(var) || values.is_true(var) {
                continue;
            }
            if values.is_excluded(var) {
                excluded += 1;
            } else {
                open += 1;
            }
        }
        match (excluded, open) {
            (0, _) => Bonus::None,
            (_, 0) => Bonus::Exhausted,
            (_, 1) => Bonus::LastCandidate,
            _ => Bonus::None,
        }
    }
}

impl Heuristic for Plain {
    fn classify(&self, clause: &Clause, values: &Valuation) -> Band {
        band(clause, values, false)
    }
}

fn band(clause: &Clause, values: &Valuation, count_fresh: bool) -> Band {
    let mut live = 0;
    let mut last_live = None;
    let mut negatives = 0;
    let mut fresh = 0;

    for literal in clause.literals() {
        match values.value(*literal) {
            Some(true) => return Band::Satisfied,
            Some(false) => continue,
            None => {}
        }
        live += 1;
        last_live = Some(*literal);
        match literal {
            Literal::Negative(_) => negatives += 1,
            Literal::Positive(var) => {
                if count_fresh && values.is_fresh(*var) {
                    fresh += 1;
                }
            }
        }
    }

    match (live, last_live) {
        (0, _) | (_, None) => Band::Empty,
        (1, Some(literal)) => Band::Unit(literal),
        _ if negatives > 0 => Band::Negative,
        _ => Band::Positive { slack: live, fresh },
    }
}

/// Selects one of the built-in strategies.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HeuristicKind {
    Urgency,
    Plain,
}

impl HeuristicKind {
    pub fn build(&self) -> Box<dyn Heuristic> {
        match self {
            HeuristicKind::Urgency => Box::new(Urgency),
            HeuristicKind::Plain => Box::new(Plain),
        }
    }
}

impl Default for HeuristicKind {
    fn default() -> Self {
        HeuristicKind::Urgency
    }
}

impl FromStr for HeuristicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgency" => Ok(HeuristicKind::Urgency),
            "plain" => Ok(HeuristicKind::Plain),
            _ => Err(format!("unknown heuristic '{}'", s)),
        }
    }
}
