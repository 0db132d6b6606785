pub mod dimacs;

use crate::error::Error;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// A boolean variable, numbered from 1 as in the DIMACS format.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct Variable(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
    Positive(Variable),
    Negative(Variable),
}

/// The set of variables bound True by a solution. Every other variable is False.
pub type Model = BTreeSet<Variable>;

impl Literal {
    /// Decodes a signed DIMACS literal. Zero is the clause terminator, not a literal.
    pub fn from_dimacs(x: i64) -> Option<Self> {
        if x > 0 {
            Some(Literal::Positive(Variable(x as usize)))
        } else if x < 0 {
            Some(Literal::Negative(Variable(x.unsigned_abs() as usize)))
        } else {
            None
        }
    }

    pub fn to_dimacs(&self) -> i64 {
        match self {
            Literal::Positive(v) => v.0 as i64,
            Literal::Negative(v) => -(v.0 as i64),
        }
    }

    pub fn variable(&self) -> Variable {
        match self {
            Literal::Positive(v) => *v,
            Literal::Negative(v) => *v,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Literal::Positive(_) => true,
            Literal::Negative(_) => false,
        }
    }

    pub fn idx(&self) -> usize {
        self.variable().0
    }

    /// Whether the literal holds under `model`, where absent variables are False.
    pub fn holds_in(&self, model: &Model) -> bool {
        match self {
            Literal::Positive(v) => model.contains(v),
            Literal::Negative(v) => !model.contains(v),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Literal::Positive(Variable(x)) => write!(f, "{}", x),
            Literal::Negative(Variable(x)) => write!(f, "!{}", x),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClauseIdx(pub usize);

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    /// Builds a clause, dropping repeated literals but keeping first-occurrence order.
    pub fn new(disjuncts: impl IntoIterator<Item = Literal>) -> Self {
        let mut literals: Vec<Literal> = vec![];
        for literal in disjuncts {
            if !literals.contains(&literal) {
                literals.push(literal);
            }
        }
        Self { literals }
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    /// Variables occurring positively, in clause order.
    pub fn positives(&self) -> impl Iterator<Item = Variable> + '_ {
        self.literals
            .iter()
            .filter(|l| l.is_positive())
            .map(|l| l.variable())
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn is_satisfied_by(&self, model: &Model) -> bool {
        self.literals.iter().any(|l| l.holds_in(model))
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.literals.len() > 1 {
            f.write_str("(")?;
        }
        let mut first_literal = true;
        for literal in &self.literals {
            if first_literal {
                first_literal = false;
            } else {
                f.write_str(" | ")?;
            }
            write!(f, "{}", literal)?;
        }
        if self.literals.len() > 1 {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// An immutable CNF formula over variables `1..=num_variables`, with an index from each
/// variable to the clauses that mention it in either polarity.
#[derive(Clone, Debug)]
pub struct Formula {
    num_variables: usize,
    clauses: Vec<Clause>,
    occurrences: Vec<Vec<ClauseIdx>>,
}

impl Formula {
    pub fn new(num_variables: usize, conjuncts: impl IntoIterator<Item = Clause>) -> Result<Self, Error> {
        let clauses: Vec<Clause> = conjuncts.into_iter().collect();

        let mut largest: usize = 0;
        for literal in clauses.iter().flat_map(|c| c.literals()) {
            let var = literal.idx();
            if var == 0 || var > num_variables {
                return Err(Error::SizeMismatch {
                    what: "variable",
                    declared: num_variables,
                    found: var,
                });
            }
            largest = largest.max(var);
        }

        // the declared count is untrusted input
        let too_many = Error::SizeMismatch {
            what: "variable",
            declared: num_variables,
            found: largest,
        };
        let slots = match num_variables.checked_add(1) {
            Some(slots) => slots,
            None => return Err(too_many),
        };
        let mut occurrences: Vec<Vec<ClauseIdx>> = vec![];
        if occurrences.try_reserve_exact(slots).is_err() {
            return Err(too_many);
        }
        occurrences.resize_with(slots, Vec::new);

        for (idx, clause) in clauses.iter().enumerate() {
            for literal in clause.literals() {
                let list = &mut occurrences[literal.idx()];
                // a tautology mentions its variable twice
                if list.last() != Some(&ClauseIdx(idx)) {
                    list.push(ClauseIdx(idx));
                }
            }
        }

        Ok(Self {
            num_variables,
            clauses,
            occurrences,
        })
    }

    /// Builds a formula from signed integer literals, one inner sequence per clause.
    pub fn from_dimacs<C, L>(num_variables: usize, clauses: C) -> Result<Self, Error>
    where
        C: IntoIterator<Item = L>,
        L: IntoIterator<Item = i64>,
    {
        let mut built = vec![];
        for (line, clause) in clauses.into_iter().enumerate() {
            let mut literals = vec![];
            for x in clause {
                let literal = Literal::from_dimacs(x).ok_or_else(|| Error::Malformed {
                    line: line + 1,
                    token: x.to_string(),
                })?;
                literals.push(literal);
            }
            built.push(Clause::new(literals));
        }
        Self::new(num_variables, built)
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn clause(&self, idx: ClauseIdx) -> &Clause {
        &self.clauses[idx.0]
    }

    /// Clauses mentioning `var`, in ascending order.
    pub fn occurrences(&self, var: Variable) -> &[ClauseIdx] {
        &self.occurrences[var.0]
    }

    /// Spells out `model` as one literal per variable, in variable order.
    pub fn assignment(&self, model: &Model) -> Vec<Literal> {
        (1..=self.num_variables)
            .map(Variable)
            .map(|var| {
                if model.contains(&var) {
                    Literal::Positive(var)
                } else {
                    Literal::Negative(var)
                }
            })
            .collect()
    }

    /// Returns the clauses `model` leaves unsatisfied; empty means the model is valid.
    pub fn verify(&self, model: &Model) -> Vec<ClauseIdx> {
        self.clauses
            .iter()
            .enumerate()
            .filter(|(_, clause)| !clause.is_satisfied_by(model))
            .map(|(idx, _)| ClauseIdx(idx))
            .collect()
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut first_clause = true;
        for clause in &self.clauses {
            if first_clause {
                first_clause = false;
            } else {
                f.write_str(" & ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn p(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

#[cfg(test)]
pub(crate) fn n(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

/// Random formulas over at most `max_vars` variables with clauses of one to three literals.
#[cfg(test)]
pub(crate) fn formula_strategy(
    max_vars: usize,
    max_clauses: usize,
) -> impl proptest::strategy::Strategy<Value = Formula> {
    use proptest::prelude::*;

    (1..=max_vars)
        .prop_flat_map(move |num_vars| {
            let literal = (1..=num_vars, any::<bool>());
            (
                Just(num_vars),
                prop::collection::vec(prop::collection::vec(literal, 1..=3), 0..=max_clauses),
            )
        })
        .prop_map(|(num_vars, clauses)| {
            let clauses = clauses.into_iter().map(|clause| {
                Clause::new(clause.into_iter().map(|(var, positive)| {
                    if positive {
                        p(var)
                    } else {
                        n(var)
                    }
                }))
            });
            Formula::new(num_vars, clauses).expect("generated variables are in range")
        })
}
