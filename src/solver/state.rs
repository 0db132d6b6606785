use crate::formula::{ClauseIdx, Formula, Literal, Model, Variable};
use crate::solver::heuristic::{Band, Bonus, Heuristic, Weight};
use crate::solver::queue::{Entry, LazyQueue};
use log::trace;

/// The partial assignment along the active search path.
///
/// Variables are True once assigned, pinned False once propagation forces them, and
/// otherwise default to False. `touched` counts how often an ancestor branch opened a clause
/// containing the variable positively; `excluded` is the current no-good set.
#[derive(Clone, Debug)]
pub struct Valuation {
    assigned: Vec<bool>,
    forced_false: Vec<bool>,
    touched: Vec<u32>,
    excluded: Vec<bool>,
}

impl Valuation {
    pub(crate) fn new(num_variables: usize) -> Self {
        Self {
            assigned: vec![false; num_variables + 1],
            forced_false: vec![false; num_variables + 1],
            touched: vec![0; num_variables + 1],
            excluded: vec![false; num_variables + 1],
        }
    }

    pub fn is_true(&self, var: Variable) -> bool {
        self.assigned[var.0]
    }

    pub fn is_forced_false(&self, var: Variable) -> bool {
        self.forced_false[var.0]
    }

    /// Whether no clause containing `var` positively has been opened on this path.
    pub fn is_fresh(&self, var: Variable) -> bool {
        self.touched[var.0] == 0
    }

    pub fn is_excluded(&self, var: Variable) -> bool {
        self.excluded[var.0]
    }

    /// `Some(true)` if the literal is already true, `Some(false)` if it is already false,
    /// `None` while its variable is unresolved.
    pub fn value(&self, literal: Literal) -> Option<bool> {
        let var = literal.variable();
        if self.is_true(var) {
            Some(literal.is_positive())
        } else if self.is_forced_false(var) {
            Some(!literal.is_positive())
        } else {
            None
        }
    }

    pub fn true_set(&self) -> Model {
        self.assigned
            .iter()
            .enumerate()
            .filter(|(_, &assigned)| assigned)
            .map(|(idx, _)| Variable(idx))
            .collect()
    }

    pub(crate) fn set_true(&mut self, var: Variable) {
        assert!(
            !self.forced_false[var.0],
            "variable {} is both True and forced False",
            var.0
        );
        self.assigned[var.0] = true;
    }

    pub(crate) fn set_forced_false(&mut self, var: Variable) {
        assert!(
            !self.assigned[var.0],
            "variable {} is both True and forced False",
            var.0
        );
        self.forced_false[var.0] = true;
    }

    pub(crate) fn touch(&mut self, var: Variable) {
        self.touched[var.0] += 1;
    }

    pub(crate) fn set_excluded(&mut self, var: Variable, excluded: bool) {
        self.excluded[var.0] = excluded;
    }
}

/// Why a tentative assignment was abandoned. Ordinary control flow, never an error.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Conflict {
    /// A clause lost its last viable literal.
    Empty(ClauseIdx),
    /// A clause can only be satisfied by already excluded variables.
    Exhausted(ClauseIdx),
    /// Propagation tried to set an excluded variable True.
    Excluded(Variable),
}

#[derive(Clone, Copy, Debug)]
enum Undo {
    Weight(ClauseIdx, Weight),
    Assigned(Variable),
    Forced(Variable),
    Touched(Variable),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Checkpoint {
    trail: usize,
    queue: usize,
}

/// Everything the search mutates, owned by a single search and undone in stack order.
pub(crate) struct SearchState<'a> {
    formula: &'a Formula,
    heuristic: &'a dyn Heuristic,
    values: Valuation,
    weights: Vec<Weight>,
    queue: LazyQueue,
    trail: Vec<Undo>,
    exclusions: Vec<Variable>,
}

impl<'a> SearchState<'a> {
    /// Classifies every clause and queues all of them.
    pub fn new(formula: &'a Formula, heuristic: &'a dyn Heuristic) -> Self {
        let values = Valuation::new(formula.num_variables());
        let mut queue = LazyQueue::default();
        let weights: Vec<Weight> = formula
            .clauses()
            .map(|clause| Weight::new(heuristic.classify(clause, &values)))
            .collect();
        for (idx, weight) in weights.iter().enumerate() {
            queue.push(Entry {
                priority: weight.priority(),
                clause: ClauseIdx(idx),
            });
        }

        Self {
            formula,
            heuristic,
            values,
            weights,
            queue,
            trail: vec![],
            exclusions: vec![],
        }
    }

    pub fn formula(&self) -> &'a Formula {
        self.formula
    }

    pub fn values(&self) -> &Valuation {
        &self.values
    }

    pub fn weight(&self, clause: ClauseIdx) -> Weight {
        self.weights[clause.0]
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            trail: self.trail.len(),
            queue: self.queue.mark(),
        }
    }

    /// Reverts every change made since `checkpoint`, most recent first.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.trail.len() > checkpoint.trail {
            match self.trail.pop() {
                Some(Undo::Weight(clause, previous)) => self.weights[clause.0] = previous,
                Some(Undo::Assigned(var)) => self.values.assigned[var.0] = false,
                Some(Undo::Forced(var)) => self.values.forced_false[var.0] = false,
                Some(Undo::Touched(var)) => self.values.touched[var.0] -= 1,
                None => break,
            }
        }
        self.queue.rollback(checkpoint.queue);
    }

    pub fn exclusion_mark(&self) -> usize {
        self.exclusions.len()
    }

    pub fn exclude(&mut self, var: Variable) {
        debug_assert!(!self.values.is_excluded(var));
        self.values.set_excluded(var, true);
        self.exclusions.push(var);
    }

    /// Drops the exclusions added since `mark`.
    pub fn release_exclusions(&mut self, mark: usize) {
        for var in self.exclusions.drain(mark..) {
            self.values.excluded[var.0] = false;
        }
    }

    /// The most urgent queued clause whose entry still matches the weight table.
    pub fn peek_valid(&mut self) -> Option<Entry> {
        let weights = &self.weights;
        self.queue
            .peek_valid(|e| weights[e.clause.0].priority() == e.priority)
    }

    pub fn pop(&mut self, entry: Entry) {
        self.queue.remove(entry);
    }

    /// Marks the positive variables of `clause` as opened on this path.
    pub fn touch_positives(&mut self, clause: ClauseIdx) {
        let formula = self.formula;
        for var in formula.clause(clause).positives() {
            self.values.touch(var);
            self.trail.push(Undo::Touched(var));
        }
    }

    /// Sets `var` True and reclassifies every clause that mentions it.
    pub fn assign(&mut self, var: Variable) -> Result<(), Conflict> {
        trace!("assign {}", var.0);
        self.values.set_true(var);
        self.trail.push(Undo::Assigned(var));
        self.reclassify(var)
    }

    fn force_false(&mut self, var: Variable) -> Result<(), Conflict> {
        trace!("force !{}", var.0);
        self.values.set_forced_false(var);
        self.trail.push(Undo::Forced(var));
        self.reclassify(var)
    }

    fn reclassify(&mut self, var: Variable) -> Result<(), Conflict> {
        let formula = self.formula;
        for &idx in formula.occurrences(var) {
            let clause = formula.clause(idx);
            let band = self.heuristic.classify(clause, &self.values);
            if band == Band::Empty {
                return Err(Conflict::Empty(idx));
            }

            let mut weight = Weight::new(band);
            if weight.is_open() {
                weight.bonus = self.heuristic.bonus(clause, &self.values);
                if weight.bonus == Bonus::Exhausted {
                    return Err(Conflict::Exhausted(idx));
                }
            }

            let previous = self.weights[idx.0];
            if previous != weight {
                self.weights[idx.0] = weight;
                self.trail.push(Undo::Weight(idx, previous));
                if weight.is_open() && weight.priority() != previous.priority() {
                    self.queue.push(Entry {
                        priority: weight.priority(),
                        clause: idx,
                    });
                }
            }
        }
        Ok(())
    }

    /// Drains unit clauses from the top of the queue until none is left.
    pub fn propagate(&mut self) -> Result<(), Conflict> {
        while let Some(entry) = self.peek_valid() {
            let literal = match self.weights[entry.clause.0].band {
                Band::Unit(literal) => literal,
                _ => break,
            };
            self.pop(entry);
            trace!("clause {} is unit on {}", entry.clause.0, literal);

            match literal {
                Literal::Positive(var) => {
                    if self.values.is_excluded(var) {
                        return Err(Conflict::Excluded(var));
                    }
                    self.assign(var)?;
                }
                Literal::Negative(var) => self.force_false(var)?,
            }
        }
        Ok(())
    }

    /// Panics unless every open clause is queued at its current priority.
    #[cfg(test)]
    pub fn assert_queue_covers_open_clauses(&self) {
        for (idx, weight) in self.weights.iter().enumerate() {
            if weight.is_open() {
                let entry = Entry {
                    priority: weight.priority(),
                    clause: ClauseIdx(idx),
                };
                assert!(
                    self.queue.contains(&entry),
                    "open clause {} is not queued at {:?}",
                    idx,
                    weight
                );
            }
        }
    }

    #[cfg(test)]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            weights: self.weights.clone(),
            queue: self.queue.snapshot(),
            touched: self.values.touched.clone(),
            assigned: self.values.assigned.clone(),
            forced_false: self.values.forced_false.clone(),
        }
    }
}

#[cfg(test)]
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct Fingerprint {
    weights: Vec<Weight>,
    queue: Vec<(Entry, usize)>,
    touched: Vec<u32>,
    assigned: Vec<bool>,
    forced_false: Vec<bool>,
}
