use crate::*;

// Simple brute-force implementation for use in property tests
#[cfg(test)]
pub(crate) fn solve_brute_force(f: &Formula) -> SatResult {
    let num_variables = f.num_variables();
    assert!(num_variables <= 16); // just for safety

    fn model_for(assignment: u32, num_variables: usize) -> Model {
        (1..=num_variables)
            .filter(|x| assignment & (1 << (x - 1)) != 0)
            .map(Variable)
            .collect()
    }

    for assignment in 0..2u32.pow(num_variables as u32) {
        if f.verify(&model_for(assignment, num_variables)).is_empty() {
            return SatResult::Satisfiable;
        }
    }
    // no assignment is valid
    SatResult::Unsatisfiable
}

/// Whether `model` satisfies `f` and dropping any single variable from it breaks that.
#[cfg(test)]
pub(crate) fn is_minimal(f: &Formula, model: &Model) -> bool {
    if !f.verify(model).is_empty() {
        return false;
    }
    model.iter().all(|var| {
        let mut smaller = model.clone();
        smaller.remove(var);
        !f.verify(&smaller).is_empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{n, p};

    #[test]
    fn solve_bcp_sat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let f = Formula::new(2, vec![c1, c2]).unwrap();

        assert_eq!(solve_brute_force(&f), SatResult::Satisfiable);
    }

    #[test]
    fn solve_bcp_unsat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let c3 = Clause::new(vec![n(2)]);
        let f = Formula::new(2, vec![c1, c2, c3]).unwrap();

        assert_eq!(solve_brute_force(&f), SatResult::Unsatisfiable);
    }

    #[test]
    fn minimality() {
        let f = Formula::from_dimacs(3, vec![vec![1, 2], vec![2, 3]]).unwrap();
        let two: Model = vec![Variable(2)].into_iter().collect();
        let one_three: Model = vec![Variable(1), Variable(3)].into_iter().collect();
        let all: Model = vec![Variable(1), Variable(2), Variable(3)].into_iter().collect();

        assert!(is_minimal(&f, &two));
        assert!(is_minimal(&f, &one_three));
        assert!(!is_minimal(&f, &all));
    }
}
