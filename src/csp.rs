//! A small backtracking solver for binary constraint-satisfaction problems.

pub mod matcher;

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use derive_where::derive_where;

use crate::error::{Error, Result};

/// A token through which a running solve can be cancelled from outside.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that has not been triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the token; the solver checks it on every expansion.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the token has been triggered.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A constraint between two variables.
///
/// The predicate is only consulted once both variables are bound; partial
/// assignments never violate a constraint.
#[derive_where(Clone)]
pub struct Constraint<V> {
    a: usize,
    b: usize,
    test: Rc<dyn Fn(&V, &V) -> bool>,
}

impl<V> Constraint<V> {
    /// Constrain the variables `a` and `b` with the given predicate.
    pub fn new(a: usize, b: usize, test: impl Fn(&V, &V) -> bool + 'static) -> Self {
        Self {
            a,
            b,
            test: Rc::new(test),
        }
    }
}

/// A constraint-satisfaction problem over variables with explicit domains.
#[derive_where(Default)]
pub struct Problem<V> {
    domains: Vec<Vec<V>>,
    constraints: Vec<Constraint<V>>,
}

impl<V: Clone> Problem<V> {
    /// Create a problem with no variables.
    pub fn new() -> Self {
        Self {
            domains: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a variable with its domain and return its index.
    pub fn add_variable(&mut self, domain: Vec<V>) -> usize {
        self.domains.push(domain);
        self.domains.len() - 1
    }

    /// Add a constraint between two previously added variables.
    pub fn add_constraint(&mut self, constraint: Constraint<V>) {
        self.constraints.push(constraint);
    }

    /// Depth-first search for a complete assignment.
    ///
    /// Returns the values chosen for each variable, or `None` when the
    /// constraints cannot be satisfied. Fails with [`Error::Cancelled`] when
    /// the token is triggered mid-search.
    pub fn solve(&self, cancel: &CancelToken) -> Result<Option<Vec<V>>> {
        let mut by_var = vec![Vec::new(); self.domains.len()];
        for (ci, constraint) in self.constraints.iter().enumerate() {
            by_var[constraint.a].push(ci);
            by_var[constraint.b].push(ci);
        }

        let mut assignment: Vec<Option<V>> = vec![None; self.domains.len()];
        if self.assign(0, &mut assignment, &by_var, cancel)? {
            let solution = assignment
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .expect("search succeeded with a complete assignment");
            Ok(Some(solution))
        } else {
            Ok(None)
        }
    }

    fn assign(
        &self,
        var: usize,
        assignment: &mut Vec<Option<V>>,
        by_var: &[Vec<usize>],
        cancel: &CancelToken,
    ) -> Result<bool> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if var == self.domains.len() {
            return Ok(true);
        }
        for value in &self.domains[var] {
            assignment[var] = Some(value.clone());
            if self.consistent(var, assignment, by_var)
                && self.assign(var + 1, assignment, by_var, cancel)?
            {
                return Ok(true);
            }
        }
        assignment[var] = None;
        Ok(false)
    }

    fn consistent(&self, var: usize, assignment: &[Option<V>], by_var: &[Vec<usize>]) -> bool {
        by_var[var].iter().all(|&ci| {
            let constraint = &self.constraints[ci];
            match (&assignment[constraint.a], &assignment[constraint.b]) {
                (Some(a), Some(b)) => (constraint.test)(a, b),
                _ => true,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three variables over {0, 1}, all pairwise different: unsatisfiable.
    /// Dropping one inequality makes it satisfiable.
    #[test]
    fn pairwise_difference() {
        let mut problem = Problem::new();
        for _ in 0..3 {
            problem.add_variable(vec![0, 1]);
        }
        problem.add_constraint(Constraint::new(0, 1, |a: &i32, b: &i32| a != b));
        problem.add_constraint(Constraint::new(1, 2, |a: &i32, b: &i32| a != b));
        let solution = problem.solve(&CancelToken::new()).unwrap().unwrap();
        assert_ne!(solution[0], solution[1]);
        assert_ne!(solution[1], solution[2]);

        problem.add_constraint(Constraint::new(0, 2, |a: &i32, b: &i32| a != b));
        assert!(problem.solve(&CancelToken::new()).unwrap().is_none());
    }

    #[test]
    fn empty_domains_fail_fast() {
        let mut problem: Problem<i32> = Problem::new();
        problem.add_variable(vec![]);
        assert!(problem.solve(&CancelToken::new()).unwrap().is_none());
    }

    #[test]
    fn trivial_problems_succeed() {
        let problem: Problem<i32> = Problem::new();
        assert_eq!(problem.solve(&CancelToken::new()).unwrap(), Some(vec![]));
    }

    #[test]
    fn cancellation_stops_the_search() {
        let mut problem = Problem::new();
        problem.add_variable(vec![0, 1]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            problem.solve(&cancel).unwrap_err(),
            Error::Cancelled
        ));
    }
}
