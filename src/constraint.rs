//! Constraint predicates and guarded evaluation.
//!
//! Predicates are opaque user callables: scalar predicates see one value,
//! list predicates see a whole list, multi-variable predicates see the
//! values of their variable tuple in declared order. The engine cannot
//! inspect them, only evaluate them, and it cannot enforce purity, so a
//! predicate that panics is treated as having returned `false`, with the
//! fault recorded for diagnostics. A single flaky predicate must not
//! abort an otherwise solvable problem.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::value::Value;

/// Predicate over one scalar candidate value.
pub type ScalarPredicate = Arc<dyn Fn(i64) -> bool + Send + Sync>;

/// Predicate over a whole list value.
pub type ListPredicate = Arc<dyn Fn(&[i64]) -> bool + Send + Sync>;

/// Predicate over the values of several variables, in tuple order.
pub type MultiPredicate = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// A multi-variable constraint: a predicate plus the tuple of variable
/// names it reads. The tuple order is the argument order.
#[derive(Clone)]
pub struct MultiConstraint {
    pub(crate) pred: MultiPredicate,
    pub(crate) vars: Vec<String>,
}

impl MultiConstraint {
    pub fn new(pred: MultiPredicate, vars: Vec<String>) -> Self {
        Self { pred, vars }
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }
}

impl fmt::Debug for MultiConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiConstraint")
            .field("vars", &self.vars)
            .finish_non_exhaustive()
    }
}

/// Outcome of one guarded predicate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Eval {
    Pass,
    Fail,
    /// The predicate panicked; treated as a failed constraint.
    Fault(String),
}

impl Eval {
    pub(crate) fn passed(&self) -> bool {
        matches!(self, Eval::Pass)
    }
}

fn guard(result: std::thread::Result<bool>) -> Eval {
    match result {
        Ok(true) => Eval::Pass,
        Ok(false) => Eval::Fail,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "predicate panicked".to_string()
            };
            Eval::Fault(message)
        }
    }
}

pub(crate) fn eval_scalar(pred: &ScalarPredicate, value: i64) -> Eval {
    guard(catch_unwind(AssertUnwindSafe(|| pred(value))))
}

pub(crate) fn eval_list(pred: &ListPredicate, values: &[i64]) -> Eval {
    guard(catch_unwind(AssertUnwindSafe(|| pred(values))))
}

pub(crate) fn eval_multi(pred: &MultiPredicate, args: &[Value]) -> Eval {
    guard(catch_unwind(AssertUnwindSafe(|| pred(args))))
}

/// Adapt a single-variable multi-predicate to a scalar predicate.
pub(crate) fn wrap_scalar(pred: MultiPredicate) -> ScalarPredicate {
    Arc::new(move |value| pred(&[Value::Int(value)]))
}

/// Adapt a single-variable multi-predicate to a whole-list predicate.
pub(crate) fn wrap_list(pred: MultiPredicate) -> ListPredicate {
    Arc::new(move |values| pred(&[Value::List(values.to_vec())]))
}

/// True when every element of the list is distinct. The usual constraint
/// on a randomized list; O(N) time, O(N) space.
pub fn unique(values: &[i64]) -> bool {
    let mut seen = std::collections::BTreeSet::new();
    values.iter().all(|v| seen.insert(*v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique() {
        assert!(unique(&[1, 2, 3]));
        assert!(unique(&[]));
        assert!(!unique(&[1, 2, 1]));
    }

    #[test]
    fn test_eval_passes_and_fails() {
        let even: ScalarPredicate = Arc::new(|v| v % 2 == 0);
        assert!(eval_scalar(&even, 4).passed());
        assert_eq!(eval_scalar(&even, 5), Eval::Fail);
    }

    #[test]
    fn test_faulting_predicate_reported_not_propagated() {
        let faulty: ScalarPredicate = Arc::new(|v| 100 / v > 10);
        match eval_scalar(&faulty, 0) {
            Eval::Fault(_) => {}
            other => panic!("expected fault, got {other:?}"),
        }
        assert!(eval_scalar(&faulty, 5).passed());
    }

    #[test]
    fn test_wrapped_single_var_predicates() {
        let pred: MultiPredicate = Arc::new(|args| args[0].as_int().map_or(false, |v| v > 3));
        let scalar = wrap_scalar(pred.clone());
        assert!(eval_scalar(&scalar, 4).passed());
        assert_eq!(eval_scalar(&scalar, 2), Eval::Fail);

        let sum_small: MultiPredicate =
            Arc::new(|args| args[0].as_list().map_or(false, |l| l.iter().sum::<i64>() < 5));
        let list = wrap_list(sum_small);
        assert!(eval_list(&list, &[1, 2]).passed());
        assert_eq!(eval_list(&list, &[4, 4]), Eval::Fail);
    }
}
