//! User-facing randomizable object.
//!
//! A `RandObj` groups random variables and constraints, owns the seeded
//! random source, and dispatches `randomize`. After a successful
//! randomization the results are readable by name; failed calls leave
//! the previous results untouched.

use std::sync::Arc;

use crate::error::{BuildError, RandomizationError};
use crate::problem::MultiVarProblem;
use crate::rng::Rng;
use crate::solver::{self, SolveOptions};
use crate::value::{Assignment, Value};
use crate::var::VarSpec;

type Hook = Box<dyn FnMut(&mut Assignment)>;

/// Randomizable object: any number of random variables and constraints,
/// randomized together to produce a valid solution.
///
/// # Example
///
/// ```
/// use constrainedrandom::{RandObj, Value, VarSpec};
///
/// let mut obj = RandObj::new(0);
/// obj.add_rand_var("one_to_nine", VarSpec::range(1, 10)).unwrap();
/// obj.add_rand_var("eight_bits", VarSpec::bits(8).constraint(|x| x != 0))
///     .unwrap();
/// obj.add_constraint(
///     |args: &[Value]| args[0].as_int() != args[1].as_int(),
///     &["one_to_nine", "eight_bits"],
/// )
/// .unwrap();
///
/// obj.randomize().unwrap();
/// assert_ne!(obj.get_int("one_to_nine"), obj.get_int("eight_bits"));
/// ```
pub struct RandObj {
    rng: Rng,
    problem: MultiVarProblem,
    results: Assignment,
    pre_randomize: Option<Hook>,
    post_randomize: Option<Hook>,
}

impl RandObj {
    /// Create an object with its own random source seeded by `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(Rng::new(seed))
    }

    /// Create an object around an existing random source. When several
    /// objects share one stream, hand each a generator you seeded
    /// yourself and serialize their `randomize` calls.
    pub fn with_rng(rng: Rng) -> Self {
        Self {
            rng,
            problem: MultiVarProblem::new(),
            results: Assignment::new(),
            pre_randomize: None,
            post_randomize: None,
        }
    }

    /// Add a random variable. Its `initial` value, if any, is readable
    /// immediately.
    pub fn add_rand_var(&mut self, name: &str, spec: VarSpec) -> Result<(), BuildError> {
        self.problem.add_var(name, spec)?;
        if let Some(initial) = self.problem.var(name).and_then(|v| v.initial().cloned()) {
            self.results.insert(name.to_string(), initial);
        }
        Ok(())
    }

    /// Add a constraint over one or more variables. The tuple order is
    /// the argument order seen by the predicate.
    pub fn add_constraint(
        &mut self,
        pred: impl Fn(&[Value]) -> bool + Send + Sync + 'static,
        vars: &[&str],
    ) -> Result<(), BuildError> {
        self.problem.add_constraint(Arc::new(pred), vars)
    }

    /// Enable or disable solver strategies; `None` leaves a flag as is.
    pub fn set_solver_mode(
        &mut self,
        naive: Option<bool>,
        sparse: Option<bool>,
        thorough: Option<bool>,
    ) {
        self.problem.set_solver_mode(naive, sparse, thorough);
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.problem.set_max_iterations(max_iterations);
    }

    pub fn set_max_domain_size(&mut self, max_domain_size: u128) {
        self.problem.set_max_domain_size(max_domain_size);
    }

    /// Hook run before solving starts. Sees the current results map.
    pub fn set_pre_randomize(&mut self, hook: impl FnMut(&mut Assignment) + 'static) {
        self.pre_randomize = Some(Box::new(hook));
    }

    /// Hook run after a successful solve, before results are stored. May
    /// add derived entries (an assembled opcode, say). Never runs on
    /// failure.
    pub fn set_post_randomize(&mut self, hook: impl FnMut(&mut Assignment) + 'static) {
        self.post_randomize = Some(Box::new(hook));
    }

    /// Randomize all variables, applying every constraint.
    pub fn randomize(&mut self) -> Result<(), RandomizationError> {
        self.randomize_with(SolveOptions::new())
    }

    /// Randomize with per-call overrides: fixed values and temporary
    /// constraints that hold for this call only.
    pub fn randomize_with(&mut self, opts: SolveOptions) -> Result<(), RandomizationError> {
        if let Some(mut hook) = self.pre_randomize.take() {
            hook(&mut self.results);
            self.pre_randomize = Some(hook);
        }
        let mut solution = solver::solve(&self.problem, &mut self.rng, &opts)?;
        if let Some(mut hook) = self.post_randomize.take() {
            hook(&mut solution);
            self.post_randomize = Some(hook);
        }
        for (name, value) in solution {
            self.results.insert(name, value);
        }
        Ok(())
    }

    /// The most recent successful assignment, restricted to declared
    /// variables.
    pub fn get_results(&self) -> Assignment {
        self.results
            .iter()
            .filter(|(name, _)| self.problem.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// A value by name: a randomized variable, an initial value, or an
    /// entry added by a hook.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.results.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.results.get(name).and_then(Value::as_int)
    }

    pub fn get_list(&self, name: &str) -> Option<&[i64]> {
        self.results.get(name).and_then(Value::as_list)
    }
}
