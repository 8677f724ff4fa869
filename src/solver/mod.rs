//! The multi-strategy solver pipeline.
//!
//! `solve` maps a `(problem, seed state, overrides)` triple to one
//! satisfying assignment. Three strategies compose in a fixed fallback
//! order, each bounded by the problem's tuning parameters:
//!
//! 1. **Naive**: pure rejection sampling over the joint space. Wins on
//!    loosely coupled variables and dense solution spaces.
//! 2. **Sparse**: layered search over variables grouped by their `order`
//!    hint, widening candidate subsets and backtracking between groups.
//!    Escapes the needle-in-a-haystack trap that kills pure rejection.
//! 3. **Thorough**: exhaustive enumeration of the full product space,
//!    picking one solution uniformly. Bounded by `max_domain_size`.
//!
//! Universal failure raises a single `RandomizationError` carrying the
//! diagnostics collected along the way.

use std::collections::BTreeMap;

use crate::constraint::{
    eval_multi, wrap_list, wrap_scalar, Eval, ListPredicate, MultiConstraint, ScalarPredicate,
};
use crate::debug::{AttemptRecord, DebugSink, RandomizationDebugInfo};
use crate::error::RandomizationError;
use crate::problem::MultiVarProblem;
use crate::rng::Rng;
use crate::value::{Assignment, Value};

mod naive;
mod sparse;
mod thorough;

/// Per-call overrides: fixed values, temporary constraints, debug mode.
/// Temporary additions never mutate the problem; they hold for exactly
/// one `solve` call.
#[derive(Default)]
pub struct SolveOptions {
    pub(crate) with_values: Assignment,
    pub(crate) with_constraints: Vec<MultiConstraint>,
    pub(crate) debug: bool,
}

impl SolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix a variable to a concrete value for this call.
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.with_values.insert(name.to_string(), value.into());
        self
    }

    /// Add a temporary constraint for this call. A single-name tuple is
    /// applied to that variable directly (as a list constraint when the
    /// variable is a list).
    pub fn with_constraint(
        mut self,
        pred: impl Fn(&[Value]) -> bool + Send + Sync + 'static,
        vars: &[&str],
    ) -> Self {
        self.with_constraints.push(MultiConstraint::new(
            std::sync::Arc::new(pred),
            vars.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Retain every violating attempt in the failure diagnostics instead
    /// of just the most recent one. Slower; capped to bound memory.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Everything a strategy needs to see, assembled once per call.
pub(crate) struct SolveCtx<'a> {
    pub problem: &'a MultiVarProblem,
    /// Values fixed for this call; their draws are constants.
    pub fixed: &'a Assignment,
    /// Multi-variable constraints in play: the problem's, then temporary.
    pub constraints: Vec<&'a MultiConstraint>,
    /// Temporary single-variable constraints, routed per variable.
    pub temp_scalar: BTreeMap<String, Vec<ScalarPredicate>>,
    pub temp_list: BTreeMap<String, Vec<ListPredicate>>,
}

impl<'a> SolveCtx<'a> {
    pub fn temp_scalar_for(&self, name: &str) -> &[ScalarPredicate] {
        self.temp_scalar.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn temp_list_for(&self, name: &str) -> &[ListPredicate] {
        self.temp_list.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Evaluate one constraint against values that must already contain
    /// every variable of its tuple.
    pub fn eval_constraint(&self, constraint: &MultiConstraint, values: &Assignment) -> Eval {
        let args: Vec<Value> = constraint
            .vars
            .iter()
            .map(|name| values[name].clone())
            .collect();
        eval_multi(&constraint.pred, &args)
    }
}

fn override_error(message: String) -> RandomizationError {
    RandomizationError::new(message, RandomizationDebugInfo::default())
}

/// Solve one randomization problem, consuming the shared random source.
///
/// Runs the enabled strategies in order and returns the first satisfying
/// assignment. The assignment covers every variable of the problem; fixed
/// values appear exactly as given.
pub fn solve(
    problem: &MultiVarProblem,
    rng: &mut Rng,
    opts: &SolveOptions,
) -> Result<Assignment, RandomizationError> {
    for name in opts.with_values.keys() {
        if !problem.contains(name) {
            return Err(override_error(format!(
                "fixed value given for unknown variable '{name}'"
            )));
        }
    }

    // Route temporary constraints: single-name tuples attach to the
    // variable for the duration of this call, the rest join the
    // multi-constraint list.
    let mut constraints: Vec<&MultiConstraint> = problem.constraints().iter().collect();
    let mut temp_scalar: BTreeMap<String, Vec<ScalarPredicate>> = BTreeMap::new();
    let mut temp_list: BTreeMap<String, Vec<ListPredicate>> = BTreeMap::new();
    for constraint in &opts.with_constraints {
        for name in constraint.vars() {
            if !problem.contains(name) {
                return Err(override_error(format!(
                    "temporary constraint references unknown variable '{name}'"
                )));
            }
        }
        if constraint.vars().len() == 1 {
            let name = &constraint.vars()[0];
            match problem.var(name) {
                Some(var) if var.is_list() => temp_list
                    .entry(name.clone())
                    .or_default()
                    .push(wrap_list(constraint.pred.clone())),
                _ => temp_scalar
                    .entry(name.clone())
                    .or_default()
                    .push(wrap_scalar(constraint.pred.clone())),
            }
        } else {
            constraints.push(constraint);
        }
    }

    let mut sink = DebugSink::new(opts.debug);
    let ctx = SolveCtx {
        problem,
        fixed: &opts.with_values,
        constraints,
        temp_scalar,
        temp_list,
    };

    // A constraint whose variables are all fixed can never be repaired by
    // any strategy; check those once up front.
    for &constraint in &ctx.constraints {
        if constraint.vars().iter().all(|v| ctx.fixed.contains_key(v))
            && !ctx.eval_constraint(constraint, ctx.fixed).passed()
        {
            let tuple = constraint.vars().to_vec();
            let fail = sink.begin_fail(None, tuple.clone(), vec![tuple.clone()]);
            let values: Assignment = ctx
                .fixed
                .iter()
                .filter(|(name, _)| tuple.contains(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            sink.attempt(
                fail,
                AttemptRecord {
                    attempt: 0,
                    values,
                    failing: vec![tuple.clone()],
                    faults: Vec::new(),
                },
            );
            return Err(RandomizationError::new(
                format!("fixed values violate the constraint over ({})", tuple.join(", ")),
                sink.into_info(),
            ));
        }
    }

    let flags = problem.flags();
    if !(flags.naive || flags.sparse || flags.thorough) {
        return Err(RandomizationError::new(
            "all solver strategies are disabled; there is no way to solve the problem",
            sink.into_info(),
        ));
    }

    if flags.naive {
        if let Some(solution) = naive::solve_naive(&ctx, rng, &mut sink) {
            return Ok(solution);
        }
    }
    if flags.sparse {
        if let Some(solution) = sparse::solve_sparse(&ctx, rng, &mut sink) {
            return Ok(solution);
        }
    }
    if flags.thorough {
        if let Some(solution) = thorough::solve_thorough(&ctx, rng, &mut sink) {
            return Ok(solution);
        }
    }

    Err(RandomizationError::new(
        "could not solve the randomization problem",
        sink.into_info(),
    ))
}
