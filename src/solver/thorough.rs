//! Thorough strategy: exhaustive enumeration of the complete problem.
//!
//! Builds the full filtered product space, collects every satisfying
//! assignment with a backtracking walk, and draws one uniformly via the
//! random source. Only the final pick is observable, so candidate
//! ordering just has to be deterministic. Preconditions: every variable
//! enumerable, product of domain sizes within `max_domain_size`.

use std::collections::BTreeMap;

use crate::constraint::MultiConstraint;
use crate::debug::{AttemptRecord, DebugSink, Strategy, StrategyOutcome, StrategyReport};
use crate::rng::Rng;
use crate::value::{Assignment, Value};
use crate::var::RandVar;

use super::SolveCtx;

pub(crate) fn solve_thorough(
    ctx: &SolveCtx<'_>,
    rng: &mut Rng,
    sink: &mut DebugSink,
) -> Option<Assignment> {
    let vars: Vec<&RandVar> = ctx
        .problem
        .vars()
        .iter()
        .filter(|v| !ctx.fixed.contains_key(v.name()))
        .collect();

    let refuse = |sink: &mut DebugSink, reason: String| {
        sink.report(StrategyReport {
            strategy: Strategy::Thorough,
            iterations: 0,
            width: None,
            outcome: StrategyOutcome::Refused(reason),
        });
    };

    for var in &vars {
        if !var.is_enumerable() {
            refuse(
                sink,
                format!("variable '{}' has an opaque function domain", var.name()),
            );
            return None;
        }
    }

    let max_domain_size = ctx.problem.max_domain_size();
    let mut product: u128 = 1;
    for var in &vars {
        product = match var.domain_size().and_then(|size| product.checked_mul(size)) {
            Some(p) => p,
            None => {
                refuse(sink, "domain product overflows".to_string());
                return None;
            }
        };
    }
    if product > max_domain_size {
        refuse(
            sink,
            format!("domain product {product} exceeds max_domain_size {max_domain_size}"),
        );
        return None;
    }

    let variables: Vec<String> = vars.iter().map(|v| v.name().to_string()).collect();
    let tuples: Vec<Vec<String>> = ctx.constraints.iter().map(|c| c.vars().to_vec()).collect();
    let fail = sink.begin_fail(Some(Strategy::Thorough), variables, tuples);

    let mut domains: Vec<Vec<Value>> = Vec::with_capacity(vars.len());
    for var in &vars {
        let domain = match var.enumerate_all(
            ctx.temp_scalar_for(var.name()),
            ctx.temp_list_for(var.name()),
        ) {
            Some(domain) => domain,
            None => return None, // unreachable: enumerability checked above
        };
        if domain.is_empty() {
            // The variable's own constraints leave nothing to pick.
            sink.attempt(
                fail,
                AttemptRecord {
                    attempt: 0,
                    values: ctx.fixed.clone(),
                    failing: vec![vec![var.name().to_string()]],
                    faults: Vec::new(),
                },
            );
            sink.report(StrategyReport {
                strategy: Strategy::Thorough,
                iterations: 0,
                width: None,
                outcome: StrategyOutcome::Unsatisfiable,
            });
            return None;
        }
        domains.push(domain);
    }

    // Constraint -> the depth at which its last non-fixed variable binds.
    let mut location: BTreeMap<&str, usize> = BTreeMap::new();
    for (depth, var) in vars.iter().enumerate() {
        location.insert(var.name(), depth);
    }
    let mut checks: Vec<(&MultiConstraint, usize)> = Vec::new();
    for &constraint in &ctx.constraints {
        let binding = constraint
            .vars()
            .iter()
            .filter_map(|name| location.get(name.as_str()).copied())
            .max();
        if let Some(depth) = binding {
            checks.push((constraint, depth));
        }
    }

    let mut solutions: Vec<Assignment> = Vec::new();
    let mut partial = ctx.fixed.clone();
    let mut visits = 0usize;
    enumerate(
        &vars,
        &domains,
        &checks,
        ctx,
        0,
        &mut partial,
        &mut solutions,
        &mut visits,
    );

    if solutions.is_empty() {
        sink.attempt(
            fail,
            AttemptRecord {
                attempt: visits,
                values: ctx.fixed.clone(),
                failing: ctx.constraints.iter().map(|c| c.vars().to_vec()).collect(),
                faults: Vec::new(),
            },
        );
        sink.report(StrategyReport {
            strategy: Strategy::Thorough,
            iterations: visits,
            width: None,
            outcome: StrategyOutcome::Unsatisfiable,
        });
        return None;
    }

    let pick = rng.choice_index(solutions.len());
    Some(solutions.swap_remove(pick))
}

/// Collect every satisfying assignment. Constraints are evaluated at the
/// depth where their last variable binds, pruning whole subtrees early.
#[allow(clippy::too_many_arguments)]
fn enumerate(
    vars: &[&RandVar],
    domains: &[Vec<Value>],
    checks: &[(&MultiConstraint, usize)],
    ctx: &SolveCtx<'_>,
    depth: usize,
    partial: &mut Assignment,
    solutions: &mut Vec<Assignment>,
    visits: &mut usize,
) {
    if depth == vars.len() {
        solutions.push(partial.clone());
        return;
    }
    let name = vars[depth].name();
    for value in &domains[depth] {
        *visits += 1;
        partial.insert(name.to_string(), value.clone());
        let pruned = checks.iter().any(|&(constraint, check_depth)| {
            check_depth == depth && !ctx.eval_constraint(constraint, partial).passed()
        });
        if !pruned {
            enumerate(
                vars, domains, checks, ctx, depth + 1, partial, solutions, visits,
            );
        }
    }
    partial.remove(name);
}
