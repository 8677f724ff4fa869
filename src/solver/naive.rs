//! Naive strategy: pure rejection sampling over the joint space.
//!
//! Each attempt draws every non-fixed variable once, in insertion order
//! (stable, so a seed reproduces the same attempt sequence), then checks
//! every multi-variable predicate. Constructing anything smarter costs
//! more than a handful of rejections when constraints are loose, which
//! typical field-mask and range-check problems are.

use crate::constraint::Eval;
use crate::debug::{AttemptRecord, DebugSink, Strategy, StrategyOutcome, StrategyReport};
use crate::rng::Rng;
use crate::value::Assignment;

use super::SolveCtx;

pub(crate) fn solve_naive(
    ctx: &SolveCtx<'_>,
    rng: &mut Rng,
    sink: &mut DebugSink,
) -> Option<Assignment> {
    let max_iterations = ctx.problem.max_iterations();
    let variables: Vec<String> = ctx
        .problem
        .vars()
        .iter()
        .map(|v| v.name().to_string())
        .collect();
    let tuples: Vec<Vec<String>> = ctx
        .constraints
        .iter()
        .map(|c| c.vars().to_vec())
        .collect();
    let fail = sink.begin_fail(Some(Strategy::Naive), variables, tuples);

    for attempt in 0..max_iterations {
        let mut values = ctx.fixed.clone();
        let mut failing: Vec<Vec<String>> = Vec::new();
        let mut faults: Vec<String> = Vec::new();

        for var in ctx.problem.vars() {
            if values.contains_key(var.name()) {
                continue; // fixed for this call
            }
            let draw = var.draw(
                rng,
                max_iterations,
                ctx.temp_scalar_for(var.name()),
                ctx.temp_list_for(var.name()),
            );
            if !draw.satisfied {
                failing.push(vec![var.name().to_string()]);
            }
            values.insert(var.name().to_string(), draw.value);
        }

        for &constraint in &ctx.constraints {
            match ctx.eval_constraint(constraint, &values) {
                Eval::Pass => {}
                Eval::Fail => failing.push(constraint.vars().to_vec()),
                Eval::Fault(message) => {
                    failing.push(constraint.vars().to_vec());
                    faults.push(message);
                }
            }
        }

        if failing.is_empty() {
            return Some(values);
        }
        sink.attempt(
            fail,
            AttemptRecord {
                attempt,
                values,
                failing,
                faults,
            },
        );
    }

    sink.report(StrategyReport {
        strategy: Strategy::Naive,
        iterations: max_iterations,
        width: None,
        outcome: StrategyOutcome::Exhausted,
    });
    None
}
