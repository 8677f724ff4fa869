//! Sparse strategy: layered, bounded search over order-grouped variables.
//!
//! A rejection sampler with memory. Variables partition into groups by
//! ascending `order` hint; earlier groups are fixed before later groups
//! begin, and each multi-variable constraint is evaluated at the earliest
//! group where all of its variables are available. Within a group, each
//! variable contributes a small shuffled candidate set and a depth-first
//! search walks the product space, pruning on the first violation. When a
//! group is stuck its candidate quotas widen; when widening is exhausted
//! the previous group is asked for a fresh combination.

use std::collections::BTreeMap;

use crate::constraint::MultiConstraint;
use crate::debug::{AttemptRecord, DebugSink, Strategy, StrategyOutcome, StrategyReport};
use crate::rng::Rng;
use crate::value::{Assignment, Value};
use crate::var::RandVar;

use super::SolveCtx;

/// One order-group: its variables (insertion order, which is also DFS
/// depth order) and the constraints that become checkable here, tagged
/// with the depth at which their last group-local variable binds.
struct GroupPlan<'p> {
    vars: Vec<&'p RandVar>,
    checks: Vec<(&'p MultiConstraint, usize)>,
}

pub(crate) fn solve_sparse(
    ctx: &SolveCtx<'_>,
    rng: &mut Rng,
    sink: &mut DebugSink,
) -> Option<Assignment> {
    let plans = plan_groups(ctx);
    if plans.is_empty() {
        // Every variable fixed; fully-fixed constraints were checked by
        // the pipeline already.
        return Some(ctx.fixed.clone());
    }

    let max_iterations = ctx.problem.max_iterations();
    // Matches the per-attempt budget the widening ladder expects: failing
    // individual group attempts quickly prunes the state tree.
    let group_retries = max_iterations / 10 + 1;

    let variables: Vec<String> = plans
        .iter()
        .flat_map(|plan| plan.vars.iter().map(|v| v.name().to_string()))
        .collect();
    let tuples: Vec<Vec<String>> = ctx.constraints.iter().map(|c| c.vars().to_vec()).collect();
    let fail = sink.begin_fail(Some(Strategy::Sparse), variables, tuples);

    let mut total_visits = 0usize;
    let mut width_reached = 1usize;
    let mut deepest = ctx.fixed.clone();
    // Global cap on group solves, so backtracking cannot run away.
    let mut rounds_left = max_iterations;

    let mut stack: Vec<Vec<(String, Value)>> = Vec::new();
    let mut retries: Vec<usize> = vec![group_retries; plans.len()];
    let mut group = 0usize;
    let mut failed = false;

    'solve: while group < plans.len() {
        if rounds_left == 0 {
            failed = true;
            break;
        }
        rounds_left -= 1;

        let solved = assemble(ctx.fixed, &stack);
        let solution = solve_group(
            &plans[group],
            &solved,
            ctx,
            rng,
            max_iterations,
            &mut total_visits,
            &mut width_reached,
            &mut deepest,
        );
        match solution {
            Some(values) => {
                stack.push(values);
                group += 1;
            }
            None => {
                // The first group has nothing to backtrack into; burn its
                // own retry budget on fresh attempts instead.
                if group == 0 {
                    if retries[0] == 0 {
                        failed = true;
                        break 'solve;
                    }
                    retries[0] -= 1;
                    continue;
                }
                // Backtrack: abandon the previous group's combination and
                // ask it for a fresh one.
                loop {
                    if group == 0 {
                        failed = true;
                        break 'solve;
                    }
                    group -= 1;
                    stack.pop();
                    if retries[group] > 0 {
                        retries[group] -= 1;
                        break;
                    }
                }
                // Later groups start over with a fresh retry budget.
                for retry in retries[group + 1..].iter_mut() {
                    *retry = group_retries;
                }
            }
        }
    }

    if !failed {
        return Some(assemble(ctx.fixed, &stack));
    }

    sink.attempt(
        fail,
        AttemptRecord {
            attempt: total_visits,
            values: deepest,
            failing: Vec::new(),
            faults: Vec::new(),
        },
    );
    sink.report(StrategyReport {
        strategy: Strategy::Sparse,
        iterations: total_visits,
        width: Some(width_reached),
        outcome: StrategyOutcome::Exhausted,
    });
    None
}

fn assemble(fixed: &Assignment, stack: &[Vec<(String, Value)>]) -> Assignment {
    let mut out = fixed.clone();
    for group in stack {
        for (name, value) in group {
            out.insert(name.clone(), value.clone());
        }
    }
    out
}

/// Partition non-fixed variables into order-groups and attach each
/// constraint to the earliest group where its whole tuple is available.
fn plan_groups<'p>(ctx: &SolveCtx<'p>) -> Vec<GroupPlan<'p>> {
    let mut vars: Vec<&RandVar> = ctx
        .problem
        .vars()
        .iter()
        .filter(|v| !ctx.fixed.contains_key(v.name()))
        .collect();
    // Stable sort: insertion order survives within equal orders.
    vars.sort_by_key(|v| v.order());

    let mut plans: Vec<GroupPlan<'p>> = Vec::new();
    for var in vars {
        match plans.last_mut() {
            Some(plan) if plan.vars[0].order() == var.order() => plan.vars.push(var),
            _ => plans.push(GroupPlan {
                vars: vec![var],
                checks: Vec::new(),
            }),
        }
    }

    let mut location: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (group_idx, plan) in plans.iter().enumerate() {
        for (depth, var) in plan.vars.iter().enumerate() {
            location.insert(var.name(), (group_idx, depth));
        }
    }

    for &constraint in &ctx.constraints {
        // The binding point is the latest group (and depth within it)
        // among the constraint's non-fixed variables; fully-fixed
        // constraints are the pipeline's concern.
        let mut binding: Option<(usize, usize)> = None;
        for name in constraint.vars() {
            if ctx.fixed.contains_key(name) {
                continue;
            }
            if let Some(&(group_idx, depth)) = location.get(name.as_str()) {
                binding = Some(match binding {
                    None => (group_idx, depth),
                    Some((best_group, best_depth)) => {
                        if group_idx > best_group {
                            (group_idx, depth)
                        } else if group_idx == best_group {
                            (group_idx, best_depth.max(depth))
                        } else {
                            (best_group, best_depth)
                        }
                    }
                });
            }
        }
        if let Some((group_idx, depth)) = binding {
            plans[group_idx].checks.push((constraint, depth));
        }
    }

    plans
}

/// Solve one group against already-solved context, widening the candidate
/// quotas until the product cap is reached.
#[allow(clippy::too_many_arguments)]
fn solve_group<'p>(
    plan: &GroupPlan<'p>,
    solved: &Assignment,
    ctx: &SolveCtx<'p>,
    rng: &mut Rng,
    max_iterations: usize,
    total_visits: &mut usize,
    width_reached: &mut usize,
    deepest: &mut Assignment,
) -> Option<Vec<(String, Value)>> {
    let max_product = ctx.problem.max_domain_size();
    let sizes: Vec<u128> = plan
        .vars
        .iter()
        .map(|v| v.domain_size().unwrap_or(u128::MAX))
        .collect();

    let mut base = 1usize;
    loop {
        let quotas = distribute_quotas(&sizes, base, max_product);
        if let Some(&widest) = quotas.iter().max() {
            *width_reached = (*width_reached).max(widest);
        }

        let mut candidates: Vec<Vec<Value>> = Vec::with_capacity(plan.vars.len());
        let mut starved = false;
        for (var, &quota) in plan.vars.iter().zip(&quotas) {
            let mut values = var.candidates(
                quota,
                rng,
                ctx.temp_scalar_for(var.name()),
                ctx.temp_list_for(var.name()),
            );
            if values.is_empty() {
                // A scalar variable whose whole domain was enumerated and
                // filtered to nothing can never produce a candidate.
                let exhausted_domain =
                    !var.is_list() && var.domain_size().map_or(false, |s| s <= quota as u128);
                if exhausted_domain {
                    return None;
                }
                starved = true;
                break;
            }
            rng.shuffle(&mut values);
            candidates.push(values);
        }

        if !starved {
            let mut partial = solved.clone();
            let mut visits = 0usize;
            let mut budget_hit = false;
            let found = dfs(
                plan,
                &candidates,
                0,
                &mut partial,
                ctx,
                max_iterations,
                &mut visits,
                &mut budget_hit,
                deepest,
            );
            *total_visits += visits;
            if found.is_some() {
                return found;
            }
            // A fully-enumerated product searched to completion cannot be
            // improved by widening or resampling.
            let complete = plan
                .vars
                .iter()
                .zip(&quotas)
                .all(|(var, &quota)| {
                    !var.is_list() && var.domain_size().map_or(false, |s| s <= quota as u128)
                });
            if complete && !budget_hit {
                return None;
            }
        }

        base = base.saturating_mul(2);
        if base as u128 > max_product {
            return None;
        }
    }
}

/// Depth-first walk of the group's candidate product. Evaluates each
/// constraint at the depth its last variable binds; prunes on violation.
#[allow(clippy::too_many_arguments)]
fn dfs<'p>(
    plan: &GroupPlan<'p>,
    candidates: &[Vec<Value>],
    depth: usize,
    partial: &mut Assignment,
    ctx: &SolveCtx<'p>,
    max_visits: usize,
    visits: &mut usize,
    budget_hit: &mut bool,
    deepest: &mut Assignment,
) -> Option<Vec<(String, Value)>> {
    if depth == plan.vars.len() {
        return Some(
            plan.vars
                .iter()
                .map(|v| (v.name().to_string(), partial[v.name()].clone()))
                .collect(),
        );
    }
    let name = plan.vars[depth].name();
    for value in &candidates[depth] {
        if *visits >= max_visits {
            *budget_hit = true;
            return None;
        }
        *visits += 1;
        partial.insert(name.to_string(), value.clone());
        if partial.len() > deepest.len() {
            *deepest = partial.clone();
        }
        let pruned = plan
            .checks
            .iter()
            .any(|&(constraint, check_depth)| {
                check_depth == depth && !ctx.eval_constraint(constraint, partial).passed()
            });
        if !pruned {
            let found = dfs(
                plan,
                candidates,
                depth + 1,
                partial,
                ctx,
                max_visits,
                visits,
                budget_hit,
                deepest,
            );
            if found.is_some() {
                return found;
            }
            if *budget_hit {
                return None;
            }
        }
    }
    partial.remove(name);
    None
}

/// Split the candidate budget across group variables: every variable gets
/// at least one candidate, larger domains keep more, and the quota product
/// stays within `max_product`.
fn distribute_quotas(sizes: &[u128], base: usize, max_product: u128) -> Vec<usize> {
    let mut quotas: Vec<usize> = sizes
        .iter()
        .map(|&size| (base as u128).min(size).max(1) as usize)
        .collect();
    loop {
        let product = quotas
            .iter()
            .fold(1u128, |acc, &q| acc.saturating_mul(q as u128));
        if product <= max_product {
            break;
        }
        // Shrink the smallest domain still above one candidate; among
        // equals, the one with the largest quota, so ties stay balanced.
        let mut pick: Option<usize> = None;
        for (i, &quota) in quotas.iter().enumerate() {
            if quota <= 1 {
                continue;
            }
            let better = match pick {
                None => true,
                Some(p) => {
                    sizes[i] < sizes[p] || (sizes[i] == sizes[p] && quota > quotas[p])
                }
            };
            if better {
                pick = Some(i);
            }
        }
        match pick {
            Some(i) => quotas[i] /= 2,
            None => break,
        }
    }
    quotas
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::problem::MultiVarProblem;
    use crate::rng::Rng;
    use crate::solver::{solve, SolveOptions};
    use crate::value::Value;
    use crate::var::VarSpec;

    use super::distribute_quotas;

    fn sparse_only(problem: &mut MultiVarProblem) {
        problem.set_solver_mode(Some(false), Some(true), Some(false));
    }

    #[test]
    fn test_quota_distribution_floors_at_one() {
        let quotas = distribute_quotas(&[2, 1_000_000, 3], 16, 64);
        assert!(quotas.iter().all(|&q| q >= 1));
        let product: u128 = quotas.iter().map(|&q| q as u128).product();
        assert!(product <= 64);
        // The huge domain keeps the largest share.
        assert!(quotas[1] >= quotas[0] && quotas[1] >= quotas[2]);
    }

    #[test]
    fn test_quota_distribution_caps_at_domain_size() {
        let quotas = distribute_quotas(&[4, 8], 32, 1024);
        assert_eq!(quotas, vec![4, 8]);
    }

    #[test]
    fn test_ordered_plus_one_problem() {
        let mut problem = MultiVarProblem::new();
        sparse_only(&mut problem);
        problem.add_var("x", VarSpec::range(0, 100)).unwrap();
        problem
            .add_var("y", VarSpec::range(0, 100).order(1))
            .unwrap();
        problem
            .add_constraint(
                Arc::new(|args: &[Value]| {
                    args[1].as_int().unwrap() == args[0].as_int().unwrap() + 1
                }),
                &["x", "y"],
            )
            .unwrap();
        let mut rng = Rng::new(0);
        for _ in 0..5 {
            let solution = solve(&problem, &mut rng, &SolveOptions::new()).unwrap();
            assert_eq!(
                solution["y"].as_int().unwrap(),
                solution["x"].as_int().unwrap() + 1
            );
        }
    }

    #[test]
    fn test_constraint_seen_by_latest_group() {
        // wb and src0 solve before dst0; the constraint binds at dst0.
        let mut problem = MultiVarProblem::new();
        sparse_only(&mut problem);
        problem.add_var("src0", VarSpec::bits(5)).unwrap();
        problem.add_var("wb", VarSpec::bits(1)).unwrap();
        problem
            .add_var("dst0", VarSpec::bits(5).order(1))
            .unwrap();
        problem
            .add_constraint(
                Arc::new(|args: &[Value]| {
                    let (wb, dst0, src0) = (
                        args[0].as_int().unwrap(),
                        args[1].as_int().unwrap(),
                        args[2].as_int().unwrap(),
                    );
                    wb == 0 || dst0 != src0
                }),
                &["wb", "dst0", "src0"],
            )
            .unwrap();
        let mut rng = Rng::new(0);
        for _ in 0..20 {
            let solution = solve(&problem, &mut rng, &SolveOptions::new()).unwrap();
            if solution["wb"].as_int().unwrap() == 1 {
                assert_ne!(solution["dst0"], solution["src0"]);
            }
        }
    }

    #[test]
    fn test_backtracks_across_groups() {
        // Group 0 must avoid 0 and 1 for group 1 to have any solution;
        // only backtracking into group 0 can discover that.
        let mut problem = MultiVarProblem::new();
        sparse_only(&mut problem);
        problem.add_var("a", VarSpec::range(0, 10)).unwrap();
        problem
            .add_var("b", VarSpec::range(0, 10).order(1))
            .unwrap();
        problem
            .add_constraint(
                Arc::new(|args: &[Value]| {
                    args[0].as_int().unwrap() >= 2
                        && args[1].as_int().unwrap() == args[0].as_int().unwrap() - 2
                }),
                &["a", "b"],
            )
            .unwrap();
        let mut rng = Rng::new(0);
        let solution = solve(&problem, &mut rng, &SolveOptions::new()).unwrap();
        let a = solution["a"].as_int().unwrap();
        let b = solution["b"].as_int().unwrap();
        assert!(a >= 2 && b == a - 2);
    }

    #[test]
    fn test_sparse_failure_records_deepest_partial() {
        let mut problem = MultiVarProblem::new();
        sparse_only(&mut problem);
        problem.add_var("a", VarSpec::range(0, 10)).unwrap();
        problem
            .add_var("b", VarSpec::range(0, 10).order(1))
            .unwrap();
        problem
            .add_constraint(
                Arc::new(|args: &[Value]| {
                    args[0].as_int().unwrap() + args[1].as_int().unwrap() > 100
                }),
                &["a", "b"],
            )
            .unwrap();
        let mut rng = Rng::new(0);
        let err = solve(&problem, &mut rng, &SolveOptions::new()).unwrap_err();
        let fail = err
            .debug_info
            .failures
            .iter()
            .find(|f| f.strategy == Some(crate::debug::Strategy::Sparse))
            .unwrap();
        assert!(!fail.attempts.is_empty());
        assert!(!fail.attempts[0].values.is_empty());
    }
}
