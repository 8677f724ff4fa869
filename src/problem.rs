//! Problem model: the variables, cross-variable constraints and tuning
//! for one randomization problem.
//!
//! Variables keep their insertion order; together with the constraint
//! order and the seed, that order uniquely determines the produced
//! assignment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraint::{wrap_list, wrap_scalar, MultiConstraint, MultiPredicate};
use crate::error::BuildError;
use crate::var::{RandVar, VarSpec};

/// Default cap on failed attempts before a strategy gives up. Large
/// enough that typical problems converge well under 100 ms.
pub const MAX_ITERATIONS: usize = 100;

/// Default cap on the product of enumerated domain sizes handed to a
/// constraint satisfaction search. Larger improves convergence, hurts
/// throughput.
pub const MAX_DOMAIN_SIZE: u128 = 1 << 10;

/// Per-strategy enable flags. Strategies always run in the order naive,
/// sparse, thorough; a disabled strategy is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverFlags {
    pub naive: bool,
    pub sparse: bool,
    pub thorough: bool,
}

impl Default for SolverFlags {
    fn default() -> Self {
        Self {
            naive: true,
            sparse: true,
            thorough: true,
        }
    }
}

/// One randomization problem over multiple variables.
#[derive(Debug)]
pub struct MultiVarProblem {
    vars: Vec<RandVar>,
    index: BTreeMap<String, usize>,
    constraints: Vec<MultiConstraint>,
    max_iterations: usize,
    max_domain_size: u128,
    flags: SolverFlags,
}

impl MultiVarProblem {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            index: BTreeMap::new(),
            constraints: Vec::new(),
            max_iterations: MAX_ITERATIONS,
            max_domain_size: MAX_DOMAIN_SIZE,
            flags: SolverFlags::default(),
        }
    }

    /// Add a variable. Configuration problems surface here, never at
    /// `randomize` time.
    pub fn add_var(&mut self, name: &str, spec: VarSpec) -> Result<(), BuildError> {
        if self.index.contains_key(name) {
            return Err(BuildError::DuplicateVariable(name.to_string()));
        }
        let var = RandVar::build(name, spec)?;
        self.index.insert(name.to_string(), self.vars.len());
        self.vars.push(var);
        Ok(())
    }

    /// Add a constraint over one or more variables. A single-name tuple
    /// attaches to the variable itself; list variables receive it as a
    /// whole-list constraint.
    pub fn add_constraint(&mut self, pred: MultiPredicate, vars: &[&str]) -> Result<(), BuildError> {
        if vars.is_empty() {
            return Err(BuildError::EmptyVariableTuple);
        }
        for name in vars {
            if !self.index.contains_key(*name) {
                return Err(BuildError::UnknownVariable(name.to_string()));
            }
        }
        if vars.len() == 1 {
            let idx = self.index[vars[0]];
            let var = &mut self.vars[idx];
            if var.is_list() {
                var.add_list_constraint(wrap_list(pred));
            } else {
                var.add_scalar_constraint(wrap_scalar(pred));
            }
        } else {
            self.constraints.push(MultiConstraint::new(
                pred,
                vars.iter().map(|s| s.to_string()).collect(),
            ));
        }
        Ok(())
    }

    /// Enable or disable individual solver strategies; `None` leaves a
    /// flag unchanged.
    pub fn set_solver_mode(
        &mut self,
        naive: Option<bool>,
        sparse: Option<bool>,
        thorough: Option<bool>,
    ) {
        if let Some(naive) = naive {
            self.flags.naive = naive;
        }
        if let Some(sparse) = sparse {
            self.flags.sparse = sparse;
        }
        if let Some(thorough) = thorough {
            self.flags.thorough = thorough;
        }
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    pub fn set_max_domain_size(&mut self, max_domain_size: u128) {
        self.max_domain_size = max_domain_size;
    }

    pub fn flags(&self) -> SolverFlags {
        self.flags
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn max_domain_size(&self) -> u128 {
        self.max_domain_size
    }

    /// Variables in insertion order.
    pub fn vars(&self) -> &[RandVar] {
        &self.vars
    }

    pub fn var(&self, name: &str) -> Option<&RandVar> {
        self.index.get(name).map(|&idx| &self.vars[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Multi-variable constraints in insertion order.
    pub fn constraints(&self) -> &[MultiConstraint] {
        &self.constraints
    }
}

impl Default for MultiVarProblem {
    fn default() -> Self {
        Self::new()
    }
}
