//! Error types.
//!
//! Configuration problems are fatal at build time (`BuildError`, surfaced
//! immediately by `add_*`). Solve-time problems produce exactly one
//! `RandomizationError` per `randomize` call, carrying structured
//! diagnostics; nothing else escapes the solver.

use thiserror::Error;

use crate::debug::RandomizationDebugInfo;

/// A variable or constraint was configured incompatibly.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("random variable '{0}' already exists")]
    DuplicateVariable(String),

    #[error("constraint references unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("constraint must reference at least one variable")]
    EmptyVariableTuple,

    #[error("bit width {0} exceeds the supported maximum of 63")]
    BitsTooWide(u32),

    #[error("domain for variable '{0}' is empty")]
    EmptyDomain(String),

    #[error("range domain for variable '{name}' is empty ({lo}..{hi})")]
    EmptyRange { name: String, lo: i64, hi: i64 },

    #[error("weighted domain has no entries")]
    EmptyDist,

    #[error("weighted domain weights must be positive")]
    ZeroWeight,

    #[error("weighted domain entry {lo}..{hi} is an empty range")]
    EmptyDistRange { lo: i64, hi: i64 },

    #[error("weighted domain weights overflow")]
    WeightOverflow,

    #[error("list constraints given for scalar variable '{0}'")]
    ListConstraintOnScalar(String),
}

/// A randomization attempt failed: every enabled strategy was exhausted,
/// or a per-call override was invalid.
#[derive(Debug, Error)]
#[error("{message}\n{debug_info}")]
pub struct RandomizationError {
    pub message: String,
    pub debug_info: RandomizationDebugInfo,
}

impl RandomizationError {
    pub(crate) fn new(message: impl Into<String>, debug_info: RandomizationDebugInfo) -> Self {
        Self {
            message: message.into(),
            debug_info,
        }
    }
}
