//! Declarative, SystemVerilog-style constrained randomization.
//!
//! Declare random variables with domains and predicates; the engine
//! produces concrete assignments satisfying every predicate,
//! deterministically from a seed. Built for hardware-verification
//! testbenches: repeatable seeding is a hard contract, and throughput is
//! high enough for production simulation loops on realistic
//! opcode-shaped problems.
//!
//! Three solver strategies compose in a fallback pipeline (naive
//! rejection sampling, a sparse group-ordered search, and a thorough
//! exhaustive enumeration), each bounded by per-problem tuning. See the
//! [`solver`] module for the pipeline and [`RandObj`] for the user-facing
//! surface.
//!
//! ```
//! use constrainedrandom::{unique, RandObj, VarSpec};
//!
//! let mut obj = RandObj::new(0);
//! obj.add_rand_var(
//!     "regs",
//!     VarSpec::range(0, 32).length(4).list_constraint(|l| unique(l)),
//! )
//! .unwrap();
//! obj.randomize().unwrap();
//! assert_eq!(obj.get_list("regs").unwrap().len(), 4);
//! ```

pub mod bits;
pub mod constraint;
pub mod debug;
pub mod domain;
pub mod error;
pub mod problem;
pub mod randobj;
pub mod rng;
pub mod solver;
pub mod value;
pub mod var;

pub use constraint::{unique, MultiConstraint};
pub use debug::{RandomizationDebugInfo, Strategy, StrategyOutcome, StrategyReport};
pub use domain::{DistEntry, Domain};
pub use error::{BuildError, RandomizationError};
pub use problem::{MultiVarProblem, SolverFlags, MAX_DOMAIN_SIZE, MAX_ITERATIONS};
pub use randobj::RandObj;
pub use rng::Rng;
pub use solver::{solve, SolveOptions};
pub use value::{Assignment, Value};
pub use var::{RandVar, VarSpec};
