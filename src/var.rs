//! Variable model: domain specification plus per-variable sampling.
//!
//! A `RandVar` produces candidate values on a best-effort basis: it honors
//! its domain exactly and retries a bounded number of times against its
//! own scalar and list constraints, reporting with each draw whether they
//! all held. Deciding what to do with an unsatisfying draw is the solver
//! layer's job.

use std::fmt;
use std::sync::Arc;

use crate::constraint::{eval_list, eval_scalar, ListPredicate, ScalarPredicate};
use crate::domain::{Dist, DistEntry, Domain};
use crate::error::BuildError;
use crate::rng::Rng;
use crate::value::Value;

/// Whole-list retry bound when drawing a list variable that carries list
/// constraints. A few quick chances; tight coupling is the solver's job.
const LIST_DRAW_RETRIES: usize = 10;

/// Attempt multiplier when collecting distinct candidates by sampling
/// from large or opaque domains.
const CANDIDATE_OVERSAMPLE: usize = 10;

enum SpecDomain {
    Ready(Domain),
    /// Raw weighted entries; validated when the variable is built so the
    /// error surfaces at `add_rand_var`.
    Weighted(Vec<(DistEntry, u64)>),
}

/// Declarative specification for one random variable.
///
/// Each constructor fixes the domain shape, so "both `bits` and `domain`"
/// style misconfiguration is unrepresentable; the remaining checks run
/// when the variable is added.
pub struct VarSpec {
    domain: SpecDomain,
    constraints: Vec<ScalarPredicate>,
    list_constraints: Vec<ListPredicate>,
    length: usize,
    order: i32,
    initial: Option<Value>,
}

impl VarSpec {
    fn with_domain(domain: SpecDomain) -> Self {
        Self {
            domain,
            constraints: Vec::new(),
            list_constraints: Vec::new(),
            length: 0,
            order: 0,
            initial: None,
        }
    }

    /// Values `[0, 2^width)`. `width` is at most 63.
    pub fn bits(width: u32) -> Self {
        Self::with_domain(SpecDomain::Ready(Domain::Bits(width)))
    }

    /// Values in the half-open range `[lo, hi)`.
    pub fn range(lo: i64, hi: i64) -> Self {
        Self::with_domain(SpecDomain::Ready(Domain::Range(lo, hi)))
    }

    /// Values from a finite sequence, uniform.
    pub fn values(values: &[i64]) -> Self {
        Self::with_domain(SpecDomain::Ready(Domain::Values(values.to_vec())))
    }

    /// Values from weighted `(entry, weight)` pairs.
    pub fn weighted(entries: &[(DistEntry, u64)]) -> Self {
        Self::with_domain(SpecDomain::Weighted(entries.to_vec()))
    }

    /// Values produced by an opaque callable. The callable receives the
    /// shared random source and must draw from it for reproducibility.
    pub fn func(f: impl Fn(&mut Rng) -> i64 + Send + Sync + 'static) -> Self {
        Self::with_domain(SpecDomain::Ready(Domain::Function(Arc::new(f))))
    }

    /// Add a predicate over each candidate scalar value.
    pub fn constraint(mut self, f: impl Fn(i64) -> bool + Send + Sync + 'static) -> Self {
        self.constraints.push(Arc::new(f));
        self
    }

    /// Add a predicate over the whole list value. Only meaningful with a
    /// `length` greater than zero.
    pub fn list_constraint(mut self, f: impl Fn(&[i64]) -> bool + Send + Sync + 'static) -> Self {
        self.list_constraints.push(Arc::new(f));
        self
    }

    /// Make this a list variable of `length` elements. Zero means scalar.
    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Solution-order hint: smaller orders are solved first by the sparse
    /// strategy.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Value visible before the first successful randomization.
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }
}

/// One draw: the candidate value and whether every local constraint held.
pub(crate) struct Draw {
    pub value: Value,
    pub satisfied: bool,
}

/// A randomizable variable. Immutable once the problem starts solving;
/// constraint lists are append-only before that.
pub struct RandVar {
    name: String,
    domain: Domain,
    length: usize,
    constraints: Vec<ScalarPredicate>,
    list_constraints: Vec<ListPredicate>,
    order: i32,
    initial: Option<Value>,
}

impl RandVar {
    pub(crate) fn build(name: &str, spec: VarSpec) -> Result<Self, BuildError> {
        let domain = match spec.domain {
            SpecDomain::Ready(domain) => {
                domain.validate(name)?;
                domain
            }
            SpecDomain::Weighted(entries) => Domain::Weighted(Dist::new(entries)?),
        };
        if spec.length == 0 && !spec.list_constraints.is_empty() {
            return Err(BuildError::ListConstraintOnScalar(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            domain,
            length: spec.length,
            constraints: spec.constraints,
            list_constraints: spec.list_constraints,
            order: spec.order,
            initial: spec.initial,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn is_list(&self) -> bool {
        self.length > 0
    }

    pub(crate) fn initial(&self) -> Option<&Value> {
        self.initial.as_ref()
    }

    pub(crate) fn add_scalar_constraint(&mut self, pred: ScalarPredicate) {
        self.constraints.push(pred);
    }

    pub(crate) fn add_list_constraint(&mut self, pred: ListPredicate) {
        self.list_constraints.push(pred);
    }

    pub(crate) fn is_enumerable(&self) -> bool {
        self.domain.is_enumerable()
    }

    /// Total domain size accounting for list length (`size^length`).
    /// `None` when the domain is opaque or the product overflows.
    pub(crate) fn domain_size(&self) -> Option<u128> {
        let base = self.domain.size()?;
        if self.length <= 1 {
            Some(base)
        } else {
            base.checked_pow(self.length as u32)
        }
    }

    /// Produce one candidate value, retrying against local constraints.
    pub(crate) fn draw(
        &self,
        rng: &mut Rng,
        retries: usize,
        temp_scalar: &[ScalarPredicate],
        temp_list: &[ListPredicate],
    ) -> Draw {
        if self.is_list() {
            let (values, satisfied) = self.draw_list(rng, retries, temp_scalar, temp_list);
            Draw {
                value: Value::List(values),
                satisfied,
            }
        } else {
            let (value, satisfied) = self.draw_scalar(rng, retries, temp_scalar);
            Draw {
                value: Value::Int(value),
                satisfied,
            }
        }
    }

    fn scalar_ok(&self, value: i64, temp: &[ScalarPredicate]) -> bool {
        self.constraints
            .iter()
            .chain(temp.iter())
            .all(|pred| eval_scalar(pred, value).passed())
    }

    fn list_ok(&self, values: &[i64], temp: &[ListPredicate]) -> bool {
        self.list_constraints
            .iter()
            .chain(temp.iter())
            .all(|pred| eval_list(pred, values).passed())
    }

    fn draw_scalar(&self, rng: &mut Rng, retries: usize, temp: &[ScalarPredicate]) -> (i64, bool) {
        let mut value = self.domain.sample(rng);
        if self.constraints.is_empty() && temp.is_empty() {
            return (value, true);
        }
        let mut ok = self.scalar_ok(value, temp);
        let mut attempts = 0;
        while !ok && attempts < retries {
            value = self.domain.sample(rng);
            ok = self.scalar_ok(value, temp);
            attempts += 1;
        }
        (value, ok)
    }

    fn draw_list(
        &self,
        rng: &mut Rng,
        retries: usize,
        temp_scalar: &[ScalarPredicate],
        temp_list: &[ListPredicate],
    ) -> (Vec<i64>, bool) {
        let mut attempt = 0;
        loop {
            let mut elements_ok = true;
            let mut values = Vec::with_capacity(self.length);
            for _ in 0..self.length {
                let (value, ok) = self.draw_scalar(rng, retries, temp_scalar);
                elements_ok &= ok;
                values.push(value);
            }
            // List constraints are checked against the finished list, not
            // element by element: checking as we go would skew selection
            // (a sum constraint enforced per element collapses the list).
            let satisfied = elements_ok && self.list_ok(&values, temp_list);
            if satisfied || attempt >= LIST_DRAW_RETRIES {
                return (values, satisfied);
            }
            attempt += 1;
        }
    }

    /// Up to `k` distinct values satisfying this variable's own (and
    /// temporary) constraints: full enumeration when the domain fits in
    /// `k`, bounded sampling plus filtering otherwise.
    pub(crate) fn candidates(
        &self,
        k: usize,
        rng: &mut Rng,
        temp_scalar: &[ScalarPredicate],
        temp_list: &[ListPredicate],
    ) -> Vec<Value> {
        if k == 0 {
            return Vec::new();
        }
        if self.is_list() {
            return self.list_candidates(k, rng, temp_scalar, temp_list);
        }
        match self.domain.size() {
            Some(size) if size <= k as u128 => self
                .domain
                .enumerate(k)
                .into_iter()
                .filter(|v| self.scalar_ok(*v, temp_scalar))
                .map(Value::Int)
                .collect(),
            _ => {
                let mut out: Vec<i64> = Vec::new();
                for _ in 0..k.saturating_mul(CANDIDATE_OVERSAMPLE) {
                    if out.len() >= k {
                        break;
                    }
                    let value = self.domain.sample(rng);
                    if !out.contains(&value) && self.scalar_ok(value, temp_scalar) {
                        out.push(value);
                    }
                }
                out.into_iter().map(Value::Int).collect()
            }
        }
    }

    fn list_candidates(
        &self,
        k: usize,
        rng: &mut Rng,
        temp_scalar: &[ScalarPredicate],
        temp_list: &[ListPredicate],
    ) -> Vec<Value> {
        let mut out: Vec<Vec<i64>> = Vec::new();
        for _ in 0..k.saturating_mul(CANDIDATE_OVERSAMPLE) {
            if out.len() >= k {
                break;
            }
            let (values, satisfied) =
                self.draw_list(rng, LIST_DRAW_RETRIES, temp_scalar, temp_list);
            if satisfied && !out.contains(&values) {
                out.push(values);
            }
        }
        out.into_iter().map(Value::List).collect()
    }

    /// The complete filtered domain, for exhaustive solving. For list
    /// variables this is the cartesian product of the filtered scalar
    /// domain, filtered again by list constraints. `None` when the domain
    /// is not enumerable. Callers must bound the product size first.
    pub(crate) fn enumerate_all(
        &self,
        temp_scalar: &[ScalarPredicate],
        temp_list: &[ListPredicate],
    ) -> Option<Vec<Value>> {
        let size = self.domain.size()?;
        let limit = size.min(usize::MAX as u128) as usize;
        let scalars: Vec<i64> = self
            .domain
            .enumerate(limit)
            .into_iter()
            .filter(|v| self.scalar_ok(*v, temp_scalar))
            .collect();
        if !self.is_list() {
            return Some(scalars.into_iter().map(Value::Int).collect());
        }
        if scalars.is_empty() {
            return Some(Vec::new());
        }
        // Odometer over the filtered scalar domain.
        let n = scalars.len();
        let mut idx = vec![0usize; self.length];
        let mut out = Vec::new();
        loop {
            let tuple: Vec<i64> = idx.iter().map(|&i| scalars[i]).collect();
            if self.list_ok(&tuple, temp_list) {
                out.push(Value::List(tuple));
            }
            let mut d = self.length;
            loop {
                if d == 0 {
                    return Some(out);
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < n {
                    break;
                }
                idx[d] = 0;
            }
        }
    }
}

impl fmt::Debug for RandVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandVar")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("length", &self.length)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
