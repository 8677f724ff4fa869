//! Concrete values produced by randomization.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete value for one random variable: a scalar, or a fixed-length
/// list of scalars for list variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    List(Vec<i64>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[i64]> {
        match self {
            Value::Int(_) => None,
            Value::List(v) => Some(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::List(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A complete mapping from variable name to concrete value.
///
/// `BTreeMap` keeps iteration order deterministic, which is part of the
/// seed-reproducibility contract.
pub type Assignment = BTreeMap<String, Value>;
