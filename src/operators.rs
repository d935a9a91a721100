// Operator registry
// Argument counts for every operator the decoder knows by name

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::ast::{ArrayOp, ComparisonOp, SpatialOp, TemporalOp};

pub const NOT: &str = "not";
pub const AND: &str = "and";
pub const OR: &str = "or";
pub const LIKE: &str = "like";
pub const BETWEEN: &str = "between";
pub const IN: &str = "in";
pub const IS_NULL: &str = "isNull";
pub const CASEI: &str = "casei";
pub const ACCENTI: &str = "accenti";

/// Number of arguments an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    /// Unregistered operators, decoded as generic functions
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Fixed-arity operators in declaration order. Read-only after first use.
static FIXED_ARITY: LazyLock<IndexMap<&'static str, usize>> = LazyLock::new(|| {
    let mut table: IndexMap<&'static str, usize> = [
        (NOT, 1),
        (LIKE, 2),
        (BETWEEN, 3),
        (IN, 2),
        (IS_NULL, 1),
        (CASEI, 1),
        (ACCENTI, 1),
    ]
    .into_iter()
    .collect();

    table.extend(ComparisonOp::ALL.iter().map(|op| (op.as_str(), 2)));
    table.extend(ArrayOp::ALL.iter().map(|op| (op.as_str(), 2)));
    table.extend(SpatialOp::ALL.iter().map(|op| (op.as_str(), 2)));
    table.extend(TemporalOp::ALL.iter().map(|op| (op.as_str(), 2)));
    table
});

/// Look up how many arguments `name` takes
pub fn arity(name: &str) -> Arity {
    if let Some(&count) = FIXED_ARITY.get(name) {
        return Arity::Exactly(count);
    }
    match name {
        AND | OR => Arity::AtLeast(2),
        _ => Arity::Any,
    }
}

/// Whether `name` is a built-in operator rather than an extension function
pub fn is_registered(name: &str) -> bool {
    !matches!(arity(name), Arity::Any)
}

/// All fixed-arity operators with their argument counts
pub fn fixed_arity_operators() -> impl Iterator<Item = (&'static str, usize)> {
    FIXED_ARITY.iter().map(|(name, count)| (*name, *count))
}
