// Operand capabilities
// Which roles an expression may play as the argument of an operator

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::{Serialize, Serializer};

use crate::ast::{
    AccentInsensitive, And, Array, ArrayComparison, Between, BoundingBox, CaseInsensitive,
    Comparison, Expression, Function, Geometry, In, Interval, IsNull, Like, Not, Or, Property,
    SpatialComparison, TemporalComparison,
};

/// A role an expression may play as an operand.
///
/// Capabilities are markers, not a class hierarchy: one node may carry several
/// at once. A property reference is character, numeric, array, spatial and
/// temporal at the same time because its data type is only known at
/// evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Boolean,
    Numeric,
    Character,
    Pattern,
    Array,
    ArrayItem,
    Spatial,
    Temporal,
    /// A temporal value usable as a scalar (date, timestamp, property, function)
    Instant,
    Scalar,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::Boolean,
        Capability::Numeric,
        Capability::Character,
        Capability::Pattern,
        Capability::Array,
        Capability::ArrayItem,
        Capability::Spatial,
        Capability::Temporal,
        Capability::Instant,
        Capability::Scalar,
    ];

    #[inline]
    const fn bit(self) -> u16 {
        1 << self as u16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Boolean => "boolean",
            Capability::Numeric => "numeric",
            Capability::Character => "character",
            Capability::Pattern => "pattern",
            Capability::Array => "array",
            Capability::ArrayItem => "array item",
            Capability::Spatial => "spatial",
            Capability::Temporal => "temporal",
            Capability::Instant => "instant",
            Capability::Scalar => "scalar",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of capabilities, stored as a bitset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u16);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const ALL: Capabilities = Capabilities::of(&Capability::ALL);

    pub const fn of(capabilities: &[Capability]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < capabilities.len() {
            bits |= capabilities[i].bit();
            i += 1;
        }
        Capabilities(bits)
    }

    #[inline]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Type-level name of a [`Capability`], used to parameterize [`Operand`].
pub trait Role: sealed::Sealed + fmt::Debug + Copy + 'static {
    const CAPABILITY: Capability;
}

/// Zero-sized role markers, one per [`Capability`].
pub mod role {
    macro_rules! roles {
        ($($name:ident),+ $(,)?) => {
            $(
                #[doc = concat!("Marker for the `", stringify!($name), "` capability.")]
                #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
                pub struct $name;

                impl super::sealed::Sealed for $name {}

                impl super::Role for $name {
                    const CAPABILITY: super::Capability = super::Capability::$name;
                }
            )+
        };
    }

    roles!(
        Boolean, Numeric, Character, Pattern, Array, ArrayItem, Spatial, Temporal, Instant,
        Scalar,
    );
}

/// The fixed capability set of a node type.
pub trait Capable: Into<Expression> {
    const CAPABILITIES: Capabilities;
}

/// Compile-time proof that every value of a node type plays role `R`.
pub trait Plays<R: Role>: Capable {}

macro_rules! capable {
    ($node:ty => $($role:ident),+ $(,)?) => {
        impl Capable for $node {
            const CAPABILITIES: Capabilities = Capabilities::of(&[$(Capability::$role),+]);
        }

        $(impl Plays<role::$role> for $node {})+
    };
}

// Literals
capable!(bool => Boolean, Scalar, ArrayItem);
capable!(f64 => Numeric, Scalar, ArrayItem);
capable!(String => Character, Pattern, Scalar, ArrayItem);
capable!(&str => Character, Pattern, Scalar, ArrayItem);
capable!(NaiveDate => Temporal, Instant, Scalar);
capable!(DateTime<Utc> => Temporal, Instant, Scalar);
capable!(Geometry => Spatial, ArrayItem);
capable!(BoundingBox => Spatial, ArrayItem);

capable!(Property => Character, Numeric, Array, ArrayItem, Spatial, Temporal, Instant, Scalar);
capable!(Interval => Temporal);
capable!(Array => Array, ArrayItem);
capable!(CaseInsensitive => Character, Pattern, Scalar);
capable!(AccentInsensitive => Character, Pattern, Scalar);

// Predicates
capable!(Comparison => Boolean, Scalar);
capable!(Like => Boolean, Scalar);
capable!(Between => Boolean, Scalar);
capable!(In => Boolean, Scalar);
capable!(IsNull => Boolean, Scalar);
capable!(Not => Boolean, Scalar);
capable!(And => Boolean, Scalar);
capable!(Or => Boolean, Scalar);
capable!(ArrayComparison => Boolean, Scalar);
capable!(SpatialComparison => Boolean, Scalar);
capable!(TemporalComparison => Boolean, Scalar);

// The return type of an extension function cannot be known statically, so a
// function call is accepted wherever any capability is required.
capable!(Function =>
    Boolean, Numeric, Character, Pattern, Array, ArrayItem, Spatial, Temporal, Instant, Scalar);

/// An expression known to carry the capability named by `R`.
///
/// Built either from a node type that statically plays the role
/// ([`Operand::new`]) or from an arbitrary expression through a checked
/// conversion ([`Operand::try_from_expression`]).
pub struct Operand<R: Role> {
    expr: Box<Expression>,
    role: PhantomData<R>,
}

impl<R: Role> Operand<R> {
    pub fn new<T: Plays<R>>(node: T) -> Self {
        Operand {
            expr: Box::new(node.into()),
            role: PhantomData,
        }
    }

    /// Wrap `expr` if it carries the capability; hands it back otherwise.
    pub fn try_from_expression(expr: Expression) -> Result<Self, Expression> {
        if expr.has(R::CAPABILITY) {
            Ok(Operand {
                expr: Box::new(expr),
                role: PhantomData,
            })
        } else {
            Err(expr)
        }
    }

    /// Re-check the wrapped expression against another role.
    pub fn cast<S: Role>(self) -> Result<Operand<S>, Self> {
        if self.expr.has(S::CAPABILITY) {
            Ok(Operand {
                expr: self.expr,
                role: PhantomData,
            })
        } else {
            Err(self)
        }
    }

    #[inline]
    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    pub fn into_expression(self) -> Expression {
        *self.expr
    }
}

impl<R: Role> TryFrom<Expression> for Operand<R> {
    type Error = Expression;

    fn try_from(expr: Expression) -> Result<Self, Self::Error> {
        Operand::try_from_expression(expr)
    }
}

impl<R: Role> From<Operand<R>> for Expression {
    fn from(operand: Operand<R>) -> Self {
        operand.into_expression()
    }
}

impl<R: Role> Deref for Operand<R> {
    type Target = Expression;

    fn deref(&self) -> &Expression {
        &self.expr
    }
}

impl<R: Role> AsRef<Expression> for Operand<R> {
    fn as_ref(&self) -> &Expression {
        &self.expr
    }
}

impl<R: Role> Clone for Operand<R> {
    fn clone(&self) -> Self {
        Operand {
            expr: self.expr.clone(),
            role: PhantomData,
        }
    }
}

impl<R: Role> PartialEq for Operand<R> {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl<R: Role> fmt::Debug for Operand<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.expr, f)
    }
}

impl<R: Role> Serialize for Operand<R> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.expr.serialize(serializer)
    }
}
