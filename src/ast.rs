// Filter expression tree
// One variant per node kind; composite nodes hold capability-checked operands

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::capability::{role, Capabilities, Capability, Capable, Operand};
use crate::decoder::DecodeError;

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name of this variant
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_enum! {
    /// Scalar comparison operators
    pub enum ComparisonOp {
        Equals => "=",
        NotEquals => "<>",
        LessThan => "<",
        LessThanOrEquals => "<=",
        GreaterThan => ">",
        GreaterThanOrEquals => ">=",
    }
}

named_enum! {
    /// Array comparison operators
    pub enum ArrayOp {
        ContainedBy => "a_containedBy",
        Contains => "a_contains",
        Equals => "a_equals",
        Overlaps => "a_overlaps",
    }
}

named_enum! {
    /// Spatial comparison operators
    pub enum SpatialOp {
        Contains => "s_contains",
        Crosses => "s_crosses",
        Disjoint => "s_disjoint",
        Equals => "s_equals",
        Intersects => "s_intersects",
        Overlaps => "s_overlaps",
        Touches => "s_touches",
        Within => "s_within",
    }
}

named_enum! {
    /// Temporal comparison operators
    pub enum TemporalOp {
        After => "t_after",
        Before => "t_before",
        Contains => "t_contains",
        Disjoint => "t_disjoint",
        During => "t_during",
        Equals => "t_equals",
        FinishedBy => "t_finishedBy",
        Finishes => "t_finishes",
        Intersects => "t_intersects",
        Meets => "t_meets",
        MetBy => "t_metBy",
        OverlappedBy => "t_overlappedBy",
        Overlaps => "t_overlaps",
        StartedBy => "t_startedBy",
        Starts => "t_starts",
    }
}

named_enum! {
    /// GeoJSON geometry types accepted as spatial literals
    pub enum GeometryType {
        Point => "Point",
        LineString => "LineString",
        Polygon => "Polygon",
        MultiPoint => "MultiPoint",
        MultiLineString => "MultiLineString",
        MultiPolygon => "MultiPolygon",
        GeometryCollection => "GeometryCollection",
    }
}

/// Filter expression node.
///
/// A tree is built once, either programmatically or by the decoder, and is
/// read-only afterwards. Each node exclusively owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Boolean literal
    Boolean(bool),

    /// Numeric literal
    Number(f64),

    /// String literal
    String(String),

    /// Reference to a named property of the filtered item
    Property(Property),

    /// GeoJSON geometry literal
    Geometry(Geometry),

    /// Bounding box literal
    BoundingBox(BoundingBox),

    /// Calendar date literal
    Date(NaiveDate),

    /// Instant in time, normalized to UTC
    Timestamp(DateTime<Utc>),

    /// Time span with optional bounds
    Interval(Interval),

    /// Case folding modifier (`casei`)
    CaseInsensitive(CaseInsensitive),

    /// Accent folding modifier (`accenti`)
    AccentInsensitive(AccentInsensitive),

    /// Literal list
    Array(Array),

    Comparison(Comparison),
    Like(Like),
    Between(Between),
    In(In),
    IsNull(IsNull),
    Not(Not),
    And(And),
    Or(Or),
    ArrayComparison(ArrayComparison),
    SpatialComparison(SpatialComparison),
    TemporalComparison(TemporalComparison),

    /// Call of an operator the registry does not know
    Function(Function),
}

impl Expression {
    /// Capabilities this node carries as an operand.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Expression::Boolean(_) => bool::CAPABILITIES,
            Expression::Number(_) => f64::CAPABILITIES,
            Expression::String(_) => String::CAPABILITIES,
            Expression::Property(_) => Property::CAPABILITIES,
            Expression::Geometry(_) => Geometry::CAPABILITIES,
            Expression::BoundingBox(_) => BoundingBox::CAPABILITIES,
            Expression::Date(_) => NaiveDate::CAPABILITIES,
            Expression::Timestamp(_) => <DateTime<Utc>>::CAPABILITIES,
            Expression::Interval(_) => Interval::CAPABILITIES,
            Expression::CaseInsensitive(_) => CaseInsensitive::CAPABILITIES,
            Expression::AccentInsensitive(_) => AccentInsensitive::CAPABILITIES,
            Expression::Array(_) => Array::CAPABILITIES,
            Expression::Comparison(_) => Comparison::CAPABILITIES,
            Expression::Like(_) => Like::CAPABILITIES,
            Expression::Between(_) => Between::CAPABILITIES,
            Expression::In(_) => In::CAPABILITIES,
            Expression::IsNull(_) => IsNull::CAPABILITIES,
            Expression::Not(_) => Not::CAPABILITIES,
            Expression::And(_) => And::CAPABILITIES,
            Expression::Or(_) => Or::CAPABILITIES,
            Expression::ArrayComparison(_) => ArrayComparison::CAPABILITIES,
            Expression::SpatialComparison(_) => SpatialComparison::CAPABILITIES,
            Expression::TemporalComparison(_) => TemporalComparison::CAPABILITIES,
            Expression::Function(_) => Function::CAPABILITIES,
        }
    }

    #[inline]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// Operator name for nodes encoded with the `{"op", "args"}` envelope.
    pub fn op_name(&self) -> Option<&str> {
        use crate::operators;

        match self {
            Expression::CaseInsensitive(_) => Some(operators::CASEI),
            Expression::AccentInsensitive(_) => Some(operators::ACCENTI),
            Expression::Comparison(e) => Some(e.op.as_str()),
            Expression::Like(_) => Some(operators::LIKE),
            Expression::Between(_) => Some(operators::BETWEEN),
            Expression::In(_) => Some(operators::IN),
            Expression::IsNull(_) => Some(operators::IS_NULL),
            Expression::Not(_) => Some(operators::NOT),
            Expression::And(_) => Some(operators::AND),
            Expression::Or(_) => Some(operators::OR),
            Expression::ArrayComparison(e) => Some(e.op.as_str()),
            Expression::SpatialComparison(e) => Some(e.op.as_str()),
            Expression::TemporalComparison(e) => Some(e.op.as_str()),
            Expression::Function(e) => Some(e.op.as_str()),
            _ => None,
        }
    }

    /// Create a property reference node
    pub fn property(name: impl Into<String>) -> Self {
        Expression::Property(Property::new(name))
    }

    /// Create a string literal node
    pub fn string(s: impl Into<String>) -> Self {
        Expression::String(s.into())
    }

    /// Create a number literal node
    pub fn number(n: f64) -> Self {
        Expression::Number(n)
    }

    /// Create a boolean literal node
    pub fn boolean(b: bool) -> Self {
        Expression::Boolean(b)
    }
}

/// Named property reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    pub name: String,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Property { name: name.into() }
    }
}

/// GeoJSON geometry, kept verbatim.
///
/// Only the `type` tag and the presence of `coordinates` (or `geometries` for
/// a collection) are checked; coordinate values are not validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    kind: GeometryType,
    value: Map<String, Value>,
}

impl Geometry {
    pub fn new(value: Map<String, Value>) -> Result<Self, DecodeError> {
        let tag = match value.get("type") {
            Some(Value::String(tag)) => tag,
            _ => return Err(DecodeError::structural("geometry", "geometry missing type")),
        };
        let kind = GeometryType::from_name(tag).ok_or_else(|| {
            DecodeError::structural("geometry", format!("unexpected geometry type: {}", tag))
        })?;

        let member = match kind {
            GeometryType::GeometryCollection => "geometries",
            _ => "coordinates",
        };
        if !matches!(value.get(member), Some(Value::Array(_))) {
            return Err(DecodeError::structural(
                "geometry",
                format!("expected {} array in {} geometry", member, kind),
            ));
        }

        Ok(Geometry { kind, value })
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.kind
    }

    /// The GeoJSON object exactly as given
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.value
    }

    pub fn into_object(self) -> Map<String, Value> {
        self.value
    }
}

/// Axis-aligned extent with either 4 (2D) or 6 (3D) values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingBox {
    /// `[min x, min y, max x, max y]`
    Planar([f64; 4]),
    /// `[min x, min y, min z, max x, max y, max z]`
    Volumetric([f64; 6]),
}

impl BoundingBox {
    pub fn extent(&self) -> &[f64] {
        match self {
            BoundingBox::Planar(values) => values,
            BoundingBox::Volumetric(values) => values,
        }
    }

    /// Build from a slice of 4 or 6 values
    pub fn from_extent(values: &[f64]) -> Option<Self> {
        if let Ok(planar) = <[f64; 4]>::try_from(values) {
            Some(BoundingBox::Planar(planar))
        } else if let Ok(volumetric) = <[f64; 6]>::try_from(values) {
            Some(BoundingBox::Volumetric(volumetric))
        } else {
            None
        }
    }
}

/// Time span between two instants; a missing bound is open.
///
/// At least one bound is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    start: Option<Operand<role::Instant>>,
    end: Option<Operand<role::Instant>>,
}

impl Interval {
    /// Returns `None` when both bounds are missing.
    pub fn new(
        start: Option<Operand<role::Instant>>,
        end: Option<Operand<role::Instant>>,
    ) -> Option<Self> {
        if start.is_none() && end.is_none() {
            return None;
        }
        Some(Interval { start, end })
    }

    pub fn closed(start: Operand<role::Instant>, end: Operand<role::Instant>) -> Self {
        Interval {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Interval with no end
    pub fn starting(start: Operand<role::Instant>) -> Self {
        Interval {
            start: Some(start),
            end: None,
        }
    }

    /// Interval with no start
    pub fn ending(end: Operand<role::Instant>) -> Self {
        Interval {
            start: None,
            end: Some(end),
        }
    }

    pub fn start(&self) -> Option<&Expression> {
        self.start.as_ref().map(Operand::expression)
    }

    pub fn end(&self) -> Option<&Expression> {
        self.end.as_ref().map(Operand::expression)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseInsensitive {
    pub value: Operand<role::Character>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccentInsensitive {
    pub value: Operand<role::Character>,
}

/// Literal list of array items
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    pub items: Vec<Operand<role::ArrayItem>>,
}

impl Array {
    pub fn new(items: Vec<Operand<role::ArrayItem>>) -> Self {
        Array { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `=`, `<>`, `<`, `<=`, `>`, `>=`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub op: ComparisonOp,
    pub left: Operand<role::Scalar>,
    pub right: Operand<role::Scalar>,
}

impl Comparison {
    pub fn new(op: ComparisonOp, left: Operand<role::Scalar>, right: Operand<role::Scalar>) -> Self {
        Comparison { op, left, right }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Like {
    pub value: Operand<role::Character>,
    pub pattern: Operand<role::Pattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub value: Operand<role::Numeric>,
    pub low: Operand<role::Numeric>,
    pub high: Operand<role::Numeric>,
}

/// Membership of `item` in a literal list
#[derive(Debug, Clone, PartialEq)]
pub struct In {
    pub item: Operand<role::Scalar>,
    pub list: Vec<Operand<role::Scalar>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsNull {
    pub value: Box<Expression>,
}

impl IsNull {
    pub fn new(value: impl Into<Expression>) -> Self {
        IsNull {
            value: Box::new(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Not {
    pub arg: Operand<role::Boolean>,
}

macro_rules! junction {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            args: Vec<Operand<role::Boolean>>,
        }

        impl $name {
            pub fn new(first: Operand<role::Boolean>, second: Operand<role::Boolean>) -> Self {
                $name {
                    args: vec![first, second],
                }
            }

            /// Append another operand
            pub fn with(mut self, arg: Operand<role::Boolean>) -> Self {
                self.args.push(arg);
                self
            }

            /// Fails (returning the operands) when fewer than two are given.
            pub fn try_from_operands(
                args: Vec<Operand<role::Boolean>>,
            ) -> Result<Self, Vec<Operand<role::Boolean>>> {
                if args.len() < 2 {
                    return Err(args);
                }
                Ok($name { args })
            }

            pub fn args(&self) -> &[Operand<role::Boolean>] {
                &self.args
            }

            pub fn into_args(self) -> Vec<Operand<role::Boolean>> {
                self.args
            }
        }
    };
}

junction! {
    /// Conjunction of two or more boolean operands
    And
}

junction! {
    /// Disjunction of two or more boolean operands
    Or
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayComparison {
    pub op: ArrayOp,
    pub left: Operand<role::Array>,
    pub right: Operand<role::Array>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialComparison {
    pub op: SpatialOp,
    pub left: Operand<role::Spatial>,
    pub right: Operand<role::Spatial>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemporalComparison {
    pub op: TemporalOp,
    pub left: Operand<role::Temporal>,
    pub right: Operand<role::Temporal>,
}

/// Call of an extension function or any operator missing from the registry.
///
/// Arguments are kept exactly as decoded; no arity or capability rules apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub op: String,
    pub args: Vec<Expression>,
}

impl Function {
    pub fn new(op: impl Into<String>, args: Vec<Expression>) -> Self {
        Function {
            op: op.into(),
            args,
        }
    }
}

// ── From impls ───────────────────────────────────────────────────────────────

impl From<bool> for Expression {
    fn from(b: bool) -> Self {
        Expression::Boolean(b)
    }
}

impl From<f64> for Expression {
    fn from(n: f64) -> Self {
        Expression::Number(n)
    }
}

impl From<String> for Expression {
    fn from(s: String) -> Self {
        Expression::String(s)
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Expression::String(s.to_string())
    }
}

impl From<NaiveDate> for Expression {
    fn from(date: NaiveDate) -> Self {
        Expression::Date(date)
    }
}

impl From<DateTime<Utc>> for Expression {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Expression::Timestamp(timestamp)
    }
}

macro_rules! node_into_expression {
    ($($node:ident),+ $(,)?) => {
        $(
            impl From<$node> for Expression {
                fn from(node: $node) -> Self {
                    Expression::$node(node)
                }
            }
        )+
    };
}

node_into_expression!(
    Property,
    Geometry,
    BoundingBox,
    Interval,
    CaseInsensitive,
    AccentInsensitive,
    Array,
    Comparison,
    Like,
    Between,
    In,
    IsNull,
    Not,
    And,
    Or,
    ArrayComparison,
    SpatialComparison,
    TemporalComparison,
    Function,
);
