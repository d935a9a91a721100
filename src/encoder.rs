// Canonical JSON encoding
// Every composite node is written with the uniform {"op": name, "args": [...]} envelope

use std::fmt;

use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::ast::{BoundingBox, Expression};
use crate::datetime;
use crate::operators;

/// Sentinel for a missing interval bound
pub const OPEN_BOUND: &str = "..";

impl Serialize for Expression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Expression::Boolean(b) => serializer.serialize_bool(*b),
            Expression::Number(n) => serialize_number(*n, serializer),
            Expression::String(s) => serializer.serialize_str(s),
            Expression::Property(property) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("property", &property.name)?;
                m.end()
            }
            Expression::Geometry(geometry) => geometry.as_object().serialize(serializer),
            Expression::BoundingBox(bbox) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("bbox", &Extent(bbox))?;
                m.end()
            }
            Expression::Date(date) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("date", &datetime::format_date(date))?;
                m.end()
            }
            Expression::Timestamp(ts) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("timestamp", &datetime::format_timestamp(ts))?;
                m.end()
            }
            Expression::Interval(interval) => {
                let bounds = [Bound(interval.start()), Bound(interval.end())];
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("interval", &bounds)?;
                m.end()
            }
            Expression::Array(array) => {
                let mut seq = serializer.serialize_seq(Some(array.items.len()))?;
                for item in &array.items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Expression::CaseInsensitive(e) => {
                serialize_op(serializer, operators::CASEI, [e.value.expression()])
            }
            Expression::AccentInsensitive(e) => {
                serialize_op(serializer, operators::ACCENTI, [e.value.expression()])
            }
            Expression::Comparison(e) => {
                serialize_op(serializer, e.op.as_str(), [e.left.expression(), e.right.expression()])
            }
            Expression::Like(e) => serialize_op(
                serializer,
                operators::LIKE,
                [e.value.expression(), e.pattern.expression()],
            ),
            Expression::Between(e) => serialize_op(
                serializer,
                operators::BETWEEN,
                [e.value.expression(), e.low.expression(), e.high.expression()],
            ),
            Expression::In(e) => {
                let mut m = serializer.serialize_map(Some(2))?;
                m.serialize_entry("op", operators::IN)?;
                m.serialize_entry("args", &(&e.item, &e.list))?;
                m.end()
            }
            Expression::IsNull(e) => serialize_op(serializer, operators::IS_NULL, [&*e.value]),
            Expression::Not(e) => serialize_op(serializer, operators::NOT, [e.arg.expression()]),
            Expression::And(e) => serialize_op(
                serializer,
                operators::AND,
                e.args().iter().map(|arg| arg.expression()),
            ),
            Expression::Or(e) => serialize_op(
                serializer,
                operators::OR,
                e.args().iter().map(|arg| arg.expression()),
            ),
            Expression::ArrayComparison(e) => {
                serialize_op(serializer, e.op.as_str(), [e.left.expression(), e.right.expression()])
            }
            Expression::SpatialComparison(e) => {
                serialize_op(serializer, e.op.as_str(), [e.left.expression(), e.right.expression()])
            }
            Expression::TemporalComparison(e) => {
                serialize_op(serializer, e.op.as_str(), [e.left.expression(), e.right.expression()])
            }
            Expression::Function(e) => serialize_op(serializer, &e.op, &e.args),
        }
    }
}

/// Write `{"op": name, "args": [...]}`; `args` is always present.
fn serialize_op<'a, S, I>(serializer: S, name: &str, args: I) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    I: IntoIterator<Item = &'a Expression>,
{
    let args: Vec<&Expression> = args.into_iter().collect();
    let mut m = serializer.serialize_map(Some(2))?;
    m.serialize_entry("op", name)?;
    m.serialize_entry("args", &args)?;
    m.end()
}

/// 2^63; `i64::MAX as f64` rounds up to this value
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
/// 2^64
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Integral values are written as JSON integers so `42` survives a round trip as `42`.
fn serialize_number<S>(n: f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if !n.is_finite() {
        return Err(S::Error::custom(format!("cannot encode non-finite number {}", n)));
    }
    // -0.0 keeps its sign as a float
    if n.fract() != 0.0 || (n == 0.0 && n.is_sign_negative()) {
        serializer.serialize_f64(n)
    } else if (-I64_LIMIT..I64_LIMIT).contains(&n) {
        serializer.serialize_i64(n as i64)
    } else if (0.0..U64_LIMIT).contains(&n) {
        serializer.serialize_u64(n as u64)
    } else {
        serializer.serialize_f64(n)
    }
}

struct Number(f64);

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_number(self.0, serializer)
    }
}

struct Extent<'a>(&'a BoundingBox);

impl Serialize for Extent<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let values = self.0.extent();
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&Number(*value))?;
        }
        seq.end()
    }
}

/// Interval bound: `".."` when open, bare text for dates and timestamps
struct Bound<'a>(Option<&'a Expression>);

impl Serialize for Bound<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            None => serializer.serialize_str(OPEN_BOUND),
            Some(Expression::Date(date)) => serializer.serialize_str(&datetime::format_date(date)),
            Some(Expression::Timestamp(ts)) => {
                serializer.serialize_str(&datetime::format_timestamp(ts))
            }
            Some(other) => other.serialize(serializer),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

/// Encode to a `serde_json::Value`.
pub fn to_value(expr: &Expression) -> Result<Value, serde_json::Error> {
    serde_json::to_value(expr)
}

/// Encode to compact JSON text.
pub fn to_string(expr: &Expression) -> Result<String, serde_json::Error> {
    serde_json::to_string(expr)
}

/// Encode to pretty-printed JSON text.
pub fn to_string_pretty(expr: &Expression) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(expr)
}

/// Encode to JSON bytes.
pub fn to_vec(expr: &Expression) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(expr)
}
