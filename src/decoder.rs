// JSON filter decoder
// Shape sniffing, operator dispatch, arity checks and capability casts

use serde::de::{self, Deserialize, Deserializer};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{
    AccentInsensitive, And, Array, ArrayComparison, ArrayOp, Between, BoundingBox,
    CaseInsensitive, Comparison, ComparisonOp, Expression, Function, Geometry, In, Interval,
    IsNull, Like, Not, Or, SpatialComparison, SpatialOp, TemporalComparison, TemporalOp,
};
use crate::capability::{role, Capability, Operand, Role};
use crate::datetime::{self, DateTimeError, InstantLiteral};
use crate::encoder::OPEN_BOUND;
use crate::operators::{self, Arity};

/// Default limit on expression nesting
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Decoder errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported expression: {0}")]
    Shape(String),

    #[error("expected {expected} args for {op:?} op, found {found}")]
    Arity {
        op: String,
        expected: Arity,
        found: usize,
    },

    #[error("expected arg {index} of {op:?} op to be a {required} expression")]
    Capability {
        op: String,
        index: usize,
        required: Capability,
    },

    #[error("expected a literal array for arg {index} of {op:?} op")]
    ExpectedList { op: String, index: usize },

    #[error("expected array item {index} to be a {required} expression")]
    ItemCapability { index: usize, required: Capability },

    #[error("expected a {required} expression at the top level")]
    TopLevel { required: Capability },

    #[error("invalid {literal} literal: {reason}")]
    Format {
        literal: &'static str,
        reason: String,
    },

    #[error(transparent)]
    DateTime(#[from] DateTimeError),

    #[error("malformed {literal}: {reason}")]
    Structural {
        literal: &'static str,
        reason: String,
    },

    #[error("expression nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trouble decoding arg {index} for {op:?} op: {source}")]
    Operand {
        op: String,
        index: usize,
        source: Box<DecodeError>,
    },

    #[error("trouble decoding item {index} of array: {source}")]
    Item {
        index: usize,
        source: Box<DecodeError>,
    },
}

/// Error taxonomy, independent of where in the tree the fault sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Shape,
    Arity,
    Capability,
    Format,
    Structural,
    Depth,
    Json,
}

impl DecodeError {
    /// Taxonomy member of the innermost fault
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Shape(_) => ErrorKind::Shape,
            DecodeError::Arity { .. } => ErrorKind::Arity,
            DecodeError::Capability { .. }
            | DecodeError::ExpectedList { .. }
            | DecodeError::ItemCapability { .. }
            | DecodeError::TopLevel { .. } => ErrorKind::Capability,
            DecodeError::Format { .. } | DecodeError::DateTime(_) => ErrorKind::Format,
            DecodeError::Structural { .. } => ErrorKind::Structural,
            DecodeError::DepthExceeded { .. } => ErrorKind::Depth,
            DecodeError::Json(_) => ErrorKind::Json,
            DecodeError::Operand { source, .. } | DecodeError::Item { source, .. } => source.kind(),
        }
    }

    pub(crate) fn structural(literal: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::Structural {
            literal,
            reason: reason.into(),
        }
    }

    fn format(literal: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::Format {
            literal,
            reason: reason.into(),
        }
    }

    fn in_operand(self, op: &str, index: usize) -> Self {
        DecodeError::Operand {
            op: op.to_string(),
            index,
            source: Box::new(self),
        }
    }

    fn in_item(self, index: usize) -> Self {
        DecodeError::Item {
            index,
            source: Box::new(self),
        }
    }
}

/// Decoder settings, loadable from a host's configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Deepest allowed operand nesting; deeper documents are rejected
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Converts raw JSON into a typed expression tree.
///
/// Decoding is all-or-nothing: the first fault aborts the whole document.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Decoder { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn decode(&self, value: &Value) -> Result<Expression, DecodeError> {
        self.expression(value, 0)
    }

    pub fn decode_str(&self, json: &str) -> Result<Expression, DecodeError> {
        let value = parse_json(json)?;
        self.decode(&value)
    }

    pub fn decode_slice(&self, json: &[u8]) -> Result<Expression, DecodeError> {
        let value: Value = serde_json::from_slice(json)?;
        self.decode(&value)
    }

    fn expression(&self, value: &Value, depth: usize) -> Result<Expression, DecodeError> {
        if depth > self.config.max_depth {
            debug!(max_depth = self.config.max_depth, "filter nesting limit reached");
            return Err(DecodeError::DepthExceeded {
                max: self.config.max_depth,
            });
        }

        match value {
            Value::Bool(b) => Ok(Expression::Boolean(*b)),
            Value::String(s) => Ok(Expression::String(s.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(Expression::Number)
                .ok_or_else(|| DecodeError::Shape(format!("number out of range: {}", n))),
            Value::Array(items) => self.array(items, depth).map(Expression::Array),
            Value::Object(map) => self.object(map, depth),
            Value::Null => Err(DecodeError::Shape("null".to_string())),
        }
    }

    fn array(&self, values: &[Value], depth: usize) -> Result<Array, DecodeError> {
        let mut items = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            let expr = self
                .expression(value, depth + 1)
                .map_err(|e| e.in_item(index))?;
            let item = Operand::<role::ArrayItem>::try_from_expression(expr).map_err(|_| {
                DecodeError::ItemCapability {
                    index,
                    required: Capability::ArrayItem,
                }
            })?;
            items.push(item);
        }
        Ok(Array::new(items))
    }

    /// Keys are checked in a fixed priority order; the first present key wins.
    fn object(&self, map: &Map<String, Value>, depth: usize) -> Result<Expression, DecodeError> {
        if let Some(value) = map.get("date") {
            let text = value
                .as_str()
                .ok_or_else(|| DecodeError::format("date", "expected a string"))?;
            return Ok(Expression::Date(datetime::parse_date(text)?));
        }

        if let Some(value) = map.get("timestamp") {
            let text = value
                .as_str()
                .ok_or_else(|| DecodeError::format("timestamp", "expected a string"))?;
            return Ok(Expression::Timestamp(datetime::parse_timestamp(text)?));
        }

        if let Some(value) = map.get("interval") {
            return self.interval(value, depth).map(Expression::Interval);
        }

        if let Some(value) = map.get("bbox") {
            return bounding_box(value).map(Expression::BoundingBox);
        }

        if map.contains_key("type") {
            return Geometry::new(map.clone()).map(Expression::Geometry);
        }

        if let Some(value) = map.get("property") {
            return match value {
                Value::String(name) => Ok(Expression::property(name.as_str())),
                other => Err(DecodeError::Shape(format!(
                    "expected property name to be a string, got {}",
                    other
                ))),
            };
        }

        if let (Some(Value::String(name)), Some(Value::Array(args))) = (map.get("op"), map.get("args"))
        {
            return self.operation(name, args, depth);
        }

        Err(DecodeError::Shape(Value::Object(map.clone()).to_string()))
    }

    fn interval(&self, value: &Value, depth: usize) -> Result<Interval, DecodeError> {
        let bounds = value
            .as_array()
            .ok_or_else(|| DecodeError::structural("interval", "expected an array of two bounds"))?;
        let [start, end] = <&[Value; 2]>::try_from(bounds.as_slice()).map_err(|_| {
            DecodeError::structural(
                "interval",
                format!("expected 2 items for interval, found {}", bounds.len()),
            )
        })?;

        let start = self.interval_bound(start, depth)?;
        let end = self.interval_bound(end, depth)?;
        Interval::new(start, end)
            .ok_or_else(|| DecodeError::structural("interval", "start or end must be provided"))
    }

    fn interval_bound(
        &self,
        value: &Value,
        depth: usize,
    ) -> Result<Option<Operand<role::Instant>>, DecodeError> {
        match value {
            Value::String(text) if text == OPEN_BOUND => Ok(None),
            Value::String(text) => Ok(Some(match datetime::parse_instant(text)? {
                InstantLiteral::Date(date) => Operand::new(date),
                InstantLiteral::Timestamp(ts) => Operand::new(ts),
            })),
            Value::Object(_) => match self.expression(value, depth + 1)? {
                Expression::Property(property) => Ok(Some(Operand::new(property))),
                Expression::Function(function) => Ok(Some(Operand::new(function))),
                other => Err(DecodeError::structural(
                    "interval",
                    format!("expected a property or function as bound, got {}", other),
                )),
            },
            other => Err(DecodeError::structural(
                "interval",
                format!("unsupported bound {}", other),
            )),
        }
    }

    fn operation(&self, name: &str, raw_args: &[Value], depth: usize) -> Result<Expression, DecodeError> {
        let expected = operators::arity(name);
        if !expected.accepts(raw_args.len()) {
            return Err(DecodeError::Arity {
                op: name.to_string(),
                expected,
                found: raw_args.len(),
            });
        }

        let args = raw_args
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                self.expression(raw, depth + 1)
                    .map_err(|e| e.in_operand(name, index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        build_operation(name, args)
    }
}

/// Build the typed node for an operator whose operands are already decoded.
fn build_operation(name: &str, args: Vec<Expression>) -> Result<Expression, DecodeError> {
    if let Some(op) = ComparisonOp::from_name(name) {
        let [left, right] = fixed(name, args)?;
        return Ok(Expression::Comparison(Comparison {
            op,
            left: cast(name, 0, left)?,
            right: cast(name, 1, right)?,
        }));
    }

    if let Some(op) = ArrayOp::from_name(name) {
        let [left, right] = fixed(name, args)?;
        return Ok(Expression::ArrayComparison(ArrayComparison {
            op,
            left: cast(name, 0, left)?,
            right: cast(name, 1, right)?,
        }));
    }

    if let Some(op) = SpatialOp::from_name(name) {
        let [left, right] = fixed(name, args)?;
        return Ok(Expression::SpatialComparison(SpatialComparison {
            op,
            left: cast(name, 0, left)?,
            right: cast(name, 1, right)?,
        }));
    }

    if let Some(op) = TemporalOp::from_name(name) {
        let [left, right] = fixed(name, args)?;
        return Ok(Expression::TemporalComparison(TemporalComparison {
            op,
            left: cast(name, 0, left)?,
            right: cast(name, 1, right)?,
        }));
    }

    match name {
        operators::NOT => {
            let [arg] = fixed(name, args)?;
            Ok(Expression::Not(Not {
                arg: cast(name, 0, arg)?,
            }))
        }
        operators::AND => {
            let args = cast_all(name, args)?;
            And::try_from_operands(args)
                .map(Expression::And)
                .map_err(|args| arity_error(name, Arity::AtLeast(2), args.len()))
        }
        operators::OR => {
            let args = cast_all(name, args)?;
            Or::try_from_operands(args)
                .map(Expression::Or)
                .map_err(|args| arity_error(name, Arity::AtLeast(2), args.len()))
        }
        operators::LIKE => {
            let [value, pattern] = fixed(name, args)?;
            Ok(Expression::Like(Like {
                value: cast(name, 0, value)?,
                pattern: cast(name, 1, pattern)?,
            }))
        }
        operators::BETWEEN => {
            let [value, low, high] = fixed(name, args)?;
            Ok(Expression::Between(Between {
                value: cast(name, 0, value)?,
                low: cast(name, 1, low)?,
                high: cast(name, 2, high)?,
            }))
        }
        operators::IN => {
            let [item, list] = fixed(name, args)?;
            let item = cast(name, 0, item)?;
            let Expression::Array(array) = list else {
                return Err(DecodeError::ExpectedList {
                    op: name.to_string(),
                    index: 1,
                });
            };
            let list = array
                .items
                .into_iter()
                .enumerate()
                .map(|(index, entry)| {
                    entry.cast::<role::Scalar>().map_err(|_| {
                        DecodeError::ItemCapability {
                            index,
                            required: Capability::Scalar,
                        }
                        .in_operand(name, 1)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expression::In(In { item, list }))
        }
        operators::IS_NULL => {
            let [value] = fixed(name, args)?;
            Ok(Expression::IsNull(IsNull::new(value)))
        }
        operators::CASEI => {
            let [value] = fixed(name, args)?;
            Ok(Expression::CaseInsensitive(CaseInsensitive {
                value: cast(name, 0, value)?,
            }))
        }
        operators::ACCENTI => {
            let [value] = fixed(name, args)?;
            Ok(Expression::AccentInsensitive(AccentInsensitive {
                value: cast(name, 0, value)?,
            }))
        }
        _ => {
            trace!(op = name, args = args.len(), "unregistered operator decoded as function");
            Ok(Expression::Function(Function::new(name, args)))
        }
    }
}

fn arity_error(op: &str, expected: Arity, found: usize) -> DecodeError {
    DecodeError::Arity {
        op: op.to_string(),
        expected,
        found,
    }
}

fn fixed<const N: usize>(op: &str, args: Vec<Expression>) -> Result<[Expression; N], DecodeError> {
    args.try_into()
        .map_err(|args: Vec<Expression>| arity_error(op, Arity::Exactly(N), args.len()))
}

fn cast<R: Role>(op: &str, index: usize, expr: Expression) -> Result<Operand<R>, DecodeError> {
    Operand::try_from_expression(expr).map_err(|_| DecodeError::Capability {
        op: op.to_string(),
        index,
        required: R::CAPABILITY,
    })
}

fn cast_all<R: Role>(op: &str, args: Vec<Expression>) -> Result<Vec<Operand<R>>, DecodeError> {
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| cast(op, index, arg))
        .collect()
}

fn bounding_box(value: &Value) -> Result<BoundingBox, DecodeError> {
    let values = value
        .as_array()
        .ok_or_else(|| DecodeError::format("bbox", "expected an array of numbers"))?;
    if values.len() != 4 && values.len() != 6 {
        return Err(DecodeError::format(
            "bbox",
            format!("expected 4 or 6 bbox values, found {}", values.len()),
        ));
    }

    let extent = values
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| DecodeError::format("bbox", format!("trouble decoding bbox value {}", v)))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    BoundingBox::from_extent(&extent).ok_or_else(|| {
        DecodeError::format("bbox", format!("expected 4 or 6 bbox values, found {}", extent.len()))
    })
}

/// Parse JSON text (using simd-json first when the `simd` feature is enabled).
pub(crate) fn parse_json(json: &str) -> Result<Value, DecodeError> {
    #[cfg(feature = "simd")]
    {
        // simd-json parses in place and needs an owned, mutable buffer
        let mut bytes = json.as_bytes().to_vec();
        if let Ok(value) = simd_json::serde::from_slice::<Value>(&mut bytes) {
            return Ok(value);
        }
    }
    Ok(serde_json::from_str(json)?)
}

/// Decode a JSON value with the default decoder settings.
pub fn decode(value: &Value) -> Result<Expression, DecodeError> {
    Decoder::default().decode(value)
}

/// Decode JSON text with the default decoder settings.
pub fn from_str(json: &str) -> Result<Expression, DecodeError> {
    Decoder::default().decode_str(json)
}

/// Decode JSON bytes with the default decoder settings.
pub fn from_slice(json: &[u8]) -> Result<Expression, DecodeError> {
    Decoder::default().decode_slice(json)
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        decode(&value).map_err(de::Error::custom)
    }
}
