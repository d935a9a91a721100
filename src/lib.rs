// cql2-filter - Typed CQL2 JSON filter expressions
// Copyright (c) 2025 cql2-filter contributors
// Licensed under the MIT License

//! # cql2-filter
//!
//! Typed expression trees for CQL2 JSON filters, with a canonical encoder and
//! a validating decoder.
//!
//! Decoding checks every operand against the capability the operator requires
//! (boolean, numeric, character, spatial, temporal and so on), so a decoded
//! tree is well-formed by construction. Encoding writes every composite node
//! with the uniform `{"op": ..., "args": [...]}` envelope.
//!
//! ## Architecture
//!
//! - `ast` - Expression tree and operator name enums
//! - `capability` - Capability taxonomy and checked `Operand` wrappers
//! - `operators` - Operator registry with argument counts
//! - `datetime` - Date and timestamp literals
//! - `encoder` - Canonical JSON encoding
//! - `decoder` - JSON decoding with arity and capability checks
//! - `filter` - Top-level boolean filters
//!
//! ## Example
//!
//! ```
//! use cql2_filter::Filter;
//!
//! let filter: Filter = r#"{"op": "<", "args": [{"property": "depth"}, 100]}"#
//!     .parse()
//!     .unwrap();
//! assert_eq!(filter.to_string(), r#"{"op":"<","args":[{"property":"depth"},100]}"#);
//! ```

pub mod ast;
pub mod capability;
pub mod datetime;
pub mod decoder;
pub mod encoder;
pub mod filter;
pub mod operators;

pub use ast::{
    AccentInsensitive, And, Array, ArrayComparison, ArrayOp, Between, BoundingBox,
    CaseInsensitive, Comparison, ComparisonOp, Expression, Function, Geometry, GeometryType, In,
    Interval, IsNull, Like, Not, Or, Property, SpatialComparison, SpatialOp, TemporalComparison,
    TemporalOp,
};
pub use capability::{role, Capabilities, Capability, Operand};
pub use decoder::{DecodeError, Decoder, DecoderConfig, ErrorKind, DEFAULT_MAX_DEPTH};
pub use filter::Filter;

/// Decode a JSON filter expression from text.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the text is not JSON or the document is not a
/// well-formed expression.
///
/// # Examples
///
/// ```
/// let expr = cql2_filter::decode(r#"{"op": "isNull", "args": [{"property": "geometry"}]}"#).unwrap();
/// assert_eq!(expr.op_name(), Some("isNull"));
/// ```
pub fn decode(json: &str) -> Result<Expression, DecodeError> {
    decoder::from_str(json)
}

/// Encode an expression as compact canonical JSON.
///
/// # Errors
///
/// Fails only for a non-finite number literal.
pub fn encode(expr: &Expression) -> Result<String, serde_json::Error> {
    encoder::to_string(expr)
}
