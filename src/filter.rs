// Top-level filter documents

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::ast::Expression;
use crate::capability::{role, Capability, Operand, Plays};
use crate::decoder::{self, DecodeError, Decoder};

/// A complete filter: an expression whose root yields a boolean.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    expression: Operand<role::Boolean>,
}

impl Filter {
    pub fn new<T: Plays<role::Boolean>>(node: T) -> Self {
        Filter {
            expression: Operand::new(node),
        }
    }

    /// Fails with [`DecodeError::TopLevel`] when the root is not boolean.
    pub fn from_expression(expression: Expression) -> Result<Self, DecodeError> {
        Operand::try_from_expression(expression)
            .map(|expression| Filter { expression })
            .map_err(|_| DecodeError::TopLevel {
                required: Capability::Boolean,
            })
    }

    /// Decode a filter document with a specific decoder.
    pub fn decode_with(decoder: &Decoder, value: &Value) -> Result<Self, DecodeError> {
        Filter::from_expression(decoder.decode(value)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DecodeError> {
        Filter::from_expression(decoder::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn expression(&self) -> &Expression {
        self.expression.expression()
    }

    pub fn into_expression(self) -> Expression {
        self.expression.into_expression()
    }
}

impl From<Filter> for Expression {
    fn from(filter: Filter) -> Self {
        filter.into_expression()
    }
}

impl TryFrom<Expression> for Filter {
    type Error = DecodeError;

    fn try_from(expression: Expression) -> Result<Self, Self::Error> {
        Filter::from_expression(expression)
    }
}

impl FromStr for Filter {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::from_json_str(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.expression(), f)
    }
}

impl Serialize for Filter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.expression.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        decoder::decode(&value)
            .and_then(Filter::from_expression)
            .map_err(de::Error::custom)
    }
}
