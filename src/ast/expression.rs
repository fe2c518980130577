//! Filter expression AST
//!
//! A filter is a tree of literals, field references and operator calls. Nodes
//! are produced by the parser, consumed once by the predicate builder and then
//! dropped; nothing in the tree refers back to the registry or the schema.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::core::Value;

/// Operator name reserved for the field reference special form
pub const FIELD_FORM: &str = "field";

/// The main filter expression node
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// Literal value (string, number, boolean, null or list)
    Literal(Value),

    /// Reference to a searchable field path (e.g. `>children.name`)
    FieldRef(String),

    /// Operator call (e.g. `["eq", ["field", "name"], "x"]`)
    Call(CallNode),
}

/// Operator call data
#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    /// Registry name of the operator
    pub operator: String,
    /// Argument expressions in source order
    pub args: Vec<FilterExpression>,
}

impl FilterExpression {
    /// Create a literal node
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a field reference node
    pub fn field(path: impl Into<String>) -> Self {
        Self::FieldRef(path.into())
    }

    /// Create an operator call node
    pub fn call(operator: impl Into<String>, args: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::Call(CallNode {
            operator: operator.into(),
            args: args.into_iter().collect(),
        })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Nesting depth of the tree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_) | Self::FieldRef(_) => 1,
            Self::Call(call) => 1 + call.args.iter().map(Self::depth).max().unwrap_or(0),
        }
    }

    /// Render back to the nested-array wire form
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Literal(value) => value.to_json(),
            Self::FieldRef(path) => JsonValue::Array(vec![
                JsonValue::String(FIELD_FORM.to_string()),
                JsonValue::String(path.clone()),
            ]),
            Self::Call(call) => {
                let mut items = Vec::with_capacity(call.args.len() + 1);
                items.push(JsonValue::String(call.operator.clone()));
                items.extend(call.args.iter().map(Self::to_json));
                JsonValue::Array(items)
            }
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::FieldRef(path) => write!(f, "{path}"),
            Self::Call(call) => {
                write!(f, "{}(", call.operator)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
