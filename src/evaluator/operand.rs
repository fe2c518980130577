//! Operands handed to operators

use std::fmt;
use std::sync::Arc;

use crate::backend::QueryBuilder;
use crate::core::{Result, SearchError, Value};
use crate::model::{FieldDescriptor, ValueType};

/// A resolved operator argument or result
pub enum Operand<B: QueryBuilder> {
    /// Literal value, not yet coerced
    Value(Value),
    /// Field reference resolved through the join cache
    Field {
        expr: B::Expr,
        descriptor: Arc<FieldDescriptor>,
    },
    /// Opaque expression produced by an operator
    Expr(B::Expr),
    /// Boolean condition
    Predicate(B::Predicate),
}

impl<B: QueryBuilder> Operand<B> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Operand::Value(_) => "literal",
            Operand::Field { .. } => "field",
            Operand::Expr(_) => "expression",
            Operand::Predicate(_) => "predicate",
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Operand::Value(_))
    }

    /// Descriptor of a field operand
    pub fn descriptor(&self) -> Option<&Arc<FieldDescriptor>> {
        match self {
            Operand::Field { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    /// Literal string argument, as taken by value transforms
    pub fn into_string(self, operator: &str) -> Result<String> {
        match self {
            Operand::Value(Value::String(s)) => Ok(s),
            other => Err(SearchError::malformed(
                operator,
                format!("expected a string literal, got {}", other.kind_name()),
            )),
        }
    }

    /// Turn into a value expression. Literals become builder literals as is.
    pub fn into_expr(self, operator: &str, builder: &B) -> Result<B::Expr> {
        match self {
            Operand::Value(value) => Ok(builder.literal(value)),
            Operand::Field { expr, .. } | Operand::Expr(expr) => Ok(expr),
            Operand::Predicate(_) => Err(SearchError::malformed(
                operator,
                "expected a value expression, got a predicate",
            )),
        }
    }

    /// Turn into a predicate: boolean fields and expressions are tested for
    /// truth, boolean literals become constants
    pub fn into_predicate(self, operator: &str, builder: &B) -> Result<B::Predicate> {
        match self {
            Operand::Predicate(predicate) => Ok(predicate),
            Operand::Value(Value::Boolean(b)) => Ok(builder.constant(b)),
            Operand::Value(value) => Err(SearchError::malformed(
                operator,
                format!("expected a condition, got literal {value}"),
            )),
            Operand::Field { expr, descriptor } => match descriptor.value_type() {
                Some(ValueType::Boolean) => Ok(builder.is_true(expr)),
                _ => Err(SearchError::malformed(
                    operator,
                    format!("field '{}' is not boolean", descriptor.path),
                )),
            },
            Operand::Expr(expr) => Ok(builder.is_true(expr)),
        }
    }
}

impl<B: QueryBuilder> Clone for Operand<B> {
    fn clone(&self) -> Self {
        match self {
            Operand::Value(value) => Operand::Value(value.clone()),
            Operand::Field { expr, descriptor } => Operand::Field {
                expr: expr.clone(),
                descriptor: Arc::clone(descriptor),
            },
            Operand::Expr(expr) => Operand::Expr(expr.clone()),
            Operand::Predicate(predicate) => Operand::Predicate(predicate.clone()),
        }
    }
}

impl<B: QueryBuilder> fmt::Debug for Operand<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Operand::Field { expr, descriptor } => f
                .debug_struct("Field")
                .field("path", &descriptor.path)
                .field("expr", expr)
                .finish(),
            Operand::Expr(expr) => f.debug_tuple("Expr").field(expr).finish(),
            Operand::Predicate(predicate) => f.debug_tuple("Predicate").field(predicate).finish(),
        }
    }
}
