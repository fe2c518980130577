//! Built-in operator implementations

mod comparison;
mod logical;
mod null;
mod string;
mod transform;

pub use comparison::*;
pub use logical::*;
pub use null::*;
pub use string::*;
pub use transform::*;

use std::sync::Arc;

use super::operator::OperatorRegistry;
use crate::backend::QueryBuilder;
use crate::core::{Result, SearchError, Value};
use crate::evaluator::{Operand, coerce};
use crate::model::FieldDescriptor;

/// Register all built-in operators
pub fn register_builtin_operators<B: QueryBuilder + 'static>(registry: &mut OperatorRegistry<B>) {
    logical::register_logical_operators(registry);
    comparison::register_comparison_operators(registry);
    string::register_string_operators(registry);
    null::register_null_operators(registry);
    transform::register_transform_operators(registry);
}

/// Take exactly `N` arguments
pub(crate) fn take_args<B: QueryBuilder, const N: usize>(
    operator: &str,
    args: Vec<Operand<B>>,
) -> Result<[Operand<B>; N]> {
    let count = args.len();
    args.try_into().map_err(|_| {
        SearchError::malformed(operator, format!("expected {N} argument(s), got {count}"))
    })
}

/// One side of a terminal operator after coercion
pub(crate) enum Side<B: QueryBuilder> {
    Expr(B::Expr),
    Value(Value),
}

impl<B: QueryBuilder> Side<B> {
    /// Bind an operand; literals are coerced against `against` when the
    /// other side is a field
    pub(crate) fn bind(
        operator: &str,
        operand: Operand<B>,
        against: Option<&FieldDescriptor>,
    ) -> Result<Self> {
        match operand {
            Operand::Value(value) => match against {
                Some(descriptor) => coerce(value, descriptor).map(Side::Value),
                None => Ok(Side::Value(value)),
            },
            Operand::Field { expr, .. } | Operand::Expr(expr) => Ok(Side::Expr(expr)),
            Operand::Predicate(_) => Err(SearchError::malformed(
                operator,
                "expected a value expression, got a predicate",
            )),
        }
    }

    /// Apply a string function: `on_expr` for expressions, `on_text` for
    /// non-null literals
    pub(crate) fn map_text(
        self,
        builder: &B,
        on_expr: impl Fn(&B, B::Expr) -> B::Expr,
        on_text: impl Fn(&str) -> String,
    ) -> Self {
        match self {
            Side::Expr(expr) => Side::Expr(on_expr(builder, expr)),
            Side::Value(Value::Null) => Side::Value(Value::Null),
            Side::Value(Value::List(items)) => Side::Value(Value::List(
                items
                    .into_iter()
                    .map(|v| match v {
                        Value::Null => Value::Null,
                        v => Value::String(on_text(&v.to_plain_string())),
                    })
                    .collect(),
            )),
            Side::Value(value) => Side::Value(Value::String(on_text(&value.to_plain_string()))),
        }
    }

    pub(crate) fn trimmed(self, builder: &B) -> Self {
        self.map_text(builder, |b, e| b.trim(e), |s| s.trim().to_string())
    }

    pub(crate) fn upper(self, builder: &B) -> Self {
        self.map_text(builder, |b, e| b.upper(e), str::to_uppercase)
    }

    pub(crate) fn is_null_literal(&self) -> bool {
        matches!(self, Side::Value(Value::Null))
    }

    pub(crate) fn into_expr(self, builder: &B) -> B::Expr {
        match self {
            Side::Expr(expr) => expr,
            Side::Value(value) => builder.literal(value),
        }
    }
}

/// Subject and comparand of a binary terminal operator, coerced and with the
/// subject's trim directive applied
pub(crate) struct Pair<B: QueryBuilder> {
    pub(crate) left: Side<B>,
    pub(crate) right: Side<B>,
}

impl<B: QueryBuilder> Pair<B> {
    pub(crate) fn bind(
        operator: &str,
        left: Operand<B>,
        right: Operand<B>,
        builder: &B,
    ) -> Result<Self> {
        let left_descriptor = left.descriptor().map(Arc::clone);
        let right_descriptor = right.descriptor().map(Arc::clone);
        let trim = [&left_descriptor, &right_descriptor]
            .into_iter()
            .flatten()
            .any(|d| d.directives.trim);

        let mut left = Side::bind(operator, left, right_descriptor.as_deref())?;
        let mut right = Side::bind(operator, right, left_descriptor.as_deref())?;
        if trim {
            left = left.trimmed(builder);
            right = right.trimmed(builder);
        }
        Ok(Self { left, right })
    }

    pub(crate) fn upper(self, builder: &B) -> Self {
        Self {
            left: self.left.upper(builder),
            right: self.right.upper(builder),
        }
    }

    pub(crate) fn into_exprs(self, builder: &B) -> (B::Expr, B::Expr) {
        (self.left.into_expr(builder), self.right.into_expr(builder))
    }
}

/// Reject literal operands for operators that test a field or expression
pub(crate) fn require_subject<B: QueryBuilder>(operator: &str, operand: &Operand<B>) -> Result<()> {
    match operand {
        Operand::Value(value) => Err(SearchError::malformed(
            operator,
            format!("expected a field or expression, got literal {value}"),
        )),
        Operand::Predicate(_) => Err(SearchError::malformed(
            operator,
            "expected a field or expression, got a predicate",
        )),
        _ => Ok(()),
    }
}
