//! Pattern-matching and case operators

use super::super::operator::{Arity, OperatorKind, OperatorRegistry, SearchOperator};
use super::{Pair, Side, take_args};
use crate::backend::QueryBuilder;
use crate::core::{Result, SearchError, Value};
use crate::evaluator::{Operand, QueryContext};

/// Where the comparand must occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    StartsWith,
    EndsWith,
    Contains,
}

/// `startsWith`, `endsWith`, `contains` and their case-insensitive variants,
/// compiled to LIKE
pub struct LikeOperator {
    mode: MatchMode,
    ignore_case: bool,
}

impl LikeOperator {
    pub const fn new(mode: MatchMode, ignore_case: bool) -> Self {
        Self { mode, ignore_case }
    }

    fn pattern<B: QueryBuilder>(&self, builder: &B, comparand: Side<B>) -> B::Expr {
        match comparand {
            Side::Value(value) => {
                let text = value.to_plain_string();
                let pattern = match self.mode {
                    MatchMode::StartsWith => format!("{text}%"),
                    MatchMode::EndsWith => format!("%{text}"),
                    MatchMode::Contains => format!("%{text}%"),
                };
                builder.literal(Value::String(pattern))
            }
            Side::Expr(expr) => {
                let wildcard = || builder.literal(Value::from("%"));
                match self.mode {
                    MatchMode::StartsWith => builder.concat(expr, wildcard()),
                    MatchMode::EndsWith => builder.concat(wildcard(), expr),
                    MatchMode::Contains => {
                        builder.concat(builder.concat(wildcard(), expr), wildcard())
                    }
                }
            }
        }
    }
}

impl<B: QueryBuilder> SearchOperator<B> for LikeOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Terminal
    }

    fn arity(&self) -> Arity {
        Arity::exactly(2)
    }

    fn evaluate(
        &self,
        name: &str,
        args: Vec<Operand<B>>,
        ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let [subject, comparand] = take_args(name, args)?;
        let builder = ctx.builder();
        let mut pair = Pair::bind(name, subject, comparand, builder)?;
        if pair.right.is_null_literal() {
            return Err(SearchError::malformed(name, "the comparand must not be null"));
        }
        if self.ignore_case {
            pair = pair.upper(builder);
        }
        let subject = pair.left.into_expr(builder);
        let pattern = self.pattern(builder, pair.right);
        Ok(Operand::Predicate(builder.like(subject, pattern)))
    }
}

/// Lower-case a string expression or literal
pub struct LowerOperator;

impl<B: QueryBuilder> SearchOperator<B> for LowerOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::ValueTransform
    }

    fn arity(&self) -> Arity {
        Arity::exactly(1)
    }

    fn evaluate(
        &self,
        name: &str,
        args: Vec<Operand<B>>,
        ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let [arg] = take_args(name, args)?;
        match arg {
            Operand::Value(Value::String(s)) => Ok(Operand::Value(Value::String(s.to_lowercase()))),
            Operand::Value(Value::Null) => Ok(Operand::Value(Value::Null)),
            Operand::Value(other) => Err(SearchError::malformed(
                name,
                format!("expected a string, got {}", other.type_name()),
            )),
            Operand::Field { expr, .. } | Operand::Expr(expr) => {
                Ok(Operand::Expr(ctx.builder().lower(expr)))
            }
            Operand::Predicate(_) => Err(SearchError::malformed(
                name,
                "expected a string expression, got a predicate",
            )),
        }
    }
}

pub(super) fn register_string_operators<B: QueryBuilder + 'static>(
    registry: &mut OperatorRegistry<B>,
) {
    registry.insert("startsWith", LikeOperator::new(MatchMode::StartsWith, false));
    registry.insert("endsWith", LikeOperator::new(MatchMode::EndsWith, false));
    registry.insert("contains", LikeOperator::new(MatchMode::Contains, false));
    registry.insert("startsWith_ignorecase", LikeOperator::new(MatchMode::StartsWith, true));
    registry.insert("endsWith_ignorecase", LikeOperator::new(MatchMode::EndsWith, true));
    registry.insert("contains_ignorecase", LikeOperator::new(MatchMode::Contains, true));
    registry.insert("lower", LowerOperator);
}
