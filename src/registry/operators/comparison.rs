//! Equality, ordering, membership and range operators

use std::sync::Arc;

use super::super::operator::{Arity, OperatorKind, OperatorRegistry, SearchOperator};
use super::{Pair, Side, require_subject, take_args};
use crate::backend::{Comparison, QueryBuilder};
use crate::core::{Result, SearchError, Value};
use crate::evaluator::{Operand, QueryContext};

/// `eq` / `noteq` and their case-insensitive variants. A null literal
/// compiles to a null check.
pub struct EqualityOperator {
    negate: bool,
    ignore_case: bool,
}

impl EqualityOperator {
    pub const EQ: Self = Self {
        negate: false,
        ignore_case: false,
    };
    pub const NOT_EQ: Self = Self {
        negate: true,
        ignore_case: false,
    };
    pub const EQ_IGNORE_CASE: Self = Self {
        negate: false,
        ignore_case: true,
    };
    pub const NOT_EQ_IGNORE_CASE: Self = Self {
        negate: true,
        ignore_case: true,
    };
}

impl<B: QueryBuilder> SearchOperator<B> for EqualityOperator {
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
        let [left, right] = take_args(name, args)?;
        let builder = ctx.builder();
        let mut pair = Pair::bind(name, left, right, builder)?;

        if pair.left.is_null_literal() || pair.right.is_null_literal() {
            let subject = if pair.left.is_null_literal() {
                pair.right
            } else {
                pair.left
            };
            let check = builder.is_null(subject.into_expr(builder));
            return Ok(Operand::Predicate(if self.negate {
                builder.not(check)
            } else {
                check
            }));
        }

        if self.ignore_case {
            pair = pair.upper(builder);
        }
        let (left, right) = pair.into_exprs(builder);
        Ok(Operand::Predicate(if self.negate {
            builder.not_equal(left, right)
        } else {
            builder.equal(left, right)
        }))
    }
}

/// `gt`, `gte`, `lt`, `lte`
pub struct OrderingOperator {
    comparison: Comparison,
}

impl OrderingOperator {
    pub const fn new(comparison: Comparison) -> Self {
        Self { comparison }
    }
}

impl<B: QueryBuilder> SearchOperator<B> for OrderingOperator {
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
        let [left, right] = take_args(name, args)?;
        let builder = ctx.builder();
        let (left, right) = Pair::bind(name, left, right, builder)?.into_exprs(builder);
        Ok(Operand::Predicate(builder.compare(self.comparison, left, right)))
    }
}

/// `in` / `nin`: the subject followed by values; list literals are expanded
pub struct MembershipOperator {
    negate: bool,
}

impl MembershipOperator {
    pub const IN: Self = Self { negate: false };
    pub const NOT_IN: Self = Self { negate: true };
}

impl<B: QueryBuilder> SearchOperator<B> for MembershipOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Terminal
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2)
    }

    fn evaluate(
        &self,
        name: &str,
        args: Vec<Operand<B>>,
        ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let builder = ctx.builder();
        let mut args = args.into_iter();
        let subject = args
            .next()
            .ok_or_else(|| SearchError::malformed(name, "missing subject"))?;
        require_subject(name, &subject)?;
        let descriptor = subject.descriptor().map(Arc::clone);
        let trim = descriptor.as_ref().is_some_and(|d| d.directives.trim);

        let mut values = Vec::new();
        for arg in args {
            let expanded = match arg {
                Operand::Value(Value::List(items)) => items.into_iter().map(Operand::Value).collect(),
                other => vec![other],
            };
            for operand in expanded {
                let mut side = Side::bind(name, operand, descriptor.as_deref())?;
                if trim {
                    side = side.trimmed(builder);
                }
                values.push(side.into_expr(builder));
            }
        }

        if values.is_empty() {
            return Ok(Operand::Predicate(builder.constant(self.negate)));
        }

        let mut subject = Side::bind(name, subject, None)?;
        if trim {
            subject = subject.trimmed(builder);
        }
        let membership = builder.in_list(subject.into_expr(builder), values);
        Ok(Operand::Predicate(if self.negate {
            builder.not(membership)
        } else {
            membership
        }))
    }
}

/// Inclusive range: `[between, subject, lower, upper]` or
/// `[between, subject, [lower, upper]]`
pub struct BetweenOperator;

impl<B: QueryBuilder> SearchOperator<B> for BetweenOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Terminal
    }

    fn arity(&self) -> Arity {
        Arity::range(2, 3)
    }

    fn evaluate(
        &self,
        name: &str,
        args: Vec<Operand<B>>,
        ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let builder = ctx.builder();
        let mut args = args.into_iter();
        let subject = args
            .next()
            .ok_or_else(|| SearchError::malformed(name, "missing subject"))?;
        require_subject(name, &subject)?;

        let (lower, upper) = match (args.next(), args.next()) {
            (Some(Operand::Value(Value::List(bounds))), None) => {
                let [lower, upper]: [Value; 2] = bounds.try_into().map_err(|_| {
                    SearchError::malformed(name, "a bounds list needs exactly two values")
                })?;
                (Operand::Value(lower), Operand::Value(upper))
            }
            (Some(lower), Some(upper)) => (lower, upper),
            _ => {
                return Err(SearchError::malformed(
                    name,
                    "expected two bounds or one two-element list",
                ));
            }
        };

        let descriptor = subject.descriptor().map(Arc::clone);
        let trim = descriptor.as_ref().is_some_and(|d| d.directives.trim);
        let mut sides = [
            Side::bind(name, subject, None)?,
            Side::bind(name, lower, descriptor.as_deref())?,
            Side::bind(name, upper, descriptor.as_deref())?,
        ];
        if trim {
            sides = sides.map(|side| side.trimmed(builder));
        }
        let [subject, lower, upper] = sides.map(|side| side.into_expr(builder));
        Ok(Operand::Predicate(builder.between(subject, lower, upper)))
    }
}

pub(super) fn register_comparison_operators<B: QueryBuilder + 'static>(
    registry: &mut OperatorRegistry<B>,
) {
    registry.insert("eq", EqualityOperator::EQ);
    registry.insert("noteq", EqualityOperator::NOT_EQ);
    registry.insert("eq_ignorecase", EqualityOperator::EQ_IGNORE_CASE);
    registry.insert("noteq_ignorecase", EqualityOperator::NOT_EQ_IGNORE_CASE);
    registry.insert("gt", OrderingOperator::new(Comparison::Gt));
    registry.insert("gte", OrderingOperator::new(Comparison::Gte));
    registry.insert("lt", OrderingOperator::new(Comparison::Lt));
    registry.insert("lte", OrderingOperator::new(Comparison::Lte));
    registry.insert("in", MembershipOperator::IN);
    registry.insert("nin", MembershipOperator::NOT_IN);
    registry.insert("between", BetweenOperator);
}
