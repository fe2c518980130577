//! Logical combinators

use super::super::operator::{Arity, OperatorKind, OperatorRegistry, SearchOperator};
use super::take_args;
use crate::backend::QueryBuilder;
use crate::core::Result;
use crate::evaluator::{Operand, QueryContext};

/// Conjunction (`and`) or disjunction (`or`) of one or more conditions
pub struct JunctionOperator {
    conjunction: bool,
}

impl JunctionOperator {
    pub const AND: Self = Self { conjunction: true };
    pub const OR: Self = Self { conjunction: false };
}

impl<B: QueryBuilder> SearchOperator<B> for JunctionOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Combinator
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1)
    }

    fn evaluate(
        &self,
        name: &str,
        args: Vec<Operand<B>>,
        ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let builder = ctx.builder();
        let predicates = args
            .into_iter()
            .map(|arg| arg.into_predicate(name, builder))
            .collect::<Result<Vec<_>>>()?;

        Ok(Operand::Predicate(if self.conjunction {
            builder.and(predicates)
        } else {
            builder.or(predicates)
        }))
    }
}

/// Negation of exactly one condition
pub struct NotOperator;

impl<B: QueryBuilder> SearchOperator<B> for NotOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Combinator
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
        let builder = ctx.builder();
        let predicate = arg.into_predicate(name, builder)?;
        Ok(Operand::Predicate(builder.not(predicate)))
    }
}

pub(super) fn register_logical_operators<B: QueryBuilder + 'static>(
    registry: &mut OperatorRegistry<B>,
) {
    registry.insert("and", JunctionOperator::AND);
    registry.insert("or", JunctionOperator::OR);
    registry.insert("not", NotOperator);
}
