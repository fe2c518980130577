//! Null and emptiness checks

use super::super::operator::{Arity, OperatorKind, OperatorRegistry, SearchOperator};
use super::{require_subject, take_args};
use crate::backend::QueryBuilder;
use crate::core::{Result, SearchError};
use crate::evaluator::{Operand, QueryContext};

/// `isNull` / `isNotNull` / `isEmpty` / `isNotEmpty`
pub struct NullCheckOperator {
    empty: bool,
    negate: bool,
}

impl NullCheckOperator {
    pub const IS_NULL: Self = Self {
        empty: false,
        negate: false,
    };
    pub const IS_NOT_NULL: Self = Self {
        empty: false,
        negate: true,
    };
    pub const IS_EMPTY: Self = Self {
        empty: true,
        negate: false,
    };
    pub const IS_NOT_EMPTY: Self = Self {
        empty: true,
        negate: true,
    };
}

impl<B: QueryBuilder> SearchOperator<B> for NullCheckOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Terminal
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
        let [subject] = take_args(name, args)?;
        require_subject(name, &subject)?;
        if self.empty
            && let Some(descriptor) = subject.descriptor()
            && !descriptor.is_collection()
        {
            return Err(SearchError::malformed(
                name,
                format!("field '{}' is not a collection", descriptor.path),
            ));
        }

        let builder = ctx.builder();
        let expr = subject.into_expr(name, builder)?;
        let check = if self.empty {
            builder.is_empty(expr)
        } else {
            builder.is_null(expr)
        };
        Ok(Operand::Predicate(if self.negate {
            builder.not(check)
        } else {
            check
        }))
    }
}

pub(super) fn register_null_operators<B: QueryBuilder + 'static>(
    registry: &mut OperatorRegistry<B>,
) {
    registry.insert("isNull", NullCheckOperator::IS_NULL);
    registry.insert("isNotNull", NullCheckOperator::IS_NOT_NULL);
    registry.insert("isEmpty", NullCheckOperator::IS_EMPTY);
    registry.insert("isNotEmpty", NullCheckOperator::IS_NOT_EMPTY);
}
