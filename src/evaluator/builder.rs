//! Recursive predicate construction

use log::trace;

use super::context::QueryContext;
use super::operand::Operand;
use crate::ast::{CallNode, FilterExpression, Visitor};
use crate::backend::QueryBuilder;
use crate::core::{Result, SearchError, Value};
use crate::registry::OperatorRegistry;

/// Evaluates a filter tree bottom-up: arguments first, then the operator
pub struct PredicateBuilder<'r, 'a, B: QueryBuilder> {
    registry: &'r OperatorRegistry<B>,
    ctx: &'r mut QueryContext<'a, B>,
}

impl<'r, 'a, B: QueryBuilder> PredicateBuilder<'r, 'a, B> {
    pub fn new(registry: &'r OperatorRegistry<B>, ctx: &'r mut QueryContext<'a, B>) -> Self {
        Self { registry, ctx }
    }

    /// Evaluate `expr` into the root predicate
    pub fn build(&mut self, expr: &FilterExpression) -> Result<B::Predicate> {
        let root = self.visit_expression(expr)?;
        let operator = match expr {
            FilterExpression::Call(call) => call.operator.as_str(),
            _ => "filter",
        };
        let kind = root.kind_name();
        root.into_predicate(operator, self.ctx.builder())
            .map_err(|_| {
                SearchError::malformed(
                    operator,
                    format!("the filter root must be a condition, got {kind} {expr}"),
                )
            })
    }
}

impl<B: QueryBuilder> Visitor for PredicateBuilder<'_, '_, B> {
    type Result = Result<Operand<B>>;

    fn visit_literal(&mut self, literal: &Value) -> Self::Result {
        Ok(Operand::Value(literal.clone()))
    }

    fn visit_field_ref(&mut self, path: &str) -> Self::Result {
        self.ctx.field(path)
    }

    fn visit_call(&mut self, call: &CallNode) -> Self::Result {
        let operator = self
            .registry
            .lookup(&call.operator)
            .ok_or_else(|| SearchError::UnknownOperator {
                name: call.operator.clone(),
            })?;
        operator.arity().check(&call.operator, call.args.len())?;

        let args = call
            .args
            .iter()
            .map(|arg| self.visit_expression(arg))
            .collect::<Result<Vec<_>>>()?;

        trace!(
            "compiling {} '{}' with {} argument(s) on '{}'",
            operator.kind(),
            call.operator,
            args.len(),
            self.ctx.entity()
        );
        operator.evaluate(&call.operator, args, self.ctx)
    }
}

/// Compile a filter into a predicate within `ctx`
pub fn compile_filter<B: QueryBuilder>(
    registry: &OperatorRegistry<B>,
    ctx: &mut QueryContext<'_, B>,
    expr: &FilterExpression,
) -> Result<B::Predicate> {
    PredicateBuilder::new(registry, ctx).build(expr)
}
