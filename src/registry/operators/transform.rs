//! Value transforms producing typed literals

use super::super::operator::{Arity, OperatorKind, OperatorRegistry, SearchOperator};
use super::take_args;
use crate::backend::QueryBuilder;
use crate::core::{EnumValue, Period, Result, SearchError, Value};
use crate::evaluator::coercion::{parse_datetime, parse_decimal};
use crate::evaluator::{Operand, QueryContext};
use crate::model::ValueType;

/// `["date", "2024-06-09T10:00:00+02:00"]`: ISO-8601 instant normalized to UTC
pub struct DateOperator;

impl<B: QueryBuilder> SearchOperator<B> for DateOperator {
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
        _ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let [arg] = take_args(name, args)?;
        let text = arg.into_string(name)?;
        parse_datetime(text.trim(), None)
            .map(|instant| Operand::Value(Value::DateTime(instant)))
            .ok_or_else(|| {
                SearchError::coercion(
                    format!("\"{text}\""),
                    "DateTime",
                    "not an ISO-8601 timestamp",
                )
            })
    }
}

/// `["enum", "TestEnum", "VALUE1"]`: member of an enumeration reachable from
/// the queried entity
pub struct EnumOperator;

impl<B: QueryBuilder> SearchOperator<B> for EnumOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::ValueTransform
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
        let [type_name, member] = take_args(name, args)?;
        let type_name = type_name.into_string(name)?;
        let member = member.into_string(name)?;

        let Some(ValueType::Enum {
            name: full_name,
            members,
        }) = ctx.metadata().find_enum(&type_name)
        else {
            return Err(SearchError::coercion(
                format!("\"{member}\""),
                &type_name,
                format!("no enumeration '{type_name}' on '{}'", ctx.entity()),
            ));
        };

        if members.contains(&member) {
            Ok(Operand::Value(Value::Enum(EnumValue::new(
                full_name.clone(),
                member,
            ))))
        } else {
            Err(SearchError::coercion(
                format!("\"{member}\""),
                full_name,
                format!("'{member}' is not a member of '{full_name}'"),
            ))
        }
    }
}

/// `["bigDecimal", "1.30"]`: exact decimal from a string or number
pub struct BigDecimalOperator;

impl<B: QueryBuilder> SearchOperator<B> for BigDecimalOperator {
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
        _ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let [arg] = take_args(name, args)?;
        match arg {
            Operand::Value(
                value @ (Value::String(_) | Value::Integer(_) | Value::Float(_) | Value::Decimal(_)),
            ) => parse_decimal(&value.to_plain_string()).map(|d| Operand::Value(Value::Decimal(d))),
            other => Err(SearchError::malformed(
                name,
                format!("expected a string or number literal, got {}", other.kind_name()),
            )),
        }
    }
}

/// `["period", "P1Y2M"]`: ISO-8601 date-based period
pub struct PeriodOperator;

impl<B: QueryBuilder> SearchOperator<B> for PeriodOperator {
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
        _ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        let [arg] = take_args(name, args)?;
        let text = arg.into_string(name)?;
        Period::parse(&text).map(|p| Operand::Value(Value::Period(p)))
    }
}

pub(super) fn register_transform_operators<B: QueryBuilder + 'static>(
    registry: &mut OperatorRegistry<B>,
) {
    registry.insert("date", DateOperator);
    registry.insert("enum", EnumOperator);
    registry.insert("bigDecimal", BigDecimalOperator);
    registry.insert("period", PeriodOperator);
}
