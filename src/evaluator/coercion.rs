//! Literal coercion against field descriptors
//!
//! Literals arrive as JSON-shaped values and are converted to the field's
//! conversion target before they reach the query builder. Declared
//! constraints (size, pattern, digit counts) are checked on the result.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::core::{EnumValue, Period, Result, SearchError, Value};
use crate::model::{FieldDescriptor, SearchType, Searchable, ValueType};

/// Coerce a literal to the conversion target of `descriptor` and validate
/// its declared constraints. Lists are coerced element-wise; null passes
/// through untouched.
pub fn coerce(value: Value, descriptor: &FieldDescriptor) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::List(items) => items
            .into_iter()
            .map(|item| coerce(item, descriptor))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        scalar => {
            let coerced = convert(
                scalar,
                descriptor.target_type(),
                descriptor.value_type(),
                &descriptor.directives,
            )?;
            validate(&coerced, descriptor)?;
            Ok(coerced)
        }
    }
}

/// Convert a raw value to a native storage type, as done when loading records
pub fn convert_native(value: Value, value_type: &ValueType) -> Result<Value> {
    match (value, value_type) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::List(items), ValueType::List(inner)) => items
            .into_iter()
            .map(|item| convert_native(item, inner))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (value, ValueType::List(_)) => Err(SearchError::coercion(
            &value,
            value_type.to_string(),
            "expected a list",
        )),
        (value, _) => convert(
            value,
            SearchType::from_value_type(value_type),
            Some(value_type),
            &Searchable::default(),
        ),
    }
}

fn convert(
    value: Value,
    target: SearchType,
    native: Option<&ValueType>,
    directives: &Searchable,
) -> Result<Value> {
    let pattern = directives.date_pattern.as_deref();
    match target {
        SearchType::Untyped => Ok(value),
        SearchType::String => to_string_value(value, directives),
        SearchType::Integer => to_integer(value),
        SearchType::Float => to_float(value),
        SearchType::Decimal => to_decimal(value),
        SearchType::Boolean => to_boolean(value),
        SearchType::Date => to_date(value, pattern),
        SearchType::DateTime => to_datetime(value, pattern),
        SearchType::Time => to_time(value, pattern),
        SearchType::Period => to_period(value),
        SearchType::Enum => to_enum(value, native),
    }
}

fn mismatch(value: &Value, target: &str) -> SearchError {
    SearchError::coercion(
        value,
        target,
        format!("{} literals do not convert to {target}", value.type_name()),
    )
}

fn to_string_value(value: Value, directives: &Searchable) -> Result<Value> {
    let pattern = directives.date_pattern.as_deref();
    let text = match &value {
        Value::String(s) => return Ok(Value::String(s.clone())),
        Value::Float(f) => match &directives.decimal_format {
            Some(format) => format_decimal(decimal_from_f64(*f, &value)?, format),
            None => f.to_string(),
        },
        Value::Decimal(d) => match &directives.decimal_format {
            Some(format) => format_decimal(*d, format),
            None => d.to_string(),
        },
        Value::Date(d) => match pattern {
            Some(p) => format_temporal(&value, p, |items| d.format_with_items(items))?,
            None => d.format("%Y-%m-%d").to_string(),
        },
        Value::DateTime(dt) => match pattern {
            Some(p) => format_temporal(&value, p, |items| dt.format_with_items(items))?,
            None => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        },
        Value::Time(t) => match pattern {
            Some(p) => format_temporal(&value, p, |items| t.format_with_items(items))?,
            None => t.format("%H:%M:%S%.f").to_string(),
        },
        Value::List(_) | Value::Null => return Err(mismatch(&value, "String")),
        other => other.to_plain_string(),
    };
    Ok(Value::String(text))
}

fn format_temporal<'a, F, D>(value: &Value, pattern: &'a str, format: F) -> Result<String>
where
    F: FnOnce(StrftimeItems<'a>) -> D,
    D: std::fmt::Display,
{
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(SearchError::coercion(
            value,
            "String",
            format!("invalid date pattern '{pattern}'"),
        ));
    }
    let mut out = String::new();
    write!(out, "{}", format(StrftimeItems::new(pattern))).map_err(|_| {
        SearchError::coercion(value, "String", format!("cannot format with '{pattern}'"))
    })?;
    Ok(out)
}

/// Render a decimal with a `#.##` / `0.00` style pattern: `#` and `0` after
/// the point bound the scale, `0` forces a minimum scale
pub fn format_decimal(value: Decimal, pattern: &str) -> String {
    let fraction = pattern.split_once('.').map(|(_, f)| f).unwrap_or("");
    let max_scale = fraction.chars().filter(|c| matches!(c, '#' | '0')).count() as u32;
    let min_scale = fraction.chars().filter(|c| *c == '0').count() as u32;

    let mut rounded = value.round_dp(max_scale).normalize();
    if rounded.scale() < min_scale {
        rounded.rescale(min_scale);
    }
    rounded.to_string()
}

fn decimal_from_f64(f: f64, original: &Value) -> Result<Decimal> {
    Decimal::from_str(&f.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{f:e}")))
        .map_err(|e| SearchError::coercion(original, "Decimal", e.to_string()))
}

fn to_integer(value: Value) -> Result<Value> {
    let out = match &value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
        Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    out.map(Value::Integer).ok_or_else(|| mismatch(&value, "Integer"))
}

fn to_float(value: Value) -> Result<Value> {
    let out = match &value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Decimal(d) => d.to_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    out.map(Value::Float).ok_or_else(|| mismatch(&value, "Float"))
}

fn to_decimal(value: Value) -> Result<Value> {
    match &value {
        Value::Integer(i) => Ok(Value::Decimal(Decimal::from(*i))),
        Value::Float(f) => decimal_from_f64(*f, &value).map(Value::Decimal),
        Value::Decimal(d) => Ok(Value::Decimal(*d)),
        Value::String(s) => parse_decimal(s).map(Value::Decimal),
        _ => Err(mismatch(&value, "Decimal")),
    }
}

/// Exact decimal parsing, scientific notation accepted
pub fn parse_decimal(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| SearchError::coercion(format!("\"{text}\""), "Decimal", e.to_string()))
}

fn to_boolean(value: Value) -> Result<Value> {
    match &value {
        Value::Boolean(b) => Ok(Value::Boolean(*b)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
        _ => Err(mismatch(&value, "Boolean")),
    }
}

fn to_date(value: Value, pattern: Option<&str>) -> Result<Value> {
    match &value {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match pattern {
                Some(p) => NaiveDate::parse_from_str(s, p).ok(),
                None => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())),
            };
            parsed
                .map(Value::Date)
                .ok_or_else(|| unparsable(&value, "Date", pattern))
        }
        _ => Err(mismatch(&value, "Date")),
    }
}

fn to_datetime(value: Value, pattern: Option<&str>) -> Result<Value> {
    match &value {
        Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
        Value::Date(d) => Ok(Value::DateTime(d.and_time(NaiveTime::MIN).and_utc())),
        Value::String(s) => parse_datetime(s.trim(), pattern)
            .map(Value::DateTime)
            .ok_or_else(|| unparsable(&value, "DateTime", pattern)),
        _ => Err(mismatch(&value, "DateTime")),
    }
}

/// Parse an instant: RFC 3339 with offset, the field pattern, or a naive
/// timestamp / date taken as UTC
pub fn parse_datetime(text: &str, pattern: Option<&str>) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(p) = pattern {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, p) {
            return Some(naive.and_utc());
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, p) {
            return Some(date.and_time(NaiveTime::MIN).and_utc());
        }
        return None;
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        })
        .ok()
}

fn to_time(value: Value, pattern: Option<&str>) -> Result<Value> {
    match &value {
        Value::Time(t) => Ok(Value::Time(*t)),
        Value::DateTime(dt) => Ok(Value::Time(dt.time())),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match pattern {
                Some(p) => NaiveTime::parse_from_str(s, p).ok(),
                None => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                    .ok(),
            };
            parsed
                .map(Value::Time)
                .ok_or_else(|| unparsable(&value, "Time", pattern))
        }
        _ => Err(mismatch(&value, "Time")),
    }
}

fn unparsable(value: &Value, target: &str, pattern: Option<&str>) -> SearchError {
    let message = match pattern {
        Some(p) => format!("does not match pattern '{p}'"),
        None => "not an ISO-8601 value".to_string(),
    };
    SearchError::coercion(value, target, message)
}

fn to_period(value: Value) -> Result<Value> {
    match &value {
        Value::Period(p) => Ok(Value::Period(*p)),
        Value::String(s) => Period::parse(s).map(Value::Period),
        _ => Err(mismatch(&value, "Period")),
    }
}

fn to_enum(value: Value, native: Option<&ValueType>) -> Result<Value> {
    let native = match native {
        Some(ValueType::List(inner)) => Some(inner.as_ref()),
        other => other,
    };
    let Some(ValueType::Enum { name, members }) = native else {
        return Err(SearchError::coercion(
            &value,
            "Enum",
            "field does not declare an enumeration type",
        ));
    };

    let member = match &value {
        Value::Enum(e) if e.type_name == *name => &e.member,
        Value::Enum(e) => {
            return Err(SearchError::coercion(
                &value,
                name,
                format!("member of '{}' used where '{name}' is expected", e.type_name),
            ));
        }
        Value::String(s) => s,
        _ => return Err(mismatch(&value, name)),
    };

    if members.iter().any(|m| m == member) {
        Ok(Value::Enum(EnumValue::new(name.clone(), member.clone())))
    } else {
        Err(SearchError::coercion(
            &value,
            name,
            format!("'{member}' is not a member of '{name}'"),
        ))
    }
}

/// Check size, pattern and digit-count directives on a coerced scalar
fn validate(value: &Value, descriptor: &FieldDescriptor) -> Result<()> {
    let directives = &descriptor.directives;
    let target = descriptor.target_type().to_string();

    if let Value::String(s) = value {
        let len = s.chars().count();
        if let Some(min) = directives.min_size.filter(|min| len < *min) {
            return Err(SearchError::coercion(
                value,
                &target,
                format!("length {len} is below the minimum of {min}"),
            ));
        }
        if let Some(max) = directives.max_size.filter(|max| len > *max) {
            return Err(SearchError::coercion(
                value,
                &target,
                format!("length {len} exceeds the maximum of {max}"),
            ));
        }
    }

    if let Some(pattern) = &directives.regex_pattern {
        let regex = descriptor.pattern.as_ref().ok_or_else(|| {
            SearchError::invalid_schema(
                descriptor.declaring_type(),
                format!("invalid pattern '{pattern}' on '{}'", descriptor.path),
            )
        })?;
        if !regex.is_match(&value.to_plain_string()) {
            return Err(SearchError::coercion(
                value,
                &target,
                format!("does not match pattern '{pattern}'"),
            ));
        }
    }

    if directives.min_digits.is_some() || directives.max_digits.is_some() {
        let digits = match value {
            Value::Integer(_) | Value::Float(_) | Value::Decimal(_) | Value::String(_) => value
                .to_plain_string()
                .chars()
                .filter(char::is_ascii_digit)
                .count(),
            _ => return Ok(()),
        };
        if let Some(min) = directives.min_digits.filter(|min| digits < *min) {
            return Err(SearchError::coercion(
                value,
                &target,
                format!("{digits} digits, at least {min} required"),
            ));
        }
        if let Some(max) = directives.max_digits.filter(|max| digits > *max) {
            return Err(SearchError::coercion(
                value,
                &target,
                format!("{digits} digits, at most {max} allowed"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, PathSegment, SegmentKind};
    use rstest::rstest;
    use smallvec::smallvec;

    fn descriptor(value_type: ValueType, directives: Searchable) -> FieldDescriptor {
        FieldDescriptor::new(
            smallvec![PathSegment {
                name: "f".to_string(),
                declaring_type: "E".to_string(),
                kind: SegmentKind::Attribute,
            }],
            FieldKind::Scalar(value_type),
            directives,
        )
    }

    fn plain(value_type: ValueType) -> FieldDescriptor {
        descriptor(value_type, Searchable::default())
    }

    #[rstest]
    #[case(ValueType::Integer, Value::from("42"), Value::Integer(42))]
    #[case(ValueType::Integer, Value::Float(10.0), Value::Integer(10))]
    #[case(ValueType::Float, Value::Integer(1), Value::Float(1.0))]
    #[case(ValueType::Boolean, Value::from("TRUE"), Value::Boolean(true))]
    #[case(ValueType::String, Value::Integer(7), Value::from("7"))]
    #[case(ValueType::Period, Value::from("P6M"), Value::Period(Period::new(0, 6, 0)))]
    fn test_native_conversions(
        #[case] value_type: ValueType,
        #[case] input: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(coerce(input, &plain(value_type)).unwrap(), expected);
    }

    #[test]
    fn test_decimal_is_exact() {
        let coerced = coerce(Value::Float(1.3), &plain(ValueType::Decimal)).unwrap();
        assert_eq!(coerced, Value::Decimal(Decimal::from_str("1.3").unwrap()));
    }

    #[test]
    fn test_unparsable_literal() {
        let err = coerce(Value::from("abc"), &plain(ValueType::Integer)).unwrap_err();
        assert!(matches!(err, SearchError::TypeCoercion { .. }));
    }

    #[test]
    fn test_datetime_normalized_to_utc() {
        let coerced = coerce(
            Value::from("2018-04-26T17:41:49+02:00"),
            &plain(ValueType::DateTime),
        )
        .unwrap();
        assert_eq!(coerced.to_plain_string(), "2018-04-26T15:41:49Z");
    }

    #[test]
    fn test_string_stored_date_uses_pattern() {
        let field = descriptor(
            ValueType::String,
            Searchable::default().with_date_pattern("%Y%m%d"),
        );
        let instant = parse_datetime("2024-06-09T10:00:00Z", None).unwrap();
        assert_eq!(
            coerce(Value::DateTime(instant), &field).unwrap(),
            Value::from("20240609")
        );
    }

    #[test]
    fn test_date_pattern_parsing() {
        let field = descriptor(
            ValueType::Date,
            Searchable::default().with_date_pattern("%d/%m/%Y"),
        );
        assert_eq!(
            coerce(Value::from("09/06/2024"), &field).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 6, 9).unwrap())
        );
        assert!(coerce(Value::from("2024-06-09"), &field).is_err());
    }

    #[test]
    fn test_enum_members() {
        let field = plain(ValueType::enumeration("TestEnum", ["VALUE1", "VALUE2"]));
        assert_eq!(
            coerce(Value::from("VALUE2"), &field).unwrap(),
            Value::Enum(EnumValue::new("TestEnum", "VALUE2"))
        );
        assert!(coerce(Value::from("VALUE3"), &field).is_err());
        assert!(coerce(Value::Enum(EnumValue::new("Other", "VALUE1")), &field).is_err());
    }

    #[test]
    fn test_lists_are_coerced_element_wise() {
        let coerced = coerce(
            Value::List(vec![Value::from("1"), Value::Integer(2)]),
            &plain(ValueType::Integer),
        )
        .unwrap();
        assert_eq!(
            coerced,
            Value::List(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_constraints() {
        let sized = descriptor(ValueType::String, Searchable::default().with_size(Some(2), Some(4)));
        assert!(coerce(Value::from("abc"), &sized).is_ok());
        assert!(coerce(Value::from("a"), &sized).is_err());
        assert!(coerce(Value::from("abcde"), &sized).is_err());

        let patterned = descriptor(
            ValueType::String,
            Searchable::default().with_regex_pattern("[a-z]+@[a-z]+\\.fi"),
        );
        assert!(coerce(Value::from("test@test.fi"), &patterned).is_ok());
        assert!(coerce(Value::from("x test@test.fi"), &patterned).is_err());
        assert!(patterned.pattern.is_some());

        let broken = descriptor(ValueType::String, Searchable::default().with_regex_pattern("(["));
        assert!(broken.pattern.is_none());
        assert!(matches!(
            coerce(Value::from("a"), &broken),
            Err(SearchError::InvalidSchema { .. })
        ));

        let digits = descriptor(ValueType::Decimal, Searchable::default().with_digits(None, Some(3)));
        assert!(coerce(Value::from("1.23"), &digits).is_ok());
        assert!(coerce(Value::from("12.34"), &digits).is_err());
    }

    #[rstest]
    #[case("1.234", "#.##", "1.23")]
    #[case("1.5", "#.##", "1.5")]
    #[case("1.5", "0.00", "1.50")]
    #[case("2.345", "#", "2")]
    fn test_format_decimal(#[case] input: &str, #[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(
            format_decimal(Decimal::from_str(input).unwrap(), pattern),
            expected
        );
    }

    #[test]
    fn test_convert_native_for_records() {
        assert_eq!(
            convert_native(Value::from("2024-03-01"), &ValueType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(convert_native(Value::Integer(1), &ValueType::List(Box::new(ValueType::Integer))).is_err());
    }
}
