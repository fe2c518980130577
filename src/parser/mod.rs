//! Filter expression parser
//!
//! Converts the nested-array JSON wire form into a [`FilterExpression`] tree.
//! Operator names are checked against the registry while parsing; argument
//! types are checked later, when the tree is compiled.

mod request;

pub use request::{SearchRequest, parse_request};

use serde_json::Value as JsonValue;

use crate::ast::{FIELD_FORM, FilterExpression};
use crate::core::{Result, SearchError, Value};

/// Name check used by the parser
pub trait OperatorLookup {
    fn contains(&self, name: &str) -> bool;
}

/// Parser over a registry snapshot
pub struct FilterParser<'l, L: OperatorLookup + ?Sized> {
    operators: &'l L,
    max_depth: usize,
}

impl<'l, L: OperatorLookup + ?Sized> FilterParser<'l, L> {
    pub fn new(operators: &'l L, max_depth: usize) -> Self {
        Self {
            operators,
            max_depth,
        }
    }

    /// Parse a filter from its JSON text
    pub fn parse_str(&self, input: &str) -> Result<FilterExpression> {
        let json: JsonValue = serde_json::from_str(input)
            .map_err(|e| SearchError::invalid_request(format!("invalid JSON: {e}")))?;
        self.parse(&json)
    }

    /// Parse a filter from a JSON tree
    pub fn parse(&self, json: &JsonValue) -> Result<FilterExpression> {
        self.parse_node(json, 1)
    }

    /// An array with a string head is always a call, so a list literal never
    /// starts with a string (`[1, 2]` is a list, `["a", "b"]` calls `a`).
    /// String members go to variadic operators directly:
    /// `["in", ["field", "f"], "a", "b"]`.
    fn parse_node(&self, json: &JsonValue, depth: usize) -> Result<FilterExpression> {
        if depth > self.max_depth {
            return Err(SearchError::malformed(
                "filter",
                format!("nesting exceeds the maximum depth of {}", self.max_depth),
            ));
        }

        match json {
            JsonValue::Array(items) => match items.split_first() {
                Some((JsonValue::String(head), args)) => self.parse_call(head, args, depth),
                _ => list_literal(items),
            },
            JsonValue::Object(_) => Err(SearchError::malformed(
                "object",
                "objects are not valid filter expressions",
            )),
            scalar => Value::from_json(scalar).map(FilterExpression::Literal),
        }
    }

    fn parse_call(&self, head: &str, args: &[JsonValue], depth: usize) -> Result<FilterExpression> {
        if head == FIELD_FORM {
            return match args {
                [JsonValue::String(path)] => Ok(FilterExpression::field(path.as_str())),
                _ => Err(SearchError::malformed(
                    FIELD_FORM,
                    "expected exactly one string path",
                )),
            };
        }

        if !self.operators.contains(head) {
            return Err(SearchError::UnknownOperator {
                name: head.to_string(),
            });
        }

        let args = args
            .iter()
            .map(|arg| self.parse_node(arg, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(FilterExpression::call(head, args))
    }
}

fn list_literal(items: &[JsonValue]) -> Result<FilterExpression> {
    items
        .iter()
        .map(|item| match item {
            JsonValue::Object(_) => Err(SearchError::malformed(
                "object",
                "objects are not valid list elements",
            )),
            other => Value::from_json(other),
        })
        .collect::<Result<Vec<_>>>()
        .map(|values| FilterExpression::Literal(Value::List(values)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Names(&'static [&'static str]);

    impl OperatorLookup for Names {
        fn contains(&self, name: &str) -> bool {
            self.0.contains(&name)
        }
    }

    const OPERATORS: Names = Names(&["and", "eq", "in", "isNull", "lower"]);

    fn parse(json: JsonValue) -> Result<FilterExpression> {
        FilterParser::new(&OPERATORS, 64).parse(&json)
    }

    #[test]
    fn test_parse_nested_call() {
        let expr = parse(json!(["and",
            ["eq", ["field", "name"], "x"],
            ["isNull", ["field", ">children.name"]]
        ]))
        .unwrap();
        assert_eq!(
            expr,
            FilterExpression::call(
                "and",
                [
                    FilterExpression::call(
                        "eq",
                        [FilterExpression::field("name"), FilterExpression::literal("x")]
                    ),
                    FilterExpression::call("isNull", [FilterExpression::field(">children.name")]),
                ]
            )
        );
    }

    #[test]
    fn test_list_literals() {
        let expr = parse(json!(["in", ["field", "n"], [1, 2], []])).unwrap();
        let FilterExpression::Call(call) = expr else {
            panic!("expected a call");
        };
        assert_eq!(
            call.args[1],
            FilterExpression::Literal(Value::List(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert_eq!(call.args[2], FilterExpression::Literal(Value::List(vec![])));
    }

    #[test]
    fn test_string_headed_arrays_are_calls() {
        let err = parse(json!(["in", ["field", "n"], ["a", "b"]])).unwrap_err();
        assert!(matches!(err, SearchError::UnknownOperator { name } if name == "a"));

        let expr = parse(json!(["in", ["field", "n"], "a", "b"])).unwrap();
        let FilterExpression::Call(call) = expr else {
            panic!("expected a call");
        };
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.args[2], FilterExpression::literal("b"));
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse(json!(["and", ["frobnicate", 1]])).unwrap_err();
        assert!(matches!(err, SearchError::UnknownOperator { name } if name == "frobnicate"));
    }

    #[test]
    fn test_malformed_inputs() {
        for input in [
            json!({"eq": 1}),
            json!(["field"]),
            json!(["field", 1]),
            json!(["field", "a", "b"]),
            json!(["in", ["field", "n"], [{"a": 1}]]),
        ] {
            let err = parse(input.clone()).unwrap_err();
            assert!(
                matches!(err, SearchError::MalformedExpression { .. }),
                "{input} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut json = json!(["isNull", ["field", "a"]]);
        for _ in 0..4 {
            json = json!(["and", json]);
        }
        assert!(FilterParser::new(&OPERATORS, 6).parse(&json).is_ok());
        assert!(matches!(
            FilterParser::new(&OPERATORS, 5).parse(&json),
            Err(SearchError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_scalar_root() {
        assert_eq!(parse(json!(true)).unwrap(), FilterExpression::literal(true));
    }
}
