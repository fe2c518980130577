//! Filter behaviour end to end over the in-memory backend

mod common;

use std::sync::Arc;

use common::{engine, integers, request, setup, setup2};
use entity_search::backend::QueryBuilder;
use entity_search::backend::memory::MemoryBackend;
use entity_search::{Arity, Operand, OperatorKind, SearchError, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn search(backend: &MemoryBackend, filter: &str) -> Vec<i64> {
    let engine = engine();
    let request = request(&engine, &format!(r#"{{"filter": {filter}}}"#));
    integers(&engine.search(backend, "TestEntity", &request).unwrap())
}

fn search_error(backend: &MemoryBackend, filter: &str) -> SearchError {
    let engine = engine();
    let request = request(&engine, &format!(r#"{{"filter": {filter}}}"#));
    engine.search(backend, "TestEntity", &request).unwrap_err()
}

#[test]
fn test_all_filters() {
    let filter = r#"
    ["and",
      ["and",
        ["and",
          ["eq", ["field", "primitiveInteger"], 6],
          ["eq", ["lower", ["field", "email"]], "test@test.fi"],
          ["lt", ["field", "primitiveLong"], 10],
          ["in", ["field", "primitiveDouble"], 1.3, 1.4],
          ["between", ["field", "primitiveFloat"], 1.3, 1.4],
          ["lte", ["field", "wrapperLong"], 10],
          ["not", ["in", ["field", "wrapperDouble"], 1.3, 1.4]],
          ["isNull", ["field", "wrapperInteger"]],
          ["eq", ["field", "integerString"], ""],
          ["eq", ["field", "testEnum"], ["enum", "TestEnum", "VALUE1"]],
          ["eq", ["field", "period"], ["period", "P6M"]]
        ]
      ],
      ["and",
        ["not", ["isNull", ["field", "dateString"]]],
        ["not", ["eq", ["field", "bigDecimal"], ["bigDecimal", "1.35"]]],
        ["eq", ["field", "bigDecimal"], ["bigDecimal", "1.23"]],
        ["eq", ["field", "testEntity2.string"], "Nested! daa dumdidum"],
        ["not", ["eq", ["lower", ["field", "testEntity2.string"]], "blaa!"]],
        ["startsWith", ["field", "testEntity2.string"], "Nested!"],
        ["startsWith", ["lower", ["field", "testEntity2.string"]], "nested!"],
        ["contains", ["field", "testEntity2.string"], "Nested!"],
        ["contains", ["lower", ["field", "testEntity2.string"]], "nested!"],
        ["endsWith", ["field", "testEntity2.string"], "dum"],
        ["endsWith", ["lower", ["field", "testEntity2.string"]], "dum"]
      ]
    ]"#;
    assert_eq!(search(&setup(), filter), vec![6]);
}

#[test]
fn test_date_filters() {
    let filter = r#"
    ["and",
      ["gt", ["field", "date1"], ["date", "2018-04-26T15:41:49Z"]],
      ["gte", ["field", "date2"], ["date", "2018-04-26T17:41:49+02:00"]],
      ["eq", ["field", "dateString"], ["date", "2024-06-09T08:00:00Z"]],
      ["eq", ["field", "localDate"], "2024-06-09"],
      ["lt", ["field", "localTime"], "13:00"]
    ]"#;
    assert_eq!(search(&setup(), filter), vec![6]);
}

#[test]
fn test_or_operator() {
    let filter = r#"["or",
        ["eq", ["field", "primitiveInteger"], 6],
        ["eq", ["field", "primitiveInteger"], 7]
    ]"#;
    assert_eq!(search(&setup(), filter), vec![6]);
    assert_eq!(search(&setup2(), filter), vec![6, 7]);
}

#[test]
fn test_not_operator() {
    let filter = r#"["not", ["eq", ["field", "primitiveInteger"], 7]]"#;
    assert_eq!(search(&setup(), filter), vec![6]);
}

#[test]
fn test_enum() {
    let filter = r#"["eq", ["field", "testEnum"], ["enum", "TestEnum", "VALUE1"]]"#;
    assert_eq!(search(&setup2(), filter), vec![6]);
}

#[test]
fn test_enum_unknown_member() {
    let err = search_error(
        &setup2(),
        r#"["eq", ["field", "testEnum"], ["enum", "TestEnum", "VALUE3"]]"#,
    );
    assert!(matches!(err, SearchError::TypeCoercion { .. }));
}

#[rstest]
#[case::one_to_many(r#"["in", ["field", ">testEntity2s.string"], "nested1"]"#)]
#[case::nested_one_to_many(r#"["in", ["field", ">testEntity2s>testEntity3s.string"], "nested3"]"#)]
#[case::one_then_many(r#"["in", ["field", ">testEntity2>testEntity3s.string"], "nested3"]"#)]
fn test_one_to_many(#[case] filter: &str) {
    assert_eq!(search(&setup2(), filter), vec![7]);
}

#[rstest]
#[case(r#"["eq", ["field", "testEntity2.string"], "nested2"]"#, vec![7])]
#[case(r#"["eq", ["field", ">testEntity2.string"], "nested1"]"#, vec![6])]
#[case(r#"["eq_ignorecase", ["field", "testEntity2.string"], "NESTED2"]"#, vec![7])]
#[case(r#"["noteq_ignorecase", ["field", "testEntity2.string"], "NESTED2"]"#, vec![6])]
#[case(r#"["contains_ignorecase", ["field", "email"], "TEST.FI"]"#, vec![6, 7])]
#[case(r#"["startsWith_ignorecase", ["field", ">testEntity2s.string"], "NESTED"]"#, vec![7])]
#[case(r#"["endsWith_ignorecase", ["field", "email"], "@TEST.FI"]"#, vec![6, 7])]
#[case(r#"["nin", ["field", "primitiveInteger"], [6, 8]]"#, vec![7])]
#[case(r#"["in", ["field", "primitiveInteger"], []]"#, vec![])]
#[case(r#"["nin", ["field", "primitiveInteger"], []]"#, vec![6, 7])]
#[case(r#"["between", ["field", "primitiveInteger"], [7, 9]]"#, vec![7])]
#[case(r#"["eq", ["field", "period"], "P12M"]"#, vec![6])]
#[case(r#"["isEmpty", ["field", "testEntity2s"]]"#, vec![6])]
#[case(r#"["isNotEmpty", ["field", "testEntity2s"]]"#, vec![7])]
#[case(r#"["isNotNull", ["field", "testEntity2.string"]]"#, vec![6, 7])]
#[case(r#"["noteq", ["field", "wrapperInteger"], null]"#, vec![])]
#[case(r#"["eq", ["field", "wrapperInteger"], null]"#, vec![6, 7])]
#[case(r#"["eq", ["field", "fieldName"], "fieldName"]"#, vec![6, 7])]
#[case(r#"["eq", ["field", "wrapperBoolean"], "true"]"#, vec![6, 7])]
#[case(r#"["not", ["field", "primitiveBoolean"]]"#, vec![6, 7])]
#[case(r#"["and", ["field", "wrapperBoolean"], ["gt", ["field", "primitiveInteger"], 6]]"#, vec![7])]
fn test_operator_semantics(#[case] filter: &str, #[case] expected: Vec<i64>) {
    assert_eq!(search(&setup2(), filter), expected);
}

#[test]
fn test_relation_alias_and_canonical_agree() {
    let backend = setup2();
    assert_eq!(
        search(&backend, r#"["eq", ["field", "testEntity2.string"], "nested2"]"#),
        search(&backend, r#"["eq", ["field", ">testEntity2.string"], "nested2"]"#),
    );
}

#[test]
fn test_inherited_fields_through_relation() {
    let engine = engine();
    let mut backend = MemoryBackend::new(Arc::clone(engine.schema()));
    let json = serde_json::json!([
        {"title": "first", "category": {"name": "books", "description": "paper"}},
        {"title": "second", "category": {"name": "music", "description": "vinyl"}},
        {"title": "third", "category": null}
    ]);
    backend.load_json("TestEntityWithCategory", &json).unwrap();

    let request = request(
        &engine,
        r#"{"filter": ["eq", ["field", "category.name"], "music"]}"#,
    );
    let found = engine
        .search(&backend, "TestEntityWithCategory", &request)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value("title"), Some(&Value::from("second")));
}

#[rstest]
#[case(r#"["eq", ["field", "primitiveInteger"], "six"]"#)]
#[case(r#"["eq", ["field", "testEnum"], "VALUE9"]"#)]
#[case(r#"["eq", ["field", "localDate"], "09.06.2024"]"#)]
fn test_coercion_failures(#[case] filter: &str) {
    assert!(matches!(
        search_error(&setup(), filter),
        SearchError::TypeCoercion { .. }
    ));
}

#[rstest]
#[case(r#"["isNull", "literal"]"#)]
#[case(r#"["isEmpty", ["field", "string"]]"#)]
#[case(r#"["between", ["field", "primitiveInteger"], [1]]"#)]
#[case(r#"["eq", ["field", "primitiveInteger"]]"#)]
#[case(r#"["and", ["field", "string"]]"#)]
#[case(r#"["not", "yes"]"#)]
#[case(r#"["and"]"#)]
#[case(r#"["or"]"#)]
#[case(r#"["in", ["field", "primitiveInteger"]]"#)]
#[case(r#"["between", ["field", "primitiveInteger"], 1, 2, 3]"#)]
fn test_malformed_expressions(#[case] filter: &str) {
    assert!(matches!(
        search_error(&setup(), filter),
        SearchError::MalformedExpression { .. }
    ));
}

#[test]
fn test_unknown_field() {
    assert!(matches!(
        search_error(&setup(), r#"["eq", ["field", "nope"], 1]"#),
        SearchError::UnknownField { .. }
    ));
}

#[test]
fn test_own_boolean_operator() {
    let engine = engine();
    engine
        .register_fn("ownFunc", OperatorKind::Terminal, Arity::exactly(1), |ctx, args| {
            let Some(Operand::Value(value)) = args.into_iter().next() else {
                return Err(SearchError::malformed("ownFunc", "expected a literal"));
            };
            let Operand::Field { expr, .. } = ctx.field(">testEntity2.string")? else {
                return Err(SearchError::malformed("ownFunc", "expected a field"));
            };
            let builder = ctx.builder();
            Ok(Operand::Predicate(builder.equal(expr, builder.literal(value))))
        })
        .unwrap();

    let request = request(&engine, r#"{"filter": ["ownFunc", "nested2"]}"#);
    let found = engine.search(&setup2(), "TestEntity", &request).unwrap();
    assert_eq!(integers(&found), vec![7]);
}

#[test]
fn test_own_string_operator() {
    let engine = engine();
    engine
        .register_fn(
            "ownFunc2",
            OperatorKind::ValueTransform,
            Arity::exactly(1),
            |ctx, args| {
                let Some(Operand::Value(suffix)) = args.into_iter().next() else {
                    return Err(SearchError::malformed("ownFunc2", "expected a literal"));
                };
                let Operand::Field { expr, .. } = ctx.field(">testEntity2.string")? else {
                    return Err(SearchError::malformed("ownFunc2", "expected a field"));
                };
                let builder = ctx.builder();
                Ok(Operand::Expr(builder.concat(expr, builder.literal(suffix))))
            },
        )
        .unwrap();

    let transformed = request(&engine, r#"{"filter": ["eq", ["ownFunc2", "blah"], "nested2blah"]}"#);
    let found = engine.search(&setup2(), "TestEntity", &transformed).unwrap();
    assert_eq!(integers(&found), vec![7]);

    let builtin = request(&engine, r#"{"filter": ["eq", ["field", "primitiveInteger"], 6]}"#);
    let found = engine.search(&setup2(), "TestEntity", &builtin).unwrap();
    assert_eq!(integers(&found), vec![6]);
}
