//! Behavioural properties of compilation and execution

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{engine, integers, request, setup2};
use entity_search::backend::{QueryBuilder, QueryExecutor};
use entity_search::backend::memory::{MemoryBackend, MemoryBuilder, Record};
use entity_search::model::{Cardinality, EntitySchema, FieldSchema, SchemaRegistry, ValueType};
use entity_search::{
    Arity, EngineConfig, OperatorCollisionPolicy, OperatorKind, SearchEngine, SearchError, Value,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const FILTERS: [&str; 5] = [
    r#"["eq", ["field", "primitiveInteger"], 6]"#,
    r#"["contains", ["field", ">testEntity2s.string"], "nested"]"#,
    r#"["in", ["field", ">testEntity2s>testEntity3s.string"], "nested4"]"#,
    r#"["eq", ["field", "testEnum"], "VALUE2"]"#,
    r#"["isNull", ["field", "wrapperInteger"]]"#,
];

fn matches(filter: &str) -> BTreeSet<i64> {
    let engine = engine();
    let request = request(&engine, &format!(r#"{{"filter": {filter}}}"#));
    integers(&engine.search(&setup2(), "TestEntity", &request).unwrap())
        .into_iter()
        .collect()
}

#[test]
fn test_compilation_is_deterministic() {
    let engine = engine();
    let backend = setup2();
    for filter in FILTERS {
        let request = request(
            &engine,
            &format!(r#"{{"filter": {filter}, "options": {{"sortKey": "-testEntity2.string"}}}}"#),
        );
        let first = engine.compile(backend.builder(), "TestEntity", &request).unwrap();
        let second = engine.compile(backend.builder(), "TestEntity", &request).unwrap();
        assert_eq!(first.predicate, second.predicate);
        assert_eq!(first.joins, second.joins);
        assert_eq!(first.orders.len(), second.orders.len());
    }
}

#[rstest]
fn test_double_negation(#[values(0, 1, 2, 3, 4)] index: usize) {
    let filter = FILTERS[index];
    assert_eq!(matches(&format!(r#"["not", ["not", {filter}]]"#)), matches(filter));
}

#[rstest]
#[case(0, 1)]
#[case(1, 3)]
#[case(2, 4)]
#[case(3, 0)]
fn test_and_intersects_or_unites(#[case] a: usize, #[case] b: usize) {
    let (left, right) = (matches(FILTERS[a]), matches(FILTERS[b]));
    let both = matches(&format!(r#"["and", {}, {}]"#, FILTERS[a], FILTERS[b]));
    let either = matches(&format!(r#"["or", {}, {}]"#, FILTERS[a], FILTERS[b]));
    assert_eq!(both, left.intersection(&right).copied().collect());
    assert_eq!(either, left.union(&right).copied().collect());
}

#[test]
fn test_descending_reverses_ascending() {
    let engine = engine();
    let backend = setup2();
    let run = |key: &str| {
        let request = request(&engine, &format!(r#"{{"options": {{"sortKey": "{key}"}}}}"#));
        integers(&engine.search(&backend, "TestEntity", &request).unwrap())
    };
    let mut ascending = run("testEntity2.string");
    ascending.reverse();
    assert_eq!(run("-testEntity2.string"), ascending);
}

#[test]
fn test_pages_concatenate_to_full_result() {
    let engine = engine();
    let backend = setup2();
    let sort = r#""sortKey": ["-primitiveInteger"]"#;
    let all = engine
        .search(&backend, "TestEntity", &request(&engine, &format!(r#"{{"options": {{{sort}}}}}"#)))
        .unwrap();

    let mut paged = Vec::new();
    for offset in 0..all.len() {
        let request = request(
            &engine,
            &format!(r#"{{"options": {{{sort}, "pageSize": 1, "pageOffset": {offset}}}}}"#),
        );
        let page = engine.search_page(&backend, "TestEntity", &request).unwrap();
        assert_eq!(page.total_pages, all.len());
        paged.extend(page.content);
    }
    assert_eq!(integers(&paged), integers(&all));
}

#[test]
fn test_collection_match_returns_each_root_once() {
    let engine = engine();
    let request = request(
        &engine,
        r#"{"filter": ["contains", ["field", ">testEntity2s>testEntity3s.string"], "nested"]}"#,
    );
    let backend = setup2();
    let found = engine.search(&backend, "TestEntity", &request).unwrap();
    assert_eq!(integers(&found), vec![7]);

    let query = engine.compile(backend.builder(), "TestEntity", &request).unwrap();
    assert_eq!(backend.count(&query).unwrap(), 1);
}

#[test]
fn test_shared_prefix_joined_once() {
    let engine = engine();
    let backend = setup2();
    let request = request(
        &engine,
        r#"{
            "filter": ["or",
                ["eq", ["field", ">testEntity2s.string"], "nested1"],
                ["eq", ["field", ">testEntity2s>testEntity3s.string"], "nested3"],
                ["isNotNull", ["field", ">testEntity2s>testEntity3s.string"]]
            ],
            "options": {"sortKey": ["testEntity2.string", "-testEntity2.string"]}
        }"#,
    );
    let query = engine.compile(backend.builder(), "TestEntity", &request).unwrap();
    assert_eq!(query.joins, 3);
}

#[test]
fn test_unknown_operator_rejected_when_parsing() {
    let engine = engine();
    let err = engine
        .parse_request_str(r#"{"filter": ["and", ["startsLike", ["field", "string"], "a"]]}"#)
        .unwrap_err();
    assert!(matches!(err, SearchError::UnknownOperator { ref name } if name == "startsLike"));
}

#[test]
fn test_unknown_field_rejected_when_compiling() {
    let engine = engine();
    let request = request(&engine, r#"{"filter": ["eq", ["field", ">testEntity2s.missing"], 1]}"#);
    let err = engine
        .compile(setup2().builder(), "TestEntity", &request)
        .unwrap_err();
    assert!(matches!(err, SearchError::UnknownField { .. }));
}

#[test]
fn test_unknown_entity() {
    let engine = engine();
    let err = engine
        .search(&setup2(), "Nope", &request(&engine, "{}"))
        .unwrap_err();
    assert!(matches!(err, SearchError::UnknownEntity { .. }));
}

#[test]
fn test_nesting_depth_limit() {
    let engine = SearchEngine::<MemoryBuilder>::with_config(
        common::schema(),
        EngineConfig::default().with_max_expression_depth(3),
    )
    .unwrap();
    let shallow = r#"{"filter": ["not", ["not", ["field", "wrapperBoolean"]]]}"#;
    let deep = r#"{"filter": ["not", ["not", ["not", ["not", ["field", "wrapperBoolean"]]]]]}"#;
    assert!(engine.parse_request_str(shallow).is_ok());
    assert!(matches!(
        engine.parse_request_str(deep).unwrap_err(),
        SearchError::MalformedExpression { .. }
    ));
}

fn pets() -> (SearchEngine<MemoryBuilder>, MemoryBackend) {
    let schema = SchemaRegistry::new()
        .with(
            EntitySchema::new("Animal")
                .field(FieldSchema::scalar("name", ValueType::String).searchable()),
        )
        .and_then(|r| {
            r.with(
                EntitySchema::new("Dog")
                    .extends("Animal")
                    .field(FieldSchema::scalar("breed", ValueType::String).searchable()),
            )
        })
        .and_then(|r| {
            r.with(
                EntitySchema::new("Person")
                    .field(FieldSchema::scalar("name", ValueType::String).searchable())
                    .field(FieldSchema::relation("pets", "Animal", Cardinality::Many).nested()),
            )
        })
        .unwrap();
    let engine = SearchEngine::<MemoryBuilder>::new(schema).unwrap();
    let mut backend = MemoryBackend::new(Arc::clone(engine.schema()));
    backend
        .load_json(
            "Person",
            &serde_json::json!([
                {"name": "ann", "pets": [{"$type": "Dog", "name": "rex", "breed": "collie"}]},
                {"name": "bob", "pets": [{"name": "tom"}]},
                {"name": "cid", "pets": []}
            ]),
        )
        .unwrap();
    backend
        .load_json(
            "Animal",
            &serde_json::json!([
                {"name": "kit"},
                {"$type": "Dog", "name": "fido", "breed": "pug"}
            ]),
        )
        .unwrap();
    (engine, backend)
}

fn names(records: &[Arc<Record>]) -> Vec<String> {
    records
        .iter()
        .map(|record| match record.value("name") {
            Some(Value::String(name)) => name.clone(),
            other => panic!("unexpected name {other:?}"),
        })
        .collect()
}

#[rstest]
#[case("Person", r#"["eq", ["field", ">pets.breed"], "collie"]"#, vec!["ann"])]
#[case("Person", r#"["isNull", ["field", ">pets.breed"]]"#, vec!["bob", "cid"])]
#[case("Animal", r#"["isNotNull", ["field", "breed"]]"#, vec!["fido"])]
#[case("Animal", r#"["isNull", ["field", "breed"]]"#, vec!["kit"])]
#[case("Dog", r#"["eq", ["field", "name"], "fido"]"#, vec!["fido"])]
fn test_subtype_fields_narrow_the_path(
    #[case] entity: &str,
    #[case] filter: &str,
    #[case] expected: Vec<&str>,
) {
    let (engine, backend) = pets();
    let request = engine
        .parse_request_str(&format!(r#"{{"filter": {filter}}}"#))
        .unwrap();
    let found = engine.search(&backend, entity, &request).unwrap();
    assert_eq!(names(&found), expected);
}

#[test]
fn test_custom_operator_leaves_builtins_unaffected() {
    let engine = engine();
    let before = engine.operators();
    let builtins = before.names().len();

    engine
        .register_fn("isTrue", OperatorKind::Terminal, Arity::exactly(1), |ctx, args| {
            let builder = ctx.builder();
            args.into_iter()
                .next()
                .ok_or_else(|| SearchError::malformed("isTrue", "missing argument"))?
                .into_predicate("isTrue", builder)
                .map(entity_search::Operand::Predicate)
        })
        .unwrap();

    assert!(!before.contains("isTrue"));
    assert_eq!(engine.operators().names().len(), builtins + 1);
    let builtin = request(&engine, r#"{"filter": ["eq", ["field", "primitiveInteger"], 7]}"#);
    let found = engine.search(&setup2(), "TestEntity", &builtin).unwrap();
    assert_eq!(integers(&found), vec![7]);

    let custom = request(&engine, r#"{"filter": ["isTrue", ["field", "wrapperBoolean"]]}"#);
    let found = engine.search(&setup2(), "TestEntity", &custom).unwrap();
    assert_eq!(integers(&found), vec![6, 7]);
}

#[test]
fn test_reject_policy_refuses_builtin_names() {
    let engine = SearchEngine::<MemoryBuilder>::with_config(
        common::schema(),
        EngineConfig::default().with_collision_policy(OperatorCollisionPolicy::Reject),
    )
    .unwrap();
    let Err(err) = engine.register_fn("eq", OperatorKind::Terminal, Arity::exactly(2), |_, _| {
        Err(SearchError::execution("unreachable"))
    }) else {
        panic!("a built-in name must be rejected");
    };
    assert!(matches!(err, SearchError::OperatorConflict { .. }));
}

#[test]
fn test_override_policy_replaces_builtin() {
    let engine = engine();
    let shadowed = engine
        .register_fn("eq", OperatorKind::Terminal, Arity::exactly(2), |ctx, _| {
            Ok(entity_search::Operand::Predicate(ctx.builder().constant(false)))
        })
        .unwrap();
    assert!(shadowed.is_some());

    let request = request(&engine, r#"{"filter": ["eq", ["field", "primitiveInteger"], 6]}"#);
    assert!(engine.search(&setup2(), "TestEntity", &request).unwrap().is_empty());
}
