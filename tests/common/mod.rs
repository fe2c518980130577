//! Shared fixture: a small entity graph with every scalar type

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use entity_search::backend::memory::{MemoryBackend, MemoryBuilder, Record};
use entity_search::core::{EnumValue, Period, Value};
use entity_search::model::{
    Cardinality, EntitySchema, FieldSchema, SchemaRegistry, Searchable, ValueType,
};
use entity_search::{SearchEngine, SearchRequest};
use rust_decimal::Decimal;

pub type Engine = SearchEngine<MemoryBuilder>;

pub fn test_enum() -> ValueType {
    ValueType::enumeration("TestEnum", ["VALUE1", "VALUE2"])
}

pub fn schema() -> SchemaRegistry {
    let scalar = |name: &str, value_type: ValueType| FieldSchema::scalar(name, value_type).searchable();

    let test_entity = EntitySchema::new("TestEntity")
        .field(FieldSchema::scalar("id", ValueType::Integer))
        .field(scalar("primitiveInteger", ValueType::Integer))
        .field(scalar("wrapperInteger", ValueType::Integer))
        .field(scalar("string", ValueType::String))
        .field(scalar("email", ValueType::String))
        .field(scalar("integerString", ValueType::String))
        .field(
            FieldSchema::scalar("dateString", ValueType::String)
                .with_directives(Searchable::default().with_date_pattern("%Y%m%d")),
        )
        .field(scalar("date1", ValueType::DateTime))
        .field(scalar("date2", ValueType::DateTime))
        .field(scalar("primitiveLong", ValueType::Integer))
        .field(scalar("wrapperLong", ValueType::Integer))
        .field(scalar("primitiveFloat", ValueType::Float))
        .field(
            FieldSchema::scalar("wrapperFloat", ValueType::Float)
                .with_directives(Searchable::default().with_sortable(false)),
        )
        .field(scalar("primitiveDouble", ValueType::Float))
        .field(scalar("wrapperDouble", ValueType::Float))
        .field(scalar("bigDecimal", ValueType::Decimal))
        .field(scalar("localDateTime", ValueType::DateTime))
        .field(scalar("localDate", ValueType::Date))
        .field(scalar("localTime", ValueType::Time))
        .field(scalar("offsetDateTime", ValueType::DateTime))
        .field(scalar("offsetTime", ValueType::Time))
        .field(
            FieldSchema::scalar("fieldName", ValueType::String)
                .with_directives(Searchable::default().with_trim(true)),
        )
        .field(scalar("primitiveBoolean", ValueType::Boolean))
        .field(scalar("wrapperBoolean", ValueType::Boolean))
        .field(FieldSchema::relation("testEntity2", "TestEntity2", Cardinality::One).nested())
        .field(
            FieldSchema::relation("testEntity2s", "TestEntity2", Cardinality::Many)
                .nested()
                .searchable(),
        )
        .field(scalar("testEnum", test_enum()))
        .field(scalar("period", ValueType::Period));

    let test_entity2 = EntitySchema::new("TestEntity2")
        .field(FieldSchema::scalar("id", ValueType::Integer))
        .field(scalar("string", ValueType::String))
        .field(FieldSchema::relation("testEntity3s", "TestEntity3", Cardinality::Many).nested());

    let test_entity3 = EntitySchema::new("TestEntity3")
        .field(FieldSchema::scalar("id", ValueType::Integer))
        .field(scalar("string", ValueType::String));

    let base = EntitySchema::new("BaseMappedSuperclass")
        .field(FieldSchema::scalar("id", ValueType::Integer))
        .field(scalar("name", ValueType::String))
        .field(scalar("description", ValueType::String));

    let category = EntitySchema::new("TestCategory").extends("BaseMappedSuperclass");

    let with_category = EntitySchema::new("TestEntityWithCategory")
        .field(FieldSchema::scalar("id", ValueType::Integer))
        .field(scalar("title", ValueType::String))
        .field(FieldSchema::relation("category", "TestCategory", Cardinality::One).nested());

    let mut registry = SchemaRegistry::new();
    for entity in [
        test_entity,
        test_entity2,
        test_entity3,
        base,
        category,
        with_category,
    ] {
        registry.register(entity).expect("unique entity names");
    }
    registry
}

pub fn engine() -> Engine {
    SearchEngine::new(schema()).expect("valid schema")
}

fn instant(y: i32, m: u32, d: u32) -> Value {
    Value::DateTime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

/// A `TestEntity` record with the fixture's fixed scalar values
pub fn test_entity(
    primitive_integer: i64,
    test_entity2: Option<Arc<Record>>,
    test_entity2s: Vec<Arc<Record>>,
    test_enum: &str,
    period: &str,
) -> Record {
    Record::new("TestEntity")
        .with("primitiveInteger", primitive_integer)
        .with("wrapperInteger", Value::Null)
        .with("string", "asdf")
        .with("email", "test@test.fi")
        .with("integerString", "")
        .with("dateString", "20240609")
        .with("date1", instant(2024, 3, 1))
        .with("date2", instant(2024, 3, 1))
        .with("primitiveLong", 1i64)
        .with("wrapperLong", 10i64)
        .with("primitiveFloat", 1.35)
        .with("wrapperFloat", 5.6)
        .with("primitiveDouble", 1.3)
        .with("wrapperDouble", 2.3)
        .with("bigDecimal", Decimal::from_str("1.23").unwrap())
        .with("localDateTime", instant(2024, 6, 9))
        .with("localDate", NaiveDate::from_ymd_opt(2024, 6, 9).unwrap())
        .with("localTime", Value::Time(NaiveTime::from_hms_opt(12, 30, 0).unwrap()))
        .with("offsetDateTime", instant(2024, 6, 9))
        .with("offsetTime", Value::Time(NaiveTime::from_hms_opt(12, 30, 0).unwrap()))
        .with("fieldName", " fieldName ")
        .with("primitiveBoolean", false)
        .with("wrapperBoolean", true)
        .with_one("testEntity2", test_entity2)
        .with_many("testEntity2s", test_entity2s)
        .with("testEnum", EnumValue::new("TestEnum", test_enum))
        .with("period", Period::parse(period).unwrap())
}

fn nested(entity: &str, string: &str) -> Record {
    Record::new(entity).with("string", string)
}

/// One entity whose single relation points at a `TestEntity2`
pub fn setup() -> MemoryBackend {
    let mut backend = MemoryBackend::new(schema());
    let ent2 = backend
        .insert(nested("TestEntity2", "Nested! daa dumdidum").with_many("testEntity3s", []))
        .unwrap();
    backend
        .insert(test_entity(6, Some(ent2), Vec::new(), "VALUE1", "P6M"))
        .unwrap();
    backend
}

/// Two entities; the second reaches `TestEntity3` records through both
/// relations
pub fn setup2() -> MemoryBackend {
    let mut backend = MemoryBackend::new(schema());
    let ent3a = backend.insert(nested("TestEntity3", "nested3")).unwrap();
    let ent3b = backend.insert(nested("TestEntity3", "nested4")).unwrap();
    let ent2a = backend
        .insert(nested("TestEntity2", "nested1").with_many("testEntity3s", []))
        .unwrap();
    let ent2b = backend
        .insert(nested("TestEntity2", "nested2").with_many("testEntity3s", [ent3a, ent3b]))
        .unwrap();

    backend
        .insert(test_entity(6, Some(Arc::clone(&ent2a)), Vec::new(), "VALUE1", "P12M"))
        .unwrap();
    backend
        .insert(test_entity(
            7,
            Some(Arc::clone(&ent2b)),
            vec![ent2a, ent2b],
            "VALUE2",
            "P6M",
        ))
        .unwrap();
    backend
}

/// Parse a request envelope with the engine's registry
pub fn request(engine: &Engine, json: &str) -> SearchRequest {
    engine.parse_request_str(json).expect("valid request")
}

/// `primitiveInteger` of every record, in order
pub fn integers(records: &[Arc<Record>]) -> Vec<i64> {
    records
        .iter()
        .map(|record| match record.value("primitiveInteger") {
            Some(Value::Integer(i)) => *i,
            other => panic!("unexpected primitiveInteger {other:?}"),
        })
        .collect()
}
