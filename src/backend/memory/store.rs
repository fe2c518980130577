//! In-memory records

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::core::{Result, SearchError, Value};
use crate::evaluator::coercion::convert_native;
use crate::model::{Cardinality, FieldKind, SchemaRegistry};

/// Key naming the concrete type of a JSON record
pub const TYPE_KEY: &str = "$type";

/// Content of one record field
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Value(Value),
    /// Value object stored inline
    Embedded(Arc<Record>),
    /// Single-valued relation
    One(Option<Arc<Record>>),
    /// Collection-valued relation
    Many(Vec<Arc<Record>>),
}

/// An entity instance. Records are immutable once shared; relations point
/// at other records through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: String,
    fields: IndexMap<String, Datum>,
}

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: IndexMap::new(),
        }
    }

    /// Concrete entity type
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.fields.get(name)
    }

    /// Scalar value of `name`, if the field holds one
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name) {
            Some(Datum::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Datum::Value(value.into()));
        self
    }

    pub fn with_embedded(mut self, name: impl Into<String>, value: Record) -> Self {
        self.fields
            .insert(name.into(), Datum::Embedded(Arc::new(value)));
        self
    }

    pub fn with_one(mut self, name: impl Into<String>, target: Option<Arc<Record>>) -> Self {
        self.fields.insert(name.into(), Datum::One(target));
        self
    }

    pub fn with_many(
        mut self,
        name: impl Into<String>,
        targets: impl IntoIterator<Item = Arc<Record>>,
    ) -> Self {
        self.fields
            .insert(name.into(), Datum::Many(targets.into_iter().collect()));
        self
    }

    /// Read a record of `entity` (or of the subtype named by `$type`) from a
    /// JSON object. Relations and embedded values are given inline.
    pub fn from_json(schema: &SchemaRegistry, entity: &str, json: &JsonValue) -> Result<Self> {
        let JsonValue::Object(object) = json else {
            return Err(SearchError::invalid_schema(
                entity,
                format!("expected a JSON object, got {json}"),
            ));
        };

        let concrete = match object.get(TYPE_KEY) {
            None => entity,
            Some(JsonValue::String(name)) if schema.is_assignable(entity, name) => name.as_str(),
            Some(other) => {
                return Err(SearchError::invalid_schema(
                    entity,
                    format!("{other} is not a subtype"),
                ));
            }
        };
        schema.entity(concrete)?;

        let mut record = Record::new(concrete);
        for (key, raw) in object.iter().filter(|(key, _)| key.as_str() != TYPE_KEY) {
            let (_, field) = schema.find_field(concrete, key).ok_or_else(|| {
                SearchError::invalid_schema(concrete, format!("unknown field '{key}'"))
            })?;
            let datum = match &field.kind {
                FieldKind::Scalar(value_type) => {
                    Datum::Value(convert_native(Value::from_json(raw)?, value_type)?)
                }
                FieldKind::Embedded(type_name) => match raw {
                    JsonValue::Null => continue,
                    raw => Datum::Embedded(Arc::new(Record::from_json(schema, type_name, raw)?)),
                },
                FieldKind::Relation {
                    target,
                    cardinality: Cardinality::One,
                } => match raw {
                    JsonValue::Null => Datum::One(None),
                    raw => Datum::One(Some(Arc::new(Record::from_json(schema, target, raw)?))),
                },
                FieldKind::Relation {
                    target,
                    cardinality: Cardinality::Many,
                } => match raw {
                    JsonValue::Null => Datum::Many(Vec::new()),
                    JsonValue::Array(items) => Datum::Many(
                        items
                            .iter()
                            .map(|item| Record::from_json(schema, target, item).map(Arc::new))
                            .collect::<Result<_>>()?,
                    ),
                    other => {
                        return Err(SearchError::invalid_schema(
                            concrete,
                            format!("relation '{key}' expects an array, got {other}"),
                        ));
                    }
                },
            };
            record.fields.insert(key.clone(), datum);
        }
        Ok(record)
    }

    /// Render as JSON, relations inline
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert(TYPE_KEY.to_string(), JsonValue::String(self.entity.clone()));
        for (name, datum) in &self.fields {
            let json = match datum {
                Datum::Value(value) => value.to_json(),
                Datum::Embedded(record) => record.to_json(),
                Datum::One(target) => target
                    .as_ref()
                    .map_or(JsonValue::Null, |record| record.to_json()),
                Datum::Many(targets) => {
                    JsonValue::Array(targets.iter().map(|record| record.to_json()).collect())
                }
            };
            object.insert(name.clone(), json);
        }
        JsonValue::Object(object)
    }
}
