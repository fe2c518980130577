//! Declarative entity schemas
//!
//! Entities are registered explicitly, either through the builder methods on
//! [`EntitySchema`] and [`FieldSchema`] or from a JSON description:
//!
//! ```json
//! [
//!   {"name": "Base", "fields": [{"name": "name", "type": "string", "searchable": {}}]},
//!   {"name": "Order", "extends": "Base", "fields": [
//!     {"name": "status", "type": {"enum": {"name": "Status", "members": ["OPEN"]}}, "searchable": {}},
//!     {"name": "lines", "relation": "Line", "cardinality": "many", "nested": true},
//!     {"name": "address", "embedded": "Address", "nested": true}
//!   ]}
//! ]
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::descriptor::FieldPattern;
use super::types::{Cardinality, Searchable, ValueType};
use crate::core::{Result, SearchError};

/// What a field holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain value stored on the entity
    Scalar(ValueType),
    /// Value object stored inline with the entity
    Embedded(String),
    /// Reference to another entity
    Relation {
        target: String,
        cardinality: Cardinality,
    },
}

impl FieldKind {
    /// Scalar value type, if any
    pub fn value_type(&self) -> Option<&ValueType> {
        match self {
            FieldKind::Scalar(value_type) => Some(value_type),
            _ => None,
        }
    }

    /// Entity or embedded type this field leads to, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            FieldKind::Scalar(_) => None,
            FieldKind::Embedded(target) | FieldKind::Relation { target, .. } => Some(target),
        }
    }

    /// Whether the field holds more than one value
    pub fn is_collection(&self) -> bool {
        match self {
            FieldKind::Scalar(value_type) => value_type.is_list(),
            FieldKind::Embedded(_) => false,
            FieldKind::Relation { cardinality, .. } => *cardinality == Cardinality::Many,
        }
    }
}

/// Declaration of a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FieldSchemaDef", into = "FieldSchemaDef")]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    /// Search directives; `None` means the field is not searchable
    pub searchable: Option<Searchable>,
    /// Discovery descends into the relation or embedded type
    pub nested: bool,
}

impl FieldSchema {
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, FieldKind::Scalar(value_type))
    }

    pub fn embedded(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Embedded(type_name.into()))
    }

    pub fn relation(
        name: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Relation {
                target: target.into(),
                cardinality,
            },
        )
    }

    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            searchable: None,
            nested: false,
        }
    }

    /// Mark searchable with default directives
    pub fn searchable(self) -> Self {
        self.with_directives(Searchable::default())
    }

    /// Mark searchable with explicit directives
    pub fn with_directives(mut self, directives: Searchable) -> Self {
        self.searchable = Some(directives);
        self
    }

    /// Mark nested-searchable
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }
}

/// Flat wire form of [`FieldSchema`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldSchemaDef {
    name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cardinality: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    searchable: Option<Searchable>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    nested: bool,
}

impl TryFrom<FieldSchemaDef> for FieldSchema {
    type Error = String;

    fn try_from(def: FieldSchemaDef) -> std::result::Result<Self, Self::Error> {
        let kind = match (def.value_type, def.embedded, def.relation) {
            (Some(value_type), None, None) => FieldKind::Scalar(value_type),
            (None, Some(embedded), None) => FieldKind::Embedded(embedded),
            (None, None, Some(target)) => FieldKind::Relation {
                target,
                cardinality: def.cardinality.unwrap_or(Cardinality::One),
            },
            _ => {
                return Err(format!(
                    "field '{}' needs exactly one of `type`, `embedded` or `relation`",
                    def.name
                ));
            }
        };
        Ok(Self {
            name: def.name,
            kind,
            searchable: def.searchable,
            nested: def.nested,
        })
    }
}

impl From<FieldSchema> for FieldSchemaDef {
    fn from(field: FieldSchema) -> Self {
        let mut def = FieldSchemaDef {
            name: field.name,
            searchable: field.searchable,
            nested: field.nested,
            ..Default::default()
        };
        match field.kind {
            FieldKind::Scalar(value_type) => def.value_type = Some(value_type),
            FieldKind::Embedded(embedded) => def.embedded = Some(embedded),
            FieldKind::Relation {
                target,
                cardinality,
            } => {
                def.relation = Some(target);
                def.cardinality = Some(cardinality);
            }
        }
        def
    }
}

/// Declaration of an entity or embeddable type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    /// Base type whose fields are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            fields: Vec::new(),
        }
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends = Some(base.into());
        self
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Field declared directly on this type
    pub fn own_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Registry of all declared entity types
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: IndexMap<String, Arc<EntitySchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of entity schemas, register and validate them
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schemas: Vec<EntitySchema> = serde_json::from_str(json)
            .map_err(|e| SearchError::invalid_schema("<json>", e.to_string()))?;
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Register a type; names are unique
    pub fn register(&mut self, schema: EntitySchema) -> Result<()> {
        if self.entities.contains_key(&schema.name) {
            return Err(SearchError::invalid_schema(
                &schema.name,
                "entity is already registered",
            ));
        }
        self.entities.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    /// Builder-style registration for fixtures and examples
    pub fn with(mut self, schema: EntitySchema) -> Result<Self> {
        self.register(schema)?;
        Ok(self)
    }

    /// Check that every referenced type is registered, field names are unique
    /// per type, constraint patterns compile and inheritance is acyclic
    pub fn validate(&self) -> Result<()> {
        for schema in self.entities.values() {
            if let Some(base) = &schema.extends {
                if !self.entities.contains_key(base) {
                    return Err(SearchError::invalid_schema(
                        &schema.name,
                        format!("base type '{base}' is not registered"),
                    ));
                }
            }

            let mut seen = FxHashSet::default();
            for field in &schema.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SearchError::invalid_schema(
                        &schema.name,
                        format!("field '{}' is declared twice", field.name),
                    ));
                }
                if let Some(pattern) = field
                    .searchable
                    .as_ref()
                    .and_then(|s| s.regex_pattern.as_deref())
                {
                    FieldPattern::compile(pattern).map_err(|e| {
                        SearchError::invalid_schema(
                            &schema.name,
                            format!("field '{}' has an invalid pattern: {e}", field.name),
                        )
                    })?;
                }
                if let Some(target) = field.kind.target() {
                    if !self.entities.contains_key(target) {
                        return Err(SearchError::invalid_schema(
                            &schema.name,
                            format!("field '{}' references unknown type '{target}'", field.name),
                        ));
                    }
                }
            }

            let mut chain = FxHashSet::default();
            let mut current = Some(schema.name.as_str());
            while let Some(name) = current {
                if !chain.insert(name) {
                    return Err(SearchError::invalid_schema(
                        &schema.name,
                        "inheritance chain is cyclic",
                    ));
                }
                current = self.get(name).and_then(|s| s.extends.as_deref());
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<EntitySchema>> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Look up a registered type or fail with `UnknownEntity`
    pub fn entity(&self, name: &str) -> Result<&Arc<EntitySchema>> {
        self.get(name).ok_or_else(|| SearchError::UnknownEntity {
            entity: name.to_string(),
        })
    }

    /// Registered type names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Base types of `name`, nearest first
    pub fn ancestors(&self, name: &str) -> Vec<&str> {
        let mut result: Vec<&str> = Vec::new();
        let mut current = self.get(name).and_then(|s| s.extends.as_deref());
        while let Some(base) = current {
            if base == name || result.contains(&base) {
                break;
            }
            result.push(base);
            current = self.get(base).and_then(|s| s.extends.as_deref());
        }
        result
    }

    /// Whether a value of type `sub` can be used where `base` is expected
    pub fn is_assignable(&self, base: &str, sub: &str) -> bool {
        base == sub || self.ancestors(sub).contains(&base)
    }

    /// Transitive subtypes of `name` in registration order
    pub fn subtypes(&self, name: &str) -> Vec<&str> {
        self.entities
            .keys()
            .map(String::as_str)
            .filter(|candidate| *candidate != name && self.is_assignable(name, candidate))
            .collect()
    }

    /// Find a field on `entity` or one of its base types, returning the
    /// declaring type alongside the declaration
    pub fn find_field<'a>(&'a self, entity: &'a str, field: &str) -> Option<(&'a str, &'a FieldSchema)> {
        std::iter::once(entity)
            .chain(self.ancestors(entity))
            .find_map(|owner| {
                self.get(owner)
                    .and_then(|schema| schema.own_field(field))
                    .map(|f| (owner, f))
            })
    }

    /// Fields visible from `entity` for search purposes: inherited fields
    /// (root-most base first), own fields, then fields declared on subtypes.
    /// The first declaration of a name wins.
    pub fn visible_fields<'a>(&'a self, entity: &'a str) -> Vec<(&'a str, &'a FieldSchema)> {
        let mut owners: Vec<&str> = self.ancestors(entity);
        owners.reverse();
        owners.push(entity);
        owners.extend(self.subtypes(entity));

        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for owner in owners {
            if let Some(schema) = self.get(owner) {
                for field in &schema.fields {
                    if seen.insert(field.name.as_str()) {
                        result.push((owner, field));
                    }
                }
            }
        }
        result
    }
}
