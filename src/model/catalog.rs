//! Search metadata catalog
//!
//! For each entity type the catalog maps every searchable path to its
//! [`FieldDescriptor`]. Entries are built once on first use and shared as
//! immutable `Arc`s afterwards.

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::descriptor::{FieldDescriptor, PathSegment, SegmentKind, Segments, split_path};
use super::schema::{FieldKind, SchemaRegistry};
use super::types::ValueType;
use crate::core::{Result, SearchError};

/// Catalog entry for one entity type
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    entity: String,
    /// Canonical path to descriptor
    fields: IndexMap<String, Arc<FieldDescriptor>>,
    /// Segment names joined with `.` to the descriptors carrying them
    by_names: FxHashMap<String, SmallVec<[Arc<FieldDescriptor>; 1]>>,
}

impl EntityMetadata {
    fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            fields: IndexMap::new(),
            by_names: FxHashMap::default(),
        }
    }

    /// Register a descriptor under its canonical path. Earlier paths win.
    fn insert(&mut self, descriptor: Arc<FieldDescriptor>) {
        if self.fields.contains_key(&descriptor.path) {
            return;
        }
        self.by_names
            .entry(names_key(descriptor.segments.iter().map(|s| s.name.as_str())))
            .or_default()
            .push(Arc::clone(&descriptor));
        self.fields.insert(descriptor.path.clone(), descriptor);
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Descriptor for a canonical path or for a spelling that writes
    /// single-valued relations with `.` (`parent.name` for `>parent.name`)
    pub fn get(&self, path: &str) -> Option<&Arc<FieldDescriptor>> {
        if let Some(descriptor) = self.fields.get(path) {
            return Some(descriptor);
        }
        let parts = split_path(path)?;
        self.by_names
            .get(&names_key(parts.iter().map(|&(_, name)| name)))?
            .iter()
            .find(|descriptor| descriptor.accepts_spelling(path))
    }

    /// Look up a path or fail with `UnknownField`
    pub fn field(&self, path: &str) -> Result<&Arc<FieldDescriptor>> {
        self.get(path)
            .ok_or_else(|| SearchError::unknown_field(&self.entity, path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Canonical paths in discovery order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Descriptors in discovery order
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<FieldDescriptor>> {
        self.fields.values()
    }

    /// Number of canonical paths
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Enumeration type reachable from this entity whose name equals
    /// `name` or ends with `.name`
    pub fn find_enum(&self, name: &str) -> Option<&ValueType> {
        let suffix = format!(".{name}");
        self.descriptors()
            .filter_map(|d| match d.value_type() {
                Some(ValueType::List(inner)) => Some(inner.as_ref()),
                other => other,
            })
            .find(|t| {
                t.enum_name()
                    .is_some_and(|n| n == name || n.ends_with(&suffix))
            })
    }
}

/// Concurrent, compute-once catalog of entity metadata
#[derive(Debug)]
pub struct MetadataCatalog {
    schema: Arc<SchemaRegistry>,
    entries: DashMap<String, Arc<EntityMetadata>>,
    max_depth: usize,
}

impl MetadataCatalog {
    pub fn new(schema: Arc<SchemaRegistry>, max_depth: usize) -> Self {
        Self {
            schema,
            entries: DashMap::new(),
            max_depth,
        }
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        &self.schema
    }

    /// Metadata for `entity`, discovered on first request
    pub fn discover(&self, entity: &str) -> Result<Arc<EntityMetadata>> {
        if let Some(entry) = self.entries.get(entity) {
            return Ok(Arc::clone(entry.value()));
        }
        let entry = self
            .entries
            .entry(entity.to_string())
            .or_try_insert_with(|| self.build(entity).map(Arc::new))?;
        Ok(Arc::clone(entry.value()))
    }

    /// Number of cached entries
    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    fn build(&self, entity: &str) -> Result<EntityMetadata> {
        self.schema.entity(entity)?;

        let mut metadata = EntityMetadata::new(entity);
        let mut prefix = Segments::new();
        self.walk(entity, &mut prefix, 0, &mut metadata);

        debug!(
            "catalog entry for '{}' built with {} paths",
            entity,
            metadata.len()
        );
        Ok(metadata)
    }

    fn walk(
        &self,
        type_name: &str,
        prefix: &mut Segments,
        depth: usize,
        out: &mut EntityMetadata,
    ) {
        for (owner, field) in self.schema.visible_fields(type_name) {
            if let Some(directives) = &field.searchable {
                let mut segments = prefix.clone();
                segments.push(PathSegment {
                    name: field.name.clone(),
                    declaring_type: owner.to_string(),
                    kind: SegmentKind::Attribute,
                });
                let descriptor = Arc::new(FieldDescriptor::new(
                    segments,
                    field.kind.clone(),
                    directives.clone(),
                ));
                out.insert(descriptor);
            }

            if !field.nested {
                continue;
            }
            let (kind, target) = match &field.kind {
                FieldKind::Scalar(_) => continue,
                FieldKind::Embedded(type_name) => (
                    SegmentKind::Embedded {
                        type_name: type_name.clone(),
                    },
                    type_name,
                ),
                FieldKind::Relation {
                    target,
                    cardinality,
                } => (
                    SegmentKind::Relation {
                        target: target.clone(),
                        cardinality: *cardinality,
                    },
                    target,
                ),
            };
            if depth + 1 > self.max_depth {
                debug!(
                    "discovery truncated at '{}' below '{}': depth limit {} reached",
                    field.name, type_name, self.max_depth
                );
                continue;
            }

            prefix.push(PathSegment {
                name: field.name.clone(),
                declaring_type: owner.to_string(),
                kind,
            });
            self.walk(target, prefix, depth + 1, out);
            prefix.pop();
        }
    }
}

fn names_key<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let mut key = String::new();
    for name in names {
        if !key.is_empty() {
            key.push('.');
        }
        key.push_str(name);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::{EntitySchema, FieldSchema};
    use crate::model::types::Cardinality;

    fn schema() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                EntitySchema::new("Order")
                    .field(FieldSchema::scalar("code", ValueType::String).searchable())
                    .field(FieldSchema::scalar("internal", ValueType::String))
                    .field(FieldSchema::relation("customer", "Customer", Cardinality::One).nested())
                    .field(FieldSchema::relation("lines", "Line", Cardinality::Many).nested().searchable())
                    .field(FieldSchema::embedded("shipping", "Address").nested()),
            )
            .unwrap();
        registry
            .register(
                EntitySchema::new("Customer")
                    .field(FieldSchema::scalar("name", ValueType::String).searchable())
                    .field(FieldSchema::relation("orders", "Order", Cardinality::Many).nested()),
            )
            .unwrap();
        registry
            .register(EntitySchema::new("Line").field(
                FieldSchema::scalar("status", ValueType::enumeration("com.shop.LineStatus", ["OPEN"]))
                    .searchable(),
            ))
            .unwrap();
        registry
            .register(
                EntitySchema::new("Address")
                    .field(FieldSchema::scalar("city", ValueType::String).searchable()),
            )
            .unwrap();
        registry.validate().unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_paths_and_aliases() {
        let catalog = MetadataCatalog::new(schema(), 4);
        let meta = catalog.discover("Order").unwrap();

        assert!(meta.contains("code"));
        assert!(!meta.contains("internal"));
        assert!(meta.contains(">customer.name"));
        assert!(meta.contains("customer.name"));
        assert!(meta.contains(">lines.status"));
        assert!(!meta.contains("lines.status"));
        assert!(meta.contains("lines"));
        assert!(meta.contains("shipping.city"));
        assert!(Arc::ptr_eq(
            meta.get(">customer.name").unwrap(),
            meta.get("customer.name").unwrap()
        ));
    }

    #[test]
    fn test_depth_limit_truncates_cycles() {
        let catalog = MetadataCatalog::new(schema(), 2);
        let meta = catalog.discover("Order").unwrap();
        assert!(meta.contains(">customer>orders.code"));
        assert!(!meta.contains(">customer>orders>customer.name"));
    }

    #[test]
    fn test_dotted_spellings_resolve_without_extra_entries() {
        let catalog = MetadataCatalog::new(schema(), 4);
        let meta = catalog.discover("Order").unwrap();

        assert!(meta.paths().all(|path| !path.starts_with("customer")));
        assert!(meta.contains(">customer>orders>customer.name"));
        assert!(meta.contains("customer>orders.customer.name"));
        assert!(meta.contains(">customer>orders.customer.name"));
        assert!(!meta.contains("customer.orders.code"));
        assert!(!meta.contains(">code"));
        assert!(!meta.contains("code."));
    }

    #[test]
    fn test_self_reference_grows_linearly() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                EntitySchema::new("Node")
                    .field(FieldSchema::scalar("name", ValueType::String).searchable())
                    .field(FieldSchema::relation("parent", "Node", Cardinality::One).nested()),
            )
            .unwrap();
        let catalog = MetadataCatalog::new(Arc::new(registry), 64);
        let meta = catalog.discover("Node").unwrap();

        assert_eq!(meta.len(), 65);
        let dotted = format!("{}name", "parent.".repeat(64));
        let canonical = format!("{}.name", ">parent".repeat(64));
        assert_eq!(meta.field(&dotted).unwrap().path, canonical);
        assert!(!meta.contains(&format!("{}name", "parent.".repeat(65))));
    }

    #[test]
    fn test_entries_are_cached() {
        let catalog = MetadataCatalog::new(schema(), 4);
        let first = catalog.discover("Order").unwrap();
        let second = catalog.discover("Order").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.cached_len(), 1);
    }

    #[test]
    fn test_unknown_entity() {
        let catalog = MetadataCatalog::new(schema(), 4);
        assert!(matches!(
            catalog.discover("Invoice"),
            Err(SearchError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_find_enum_by_suffix() {
        let catalog = MetadataCatalog::new(schema(), 4);
        let meta = catalog.discover("Order").unwrap();
        assert!(meta.find_enum("LineStatus").is_some());
        assert!(meta.find_enum("Status").is_none());
    }
}
