//! Entity schemas and search metadata
//!
//! Entities are declared in a [`SchemaRegistry`]; the [`MetadataCatalog`]
//! derives the searchable paths of each entity from it.

pub mod catalog;
pub mod descriptor;
pub mod schema;
pub mod types;

pub use catalog::{EntityMetadata, MetadataCatalog};
pub use descriptor::{FieldDescriptor, FieldPattern, PathSegment, SegmentKind, Segments};
pub use schema::{EntitySchema, FieldKind, FieldSchema, SchemaRegistry};
pub use types::{Cardinality, SearchType, Searchable, ValueType};
