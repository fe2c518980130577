//! Per-compilation query context

use std::sync::Arc;

use log::trace;
use rustc_hash::FxHashMap;

use super::operand::Operand;
use super::resolver;
use crate::backend::QueryBuilder;
use crate::core::Result;
use crate::model::{EntityMetadata, SchemaRegistry};

/// State owned by exactly one compilation: the root reference, the catalog
/// snapshot for the root type and the join cache.
pub struct QueryContext<'a, B: QueryBuilder> {
    builder: &'a B,
    schema: &'a SchemaRegistry,
    metadata: Arc<EntityMetadata>,
    root: B::Path,
    /// Canonical traversal prefix -> materialized path
    paths: FxHashMap<String, B::Path>,
    joins_created: usize,
}

impl<'a, B: QueryBuilder> QueryContext<'a, B> {
    pub fn new(builder: &'a B, schema: &'a SchemaRegistry, metadata: Arc<EntityMetadata>) -> Self {
        let root = builder.root(metadata.entity());
        Self {
            builder,
            schema,
            metadata,
            root,
            paths: FxHashMap::default(),
            joins_created: 0,
        }
    }

    /// Root entity type
    pub fn entity(&self) -> &str {
        self.metadata.entity()
    }

    pub fn builder(&self) -> &'a B {
        self.builder
    }

    pub fn schema(&self) -> &'a SchemaRegistry {
        self.schema
    }

    /// Catalog entry of the root type
    pub fn metadata(&self) -> &Arc<EntityMetadata> {
        &self.metadata
    }

    pub fn root(&self) -> &B::Path {
        &self.root
    }

    /// Resolve a field path into a field operand, reusing cached joins
    pub fn field(&mut self, path: &str) -> Result<Operand<B>> {
        let descriptor = Arc::clone(self.metadata.field(path)?);
        let traversal = resolver::resolve(&descriptor, self.entity(), self.schema)?;
        let expr = resolver::materialize(&traversal, self)?;
        Ok(Operand::Field { expr, descriptor })
    }

    /// Number of joins materialized so far
    pub fn joins_created(&self) -> usize {
        self.joins_created
    }

    /// Path cached under `key`, created from `from` on first use
    pub(crate) fn cached_path(
        &mut self,
        key: &str,
        from: &B::Path,
        is_join: bool,
        create: impl FnOnce(&B, &B::Path) -> B::Path,
    ) -> B::Path {
        if let Some(path) = self.paths.get(key) {
            return path.clone();
        }
        let path = create(self.builder, from);
        if is_join {
            self.joins_created += 1;
            trace!("join '{}' materialized on '{}'", key, self.entity());
        }
        self.paths.insert(key.to_string(), path.clone());
        path
    }
}
