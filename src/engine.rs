//! Search engine - the main entry point for filter compilation and search

use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use crate::ast::FilterExpression;
use crate::backend::{CompiledQuery, QueryBuilder, QueryExecutor};
use crate::config::EngineConfig;
use crate::core::{Result, SearchError};
use crate::evaluator::{Operand, Page, PageRequest, QueryContext, compile_filter, resolve_orders};
use crate::model::{EntityMetadata, MetadataCatalog, SchemaRegistry};
use crate::parser::{FilterParser, SearchRequest, parse_request};
use crate::registry::{Arity, FnOperator, OperatorKind, OperatorRegistry, SearchOperator};

/// Owns the metadata catalog, the operator registry and the configuration.
/// One engine serves any number of concurrent compilations.
pub struct SearchEngine<B: QueryBuilder> {
    catalog: MetadataCatalog,
    registry: RwLock<Arc<OperatorRegistry<B>>>,
    config: EngineConfig,
}

impl<B: QueryBuilder + 'static> SearchEngine<B> {
    /// Create an engine over a validated schema with default configuration
    pub fn new(schema: SchemaRegistry) -> Result<Self> {
        Self::with_config(schema, EngineConfig::default())
    }

    pub fn with_config(schema: SchemaRegistry, config: EngineConfig) -> Result<Self> {
        schema.validate()?;
        Ok(Self {
            catalog: MetadataCatalog::new(Arc::new(schema), config.max_discovery_depth),
            registry: RwLock::new(Arc::new(OperatorRegistry::with_builtins())),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        self.catalog.schema()
    }

    /// Catalog entry of `entity`, built on first use
    pub fn metadata(&self, entity: &str) -> Result<Arc<EntityMetadata>> {
        self.catalog.discover(entity)
    }

    /// Current registry snapshot
    pub fn operators(&self) -> Arc<OperatorRegistry<B>> {
        Arc::clone(&self.registry.read())
    }

    /// Register an operator, returning the one it shadows. Compilations
    /// already running keep their snapshot.
    pub fn register_operator<O>(
        &self,
        name: impl Into<String>,
        operator: O,
    ) -> Result<Option<Arc<dyn SearchOperator<B>>>>
    where
        O: SearchOperator<B> + 'static,
    {
        let mut registry = self.registry.write();
        Arc::make_mut(&mut registry).register(
            name,
            Arc::new(operator),
            self.config.collision_policy,
        )
    }

    /// Register a closure as an operator
    pub fn register_fn<F>(
        &self,
        name: impl Into<String>,
        kind: OperatorKind,
        arity: Arity,
        func: F,
    ) -> Result<Option<Arc<dyn SearchOperator<B>>>>
    where
        F: Fn(&mut QueryContext<'_, B>, Vec<Operand<B>>) -> Result<Operand<B>>
            + Send
            + Sync
            + 'static,
    {
        self.register_operator(name, FnOperator::new(kind, arity, func))
    }

    /// Parse a filter tree against the current registry
    pub fn parse_filter(&self, json: &JsonValue) -> Result<FilterExpression> {
        let registry = self.operators();
        FilterParser::new(registry.as_ref(), self.config.max_expression_depth).parse(json)
    }

    /// Parse a request envelope against the current registry
    pub fn parse_request(&self, json: &JsonValue) -> Result<SearchRequest> {
        let registry = self.operators();
        let parser = FilterParser::new(registry.as_ref(), self.config.max_expression_depth);
        parse_request(json, &parser)
    }

    /// Parse a request envelope from JSON text
    pub fn parse_request_str(&self, input: &str) -> Result<SearchRequest> {
        let json: JsonValue = serde_json::from_str(input)
            .map_err(|e| SearchError::invalid_request(format!("invalid JSON: {e}")))?;
        self.parse_request(&json)
    }

    /// Compile the filter and sort criteria of `request` for `entity`
    pub fn compile(
        &self,
        builder: &B,
        entity: &str,
        request: &SearchRequest,
    ) -> Result<CompiledQuery<B>> {
        let registry = self.operators();
        let metadata = self.catalog.discover(entity)?;
        let mut ctx = QueryContext::new(builder, self.catalog.schema(), metadata);

        let predicate = match &request.filter {
            Some(filter) => {
                if filter.depth() > self.config.max_expression_depth {
                    return Err(SearchError::malformed(
                        "filter",
                        format!(
                            "nesting exceeds the maximum depth of {}",
                            self.config.max_expression_depth
                        ),
                    ));
                }
                Some(compile_filter(&registry, &mut ctx, filter)?)
            }
            None => None,
        };
        let orders = resolve_orders(&request.sort, &mut ctx)?;

        debug!(
            "compiled search on '{}': {} join(s), {} sort criteria",
            entity,
            ctx.joins_created(),
            orders.len()
        );
        Ok(CompiledQuery {
            entity: entity.to_string(),
            root: ctx.root().clone(),
            predicate,
            orders,
            joins: ctx.joins_created(),
        })
    }

    /// All matches of `request`, sorted; page options are ignored
    pub fn search<E>(&self, executor: &E, entity: &str, request: &SearchRequest) -> Result<Vec<E::Item>>
    where
        E: QueryExecutor<Builder = B>,
    {
        let query = self.compile(executor.builder(), entity, request)?;
        executor.fetch(&query)
    }

    /// One page of matches of `request`
    pub fn search_page<E>(
        &self,
        executor: &E,
        entity: &str,
        request: &SearchRequest,
    ) -> Result<Page<E::Item>>
    where
        E: QueryExecutor<Builder = B>,
    {
        let page = PageRequest::normalize(request.page_size, request.page_offset, &self.config)?;
        let query = self.compile(executor.builder(), entity, request)?;
        let total = executor.count(&query)?;
        let (start, end) = page.bounds(total);
        let content = if start < end {
            executor.fetch_page(&query, start, end - start)?
        } else {
            Vec::new()
        };
        Ok(Page::new(content, page, total))
    }
}
