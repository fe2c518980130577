//! In-memory reference backend
//!
//! Implements [`QueryBuilder`] with plain query trees and [`QueryExecutor`]
//! over records held in memory. Collections are searched with semi-join
//! semantics: a record is returned once if any element of a joined
//! collection satisfies the filter.

mod eval;
mod query;
mod store;

pub use query::{MemoryBuilder, MemoryExpr, MemoryPath, MemoryPredicate};
pub use store::{Datum, Record, TYPE_KEY};

use std::cmp::Ordering;
use std::sync::Arc;

use log::trace;
use serde_json::Value as JsonValue;

use self::eval::{Binding, Evaluator};
use crate::backend::{CompiledQuery, QueryExecutor, SortDirection};
use crate::core::{Result, SearchError, Value};
use crate::model::SchemaRegistry;

/// Records of every entity type plus the schema describing them
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    schema: Arc<SchemaRegistry>,
    records: Vec<Arc<Record>>,
    builder: MemoryBuilder,
}

impl MemoryBackend {
    pub fn new(schema: impl Into<Arc<SchemaRegistry>>) -> Self {
        Self {
            schema: schema.into(),
            records: Vec::new(),
            builder: MemoryBuilder,
        }
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        &self.schema
    }

    /// Add a record, returning the shared handle for use in relations
    pub fn insert(&mut self, record: impl Into<Arc<Record>>) -> Result<Arc<Record>> {
        let record = record.into();
        self.schema.entity(record.entity())?;
        self.records.push(Arc::clone(&record));
        Ok(record)
    }

    /// Load one record or an array of records of `entity` from JSON
    pub fn load_json(&mut self, entity: &str, json: &JsonValue) -> Result<usize> {
        let items = match json {
            JsonValue::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        for item in items {
            let record = Record::from_json(&self.schema, entity, item)?;
            self.insert(record)?;
        }
        Ok(items.len())
    }

    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every match of `query` in order
    fn run(&self, query: &CompiledQuery<MemoryBuilder>) -> Result<Vec<Arc<Record>>> {
        let evaluator = Evaluator::new(&self.schema);

        let mut joins = Vec::new();
        if let Some(predicate) = &query.predicate {
            predicate.collect_joins(&mut joins);
        }
        for order in &query.orders {
            order.expr.collect_joins(&mut joins);
        }
        let mut unique: Vec<&MemoryPath> = Vec::with_capacity(joins.len());
        for join in joins {
            if !unique.contains(&join) {
                unique.push(join);
            }
        }

        let mut matches: Vec<(Arc<Record>, Vec<Value>)> = Vec::new();
        for record in self
            .records
            .iter()
            .filter(|r| self.schema.is_assignable(&query.entity, r.entity()))
        {
            let Some(binding) = self.first_match(&evaluator, query, record, &unique)? else {
                continue;
            };
            let keys = query
                .orders
                .iter()
                .map(|order| evaluator.value(&order.expr, record, &binding))
                .collect::<Result<Vec<_>>>()?;
            matches.push((Arc::clone(record), keys));
        }

        matches.sort_by(|(_, a), (_, b)| {
            query
                .orders
                .iter()
                .zip(a.iter().zip(b))
                .map(|(order, (x, y))| match order.direction {
                    SortDirection::Ascending => x.sort_cmp(y),
                    SortDirection::Descending => y.sort_cmp(x),
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        trace!(
            "'{}' matched {} record(s) over {} join(s)",
            query.entity,
            matches.len(),
            unique.len()
        );
        Ok(matches.into_iter().map(|(record, _)| record).collect())
    }

    /// First binding under which `record` satisfies the query
    fn first_match(
        &self,
        evaluator: &Evaluator<'_>,
        query: &CompiledQuery<MemoryBuilder>,
        record: &Arc<Record>,
        joins: &[&MemoryPath],
    ) -> Result<Option<Binding>> {
        for binding in evaluator.bindings(record, joins) {
            let accepted = match &query.predicate {
                None => true,
                Some(predicate) => evaluator.test(predicate, record, &binding)? == Some(true),
            };
            if accepted {
                return Ok(Some(binding));
            }
        }
        Ok(None)
    }
}

impl QueryExecutor for MemoryBackend {
    type Builder = MemoryBuilder;
    type Item = Arc<Record>;

    fn builder(&self) -> &MemoryBuilder {
        &self.builder
    }

    fn fetch(&self, query: &CompiledQuery<MemoryBuilder>) -> Result<Vec<Arc<Record>>> {
        self.run(query)
    }

    fn count(&self, query: &CompiledQuery<MemoryBuilder>) -> Result<usize> {
        self.run(query).map(|records| records.len())
    }

    fn fetch_page(
        &self,
        query: &CompiledQuery<MemoryBuilder>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Arc<Record>>> {
        if limit == 0 {
            return Err(SearchError::execution("page limit must be at least 1"));
        }
        Ok(self
            .run(query)?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }
}
