//! Query-engine capability traits
//!
//! The compiler never talks to storage directly. It drives a [`QueryBuilder`]
//! to assemble paths, expressions and predicates, and hands the resulting
//! [`CompiledQuery`] to a [`QueryExecutor`].

pub mod memory;

use std::fmt;

use crate::core::{Result, Value};

/// Join flavour; the compiler only emits left outer joins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
}

/// Ordering comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Builder of query fragments. Implementations hand out opaque path,
/// expression and predicate values that only they interpret.
pub trait QueryBuilder: Send + Sync {
    /// Reference to an entity instance (root, join, embedded value)
    type Path: Clone + fmt::Debug;
    /// Value-producing expression
    type Expr: Clone + fmt::Debug;
    /// Boolean condition
    type Predicate: Clone + fmt::Debug;

    /// Root reference for the queried entity type
    fn root(&self, entity: &str) -> Self::Path;

    /// Join a relation of `from`
    fn join(&self, from: &Self::Path, relation: &str, join_type: JoinType) -> Self::Path;

    /// Step into an embedded value of `from`
    fn embedded(&self, from: &Self::Path, attribute: &str) -> Self::Path;

    /// Narrow `path` to one of its subtypes
    fn treat(&self, path: &Self::Path, subtype: &str) -> Self::Path;

    /// Attribute value of `from`
    fn get(&self, from: &Self::Path, attribute: &str) -> Self::Expr;

    fn literal(&self, value: Value) -> Self::Expr;

    fn lower(&self, expr: Self::Expr) -> Self::Expr;

    fn upper(&self, expr: Self::Expr) -> Self::Expr;

    fn trim(&self, expr: Self::Expr) -> Self::Expr;

    fn concat(&self, left: Self::Expr, right: Self::Expr) -> Self::Expr;

    fn equal(&self, left: Self::Expr, right: Self::Expr) -> Self::Predicate;

    fn not_equal(&self, left: Self::Expr, right: Self::Expr) -> Self::Predicate;

    fn compare(&self, op: Comparison, left: Self::Expr, right: Self::Expr) -> Self::Predicate;

    /// Inclusive range check
    fn between(&self, expr: Self::Expr, lower: Self::Expr, upper: Self::Expr) -> Self::Predicate;

    /// SQL LIKE with `%` and `_` wildcards
    fn like(&self, expr: Self::Expr, pattern: Self::Expr) -> Self::Predicate;

    fn in_list(&self, expr: Self::Expr, values: Vec<Self::Expr>) -> Self::Predicate;

    fn is_null(&self, expr: Self::Expr) -> Self::Predicate;

    /// Collection emptiness
    fn is_empty(&self, expr: Self::Expr) -> Self::Predicate;

    /// Boolean expression tested for truth
    fn is_true(&self, expr: Self::Expr) -> Self::Predicate;

    fn and(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    fn or(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    fn not(&self, predicate: Self::Predicate) -> Self::Predicate;

    fn constant(&self, value: bool) -> Self::Predicate;
}

/// One resolved sort criterion
pub struct Order<B: QueryBuilder> {
    /// Path as written in the request
    pub path: String,
    pub expr: B::Expr,
    pub direction: SortDirection,
}

impl<B: QueryBuilder> Clone for Order<B> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            expr: self.expr.clone(),
            direction: self.direction,
        }
    }
}

impl<B: QueryBuilder> fmt::Debug for Order<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Order")
            .field("path", &self.path)
            .field("expr", &self.expr)
            .field("direction", &self.direction)
            .finish()
    }
}

/// Output of a compilation, ready to be executed
pub struct CompiledQuery<B: QueryBuilder> {
    pub entity: String,
    pub root: B::Path,
    /// `None` when the request had no filter
    pub predicate: Option<B::Predicate>,
    pub orders: Vec<Order<B>>,
    /// Joins created while compiling
    pub joins: usize,
}

impl<B: QueryBuilder> Clone for CompiledQuery<B> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            root: self.root.clone(),
            predicate: self.predicate.clone(),
            orders: self.orders.clone(),
            joins: self.joins,
        }
    }
}

impl<B: QueryBuilder> fmt::Debug for CompiledQuery<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("entity", &self.entity)
            .field("root", &self.root)
            .field("predicate", &self.predicate)
            .field("orders", &self.orders)
            .field("joins", &self.joins)
            .finish()
    }
}

/// Executes compiled queries
pub trait QueryExecutor {
    type Builder: QueryBuilder;
    type Item;

    fn builder(&self) -> &Self::Builder;

    /// All matches in order
    fn fetch(&self, query: &CompiledQuery<Self::Builder>) -> Result<Vec<Self::Item>>;

    /// Number of matches
    fn count(&self, query: &CompiledQuery<Self::Builder>) -> Result<usize>;

    /// `limit` matches starting at `offset`, in order
    fn fetch_page(
        &self,
        query: &CompiledQuery<Self::Builder>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Self::Item>>;
}
