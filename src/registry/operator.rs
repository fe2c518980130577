//! Operator trait and registry

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use log::warn;
use rustc_hash::FxHashMap;

use crate::backend::QueryBuilder;
use crate::config::OperatorCollisionPolicy;
use crate::core::{Result, SearchError};
use crate::evaluator::{Operand, QueryContext};

/// Operator classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Combines predicates (and, or, not)
    Combinator,
    /// Produces a predicate from values and fields (eq, in, isNull, ...)
    Terminal,
    /// Produces a value or expression (lower, date, enum, ...)
    ValueTransform,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorKind::Combinator => write!(f, "combinator"),
            OperatorKind::Terminal => write!(f, "terminal"),
            OperatorKind::ValueTransform => write!(f, "value-transform"),
        }
    }
}

/// Accepted argument count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    /// Fail with `MalformedExpression` when `count` is not accepted
    pub fn check(&self, operator: &str, count: usize) -> Result<()> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(SearchError::malformed(
                operator,
                format!("expected {self} argument(s), got {count}"),
            ))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..={max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Trait for implementing search operators
///
/// Operators receive their arguments already evaluated: literals as
/// [`Operand::Value`], field references as [`Operand::Field`] with their
/// descriptor, and nested calls as whatever those calls returned.
pub trait SearchOperator<B: QueryBuilder>: Send + Sync {
    fn kind(&self) -> OperatorKind;

    fn arity(&self) -> Arity;

    /// Evaluate the operator. `name` is the registry name it was invoked by.
    fn evaluate(
        &self,
        name: &str,
        args: Vec<Operand<B>>,
        ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>>;
}

/// Operator backed by a closure
pub struct FnOperator<B, F> {
    kind: OperatorKind,
    arity: Arity,
    func: F,
    _builder: PhantomData<fn() -> B>,
}

impl<B, F> FnOperator<B, F>
where
    B: QueryBuilder,
    F: Fn(&mut QueryContext<'_, B>, Vec<Operand<B>>) -> Result<Operand<B>> + Send + Sync,
{
    pub fn new(kind: OperatorKind, arity: Arity, func: F) -> Self {
        Self {
            kind,
            arity,
            func,
            _builder: PhantomData,
        }
    }
}

impl<B, F> SearchOperator<B> for FnOperator<B, F>
where
    B: QueryBuilder,
    F: Fn(&mut QueryContext<'_, B>, Vec<Operand<B>>) -> Result<Operand<B>> + Send + Sync,
{
    fn kind(&self) -> OperatorKind {
        self.kind
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn evaluate(
        &self,
        _name: &str,
        args: Vec<Operand<B>>,
        ctx: &mut QueryContext<'_, B>,
    ) -> Result<Operand<B>> {
        (self.func)(ctx, args)
    }
}

/// Registry of search operators by name
pub struct OperatorRegistry<B: QueryBuilder> {
    operators: FxHashMap<String, Arc<dyn SearchOperator<B>>>,
}

impl<B: QueryBuilder> Clone for OperatorRegistry<B> {
    fn clone(&self) -> Self {
        Self {
            operators: self.operators.clone(),
        }
    }
}

impl<B: QueryBuilder + 'static> Default for OperatorRegistry<B> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<B: QueryBuilder> fmt::Debug for OperatorRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("operators", &self.names())
            .finish()
    }
}

impl<B: QueryBuilder> OperatorRegistry<B> {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            operators: FxHashMap::default(),
        }
    }

    /// Create a registry with every built-in operator
    pub fn with_builtins() -> Self
    where
        B: 'static,
    {
        let mut registry = Self::empty();
        super::operators::register_builtin_operators(&mut registry);
        registry
    }

    /// Register an operator under `name`, returning the operator it shadows.
    /// With [`OperatorCollisionPolicy::Reject`] an existing name is an error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        operator: Arc<dyn SearchOperator<B>>,
        policy: OperatorCollisionPolicy,
    ) -> Result<Option<Arc<dyn SearchOperator<B>>>> {
        let name = name.into();
        if self.operators.contains_key(&name) {
            match policy {
                OperatorCollisionPolicy::Reject => {
                    return Err(SearchError::OperatorConflict { name });
                }
                OperatorCollisionPolicy::Override => {
                    warn!("operator '{name}' overrides a previously registered operator");
                }
            }
        }
        Ok(self.operators.insert(name, operator))
    }

    /// Register a built-in; built-in names are distinct
    pub(crate) fn insert<O: SearchOperator<B> + 'static>(&mut self, name: &str, operator: O) {
        self.operators.insert(name.to_string(), Arc::new(operator));
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn SearchOperator<B>>> {
        self.operators.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
