//! Operator registry for entity search
//!
//! Operators are trait objects keyed by name. The registry ships with every
//! built-in and accepts user-defined operators at runtime.

pub mod operator;
pub mod operators;

pub use operator::{Arity, FnOperator, OperatorKind, OperatorRegistry, SearchOperator};

use crate::backend::QueryBuilder;
use crate::parser::OperatorLookup;

impl<B: QueryBuilder> OperatorLookup for OperatorRegistry<B> {
    fn contains(&self, name: &str) -> bool {
        OperatorRegistry::contains(self, name)
    }
}
