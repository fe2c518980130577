//! Abstract Syntax Tree (AST) definitions for filter expressions
//!
//! The tree is deliberately small: literals, field references and operator
//! calls. Operator semantics live in the registry.

mod expression;
mod visitor;

pub use expression::*;
pub use visitor::*;
