//! Filter compilation
//!
//! Turns a parsed filter into a backend predicate: field paths are resolved
//! into join traversals, literals are coerced against field descriptors and
//! operators are applied bottom-up.

mod builder;
pub mod coercion;
mod context;
mod operand;
pub mod resolver;
mod sort;

pub use builder::{PredicateBuilder, compile_filter};
pub use coercion::coerce;
pub use context::QueryContext;
pub use operand::Operand;
pub use resolver::{Step, Traversal};
pub use sort::{Page, PageRequest, SortCriterion, resolve_orders};
