// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generic filter-expression compiler for entity search
//!
//! Filters arrive as nested JSON arrays (`["and", ["eq", ["field", "name"],
//! "x"], ...]`), are parsed into a [`FilterExpression`] tree and compiled
//! against a declared entity schema into backend predicates. Field paths may
//! cross relations (`>children.name`) and embedded values, literals are
//! coerced to the field's type, and the operator set is extensible.
//!
//! ```rust
//! use entity_search::backend::memory::{MemoryBackend, MemoryBuilder, Record};
//! use entity_search::model::{EntitySchema, FieldSchema, SchemaRegistry, ValueType};
//! use entity_search::SearchEngine;
//!
//! let schema = SchemaRegistry::new()
//!     .with(EntitySchema::new("Book")
//!         .field(FieldSchema::scalar("title", ValueType::String).searchable()))
//!     .unwrap();
//! let engine = SearchEngine::<MemoryBuilder>::new(schema.clone()).unwrap();
//! let mut backend = MemoryBackend::new(schema);
//! backend.insert(Record::new("Book").with("title", "Dune")).unwrap();
//! backend.insert(Record::new("Book").with("title", "Emma")).unwrap();
//!
//! let request = engine
//!     .parse_request_str(r#"{"filter": ["startsWith", ["field", "title"], "D"]}"#)
//!     .unwrap();
//! let found = engine.search(&backend, "Book", &request).unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod ast;
pub mod backend;
pub mod config;
pub mod core;
pub mod engine;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;

pub use ast::FilterExpression;
pub use config::{EngineConfig, OperatorCollisionPolicy};
pub use core::{Result, SearchError, Value};
pub use engine::SearchEngine;
pub use evaluator::{Operand, Page, QueryContext, SortCriterion};
pub use parser::SearchRequest;
pub use registry::{Arity, OperatorKind, OperatorRegistry, SearchOperator};
