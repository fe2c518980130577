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

//! Visitor pattern for filter AST traversal

use super::expression::{CallNode, FilterExpression};
use crate::core::Value;

/// Trait for visiting filter nodes
pub trait Visitor: Sized {
    /// The result type of visiting a node
    type Result;

    /// Visit an expression node
    fn visit_expression(&mut self, expr: &FilterExpression) -> Self::Result {
        walk_expression(self, expr)
    }

    /// Visit a literal
    fn visit_literal(&mut self, literal: &Value) -> Self::Result;

    /// Visit a field reference
    fn visit_field_ref(&mut self, path: &str) -> Self::Result;

    /// Visit an operator call
    fn visit_call(&mut self, call: &CallNode) -> Self::Result;
}

/// Default implementation of walking a filter tree
pub fn walk_expression<V: Visitor>(visitor: &mut V, expr: &FilterExpression) -> V::Result {
    match expr {
        FilterExpression::Literal(value) => visitor.visit_literal(value),
        FilterExpression::FieldRef(path) => visitor.visit_field_ref(path),
        FilterExpression::Call(call) => visitor.visit_call(call),
    }
}

/// Collects every field path referenced by a filter, in source order
#[derive(Debug, Default)]
pub struct FieldCollector {
    pub paths: Vec<String>,
}

impl FieldCollector {
    pub fn collect(expr: &FilterExpression) -> Vec<String> {
        let mut collector = Self::default();
        collector.visit_expression(expr);
        collector.paths
    }
}

impl Visitor for FieldCollector {
    type Result = ();

    fn visit_literal(&mut self, _literal: &Value) {}

    fn visit_field_ref(&mut self, path: &str) {
        self.paths.push(path.to_string());
    }

    fn visit_call(&mut self, call: &CallNode) {
        for arg in &call.args {
            self.visit_expression(arg);
        }
    }
}
