//! Field path resolution
//!
//! A descriptor's segments are turned into a [`Traversal`]: joins for
//! relations, embedded steps for value objects, and a narrowing step wherever
//! a segment is declared on a subtype of the type being traversed.

use std::fmt;

use smallvec::SmallVec;

use super::context::QueryContext;
use crate::backend::{JoinType, QueryBuilder};
use crate::core::{Result, SearchError};
use crate::model::{FieldDescriptor, SchemaRegistry, SegmentKind};

/// One traversal step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Treat the current path as the named subtype
    Narrow(String),
    /// Left outer join of a relation
    Join(String),
    /// Step into an embedded value
    Embedded(String),
    /// Terminal attribute
    Attribute(String),
}

/// Ordered steps from the root to a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    pub steps: SmallVec<[Step; 6]>,
}

impl Traversal {
    /// Number of joins in the traversal
    pub fn join_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Join(_)))
            .count()
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                Step::Narrow(t) => write!(f, "<{t}>")?,
                Step::Join(n) => write!(f, ">{n}")?,
                Step::Embedded(n) | Step::Attribute(n) => write!(f, ".{n}")?,
            }
        }
        Ok(())
    }
}

/// Compute the traversal for `descriptor` starting at `root_entity`
pub fn resolve(
    descriptor: &FieldDescriptor,
    root_entity: &str,
    schema: &SchemaRegistry,
) -> Result<Traversal> {
    let mut steps = SmallVec::new();
    let mut current = root_entity.to_string();

    for segment in &descriptor.segments {
        let declaring = segment.declaring_type.as_str();
        if !schema.is_assignable(declaring, &current) {
            if schema.is_assignable(&current, declaring) {
                steps.push(Step::Narrow(declaring.to_string()));
                current = declaring.to_string();
            } else {
                return Err(SearchError::UnresolvableJoin {
                    path: descriptor.path.clone(),
                    segment: segment.name.clone(),
                    declaring_type: declaring.to_string(),
                    current_type: current,
                });
            }
        }

        match &segment.kind {
            SegmentKind::Relation { target, .. } => {
                steps.push(Step::Join(segment.name.clone()));
                current = target.clone();
            }
            SegmentKind::Embedded { type_name } => {
                steps.push(Step::Embedded(segment.name.clone()));
                current = type_name.clone();
            }
            SegmentKind::Attribute => steps.push(Step::Attribute(segment.name.clone())),
        }
    }

    Ok(Traversal { steps })
}

/// Build the expression for a traversal, reusing the paths already
/// materialized in `ctx` for identical prefixes
pub fn materialize<B: QueryBuilder>(
    traversal: &Traversal,
    ctx: &mut QueryContext<'_, B>,
) -> Result<B::Expr> {
    let mut key = String::new();
    let mut current = ctx.root().clone();

    for step in &traversal.steps {
        match step {
            Step::Narrow(subtype) => {
                key.push('<');
                key.push_str(subtype);
                key.push('>');
                current = ctx.cached_path(&key, &current, false, |b, from| b.treat(from, subtype));
            }
            Step::Join(relation) => {
                key.push('>');
                key.push_str(relation);
                current = ctx.cached_path(&key, &current, true, |b, from| {
                    b.join(from, relation, JoinType::Left)
                });
            }
            Step::Embedded(attribute) => {
                key.push('.');
                key.push_str(attribute);
                current = ctx.cached_path(&key, &current, false, |b, from| {
                    b.embedded(from, attribute)
                });
            }
            Step::Attribute(name) => return Ok(ctx.builder().get(&current, name)),
        }
    }

    Err(SearchError::execution(format!(
        "traversal '{traversal}' does not end in an attribute"
    )))
}
