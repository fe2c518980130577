//! Query trees built by [`MemoryBuilder`]

use std::fmt;

use crate::backend::{Comparison, JoinType, QueryBuilder};
use crate::core::Value;

/// Reference to a record reachable from the root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemoryPath {
    Root(String),
    Join {
        parent: Box<MemoryPath>,
        relation: String,
        join_type: JoinType,
    },
    Embedded {
        parent: Box<MemoryPath>,
        attribute: String,
    },
    Treat {
        parent: Box<MemoryPath>,
        subtype: String,
    },
}

impl MemoryPath {
    /// Joins on the way from the root to this path, outermost first
    pub fn joins(&self) -> Vec<&MemoryPath> {
        let mut joins = match self {
            MemoryPath::Root(_) => return Vec::new(),
            MemoryPath::Join { parent, .. }
            | MemoryPath::Embedded { parent, .. }
            | MemoryPath::Treat { parent, .. } => parent.joins(),
        };
        if matches!(self, MemoryPath::Join { .. }) {
            joins.push(self);
        }
        joins
    }
}

impl fmt::Display for MemoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryPath::Root(entity) => write!(f, "{entity}"),
            MemoryPath::Join {
                parent,
                relation,
                join_type: JoinType::Left,
            } => write!(f, "{parent}>{relation}"),
            MemoryPath::Join {
                parent,
                relation,
                join_type: JoinType::Inner,
            } => write!(f, "{parent}>>{relation}"),
            MemoryPath::Embedded { parent, attribute } => write!(f, "{parent}.{attribute}"),
            MemoryPath::Treat { parent, subtype } => write!(f, "{parent}<{subtype}>"),
        }
    }
}

/// Value expression
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryExpr {
    Attribute { path: MemoryPath, name: String },
    Literal(Value),
    Lower(Box<MemoryExpr>),
    Upper(Box<MemoryExpr>),
    Trim(Box<MemoryExpr>),
    Concat(Box<MemoryExpr>, Box<MemoryExpr>),
}

impl MemoryExpr {
    pub(crate) fn collect_joins<'a>(&'a self, out: &mut Vec<&'a MemoryPath>) {
        match self {
            MemoryExpr::Attribute { path, .. } => out.extend(path.joins()),
            MemoryExpr::Literal(_) => {}
            MemoryExpr::Lower(inner) | MemoryExpr::Upper(inner) | MemoryExpr::Trim(inner) => {
                inner.collect_joins(out)
            }
            MemoryExpr::Concat(left, right) => {
                left.collect_joins(out);
                right.collect_joins(out);
            }
        }
    }
}

impl fmt::Display for MemoryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryExpr::Attribute { path, name } => write!(f, "{path}.{name}"),
            MemoryExpr::Literal(value) => write!(f, "{value}"),
            MemoryExpr::Lower(inner) => write!(f, "lower({inner})"),
            MemoryExpr::Upper(inner) => write!(f, "upper({inner})"),
            MemoryExpr::Trim(inner) => write!(f, "trim({inner})"),
            MemoryExpr::Concat(left, right) => write!(f, "concat({left}, {right})"),
        }
    }
}

/// Boolean condition
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryPredicate {
    Equal(MemoryExpr, MemoryExpr),
    NotEqual(MemoryExpr, MemoryExpr),
    Compare(Comparison, MemoryExpr, MemoryExpr),
    Between(MemoryExpr, MemoryExpr, MemoryExpr),
    Like(MemoryExpr, MemoryExpr),
    In(MemoryExpr, Vec<MemoryExpr>),
    IsNull(MemoryExpr),
    IsEmpty(MemoryExpr),
    IsTrue(MemoryExpr),
    And(Vec<MemoryPredicate>),
    Or(Vec<MemoryPredicate>),
    Not(Box<MemoryPredicate>),
    Constant(bool),
}

impl MemoryPredicate {
    pub(crate) fn collect_joins<'a>(&'a self, out: &mut Vec<&'a MemoryPath>) {
        match self {
            MemoryPredicate::Equal(l, r)
            | MemoryPredicate::NotEqual(l, r)
            | MemoryPredicate::Compare(_, l, r)
            | MemoryPredicate::Like(l, r) => {
                l.collect_joins(out);
                r.collect_joins(out);
            }
            MemoryPredicate::Between(e, lo, hi) => {
                e.collect_joins(out);
                lo.collect_joins(out);
                hi.collect_joins(out);
            }
            MemoryPredicate::In(e, values) => {
                e.collect_joins(out);
                values.iter().for_each(|v| v.collect_joins(out));
            }
            MemoryPredicate::IsNull(e) | MemoryPredicate::IsEmpty(e) | MemoryPredicate::IsTrue(e) => {
                e.collect_joins(out)
            }
            MemoryPredicate::And(items) | MemoryPredicate::Or(items) => {
                items.iter().for_each(|p| p.collect_joins(out))
            }
            MemoryPredicate::Not(inner) => inner.collect_joins(out),
            MemoryPredicate::Constant(_) => {}
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    items: &[impl fmt::Display],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for MemoryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryPredicate::Equal(l, r) => write!(f, "{l} = {r}"),
            MemoryPredicate::NotEqual(l, r) => write!(f, "{l} <> {r}"),
            MemoryPredicate::Compare(op, l, r) => write!(f, "{l} {} {r}", op.symbol()),
            MemoryPredicate::Between(e, lo, hi) => write!(f, "{e} BETWEEN {lo} AND {hi}"),
            MemoryPredicate::Like(e, pattern) => write!(f, "{e} LIKE {pattern}"),
            MemoryPredicate::In(e, values) => {
                write!(f, "{e} IN (")?;
                write_joined(f, values, ", ")?;
                write!(f, ")")
            }
            MemoryPredicate::IsNull(e) => write!(f, "{e} IS NULL"),
            MemoryPredicate::IsEmpty(e) => write!(f, "{e} IS EMPTY"),
            MemoryPredicate::IsTrue(e) => write!(f, "{e} IS TRUE"),
            MemoryPredicate::And(items) => {
                write!(f, "(")?;
                write_joined(f, items, " AND ")?;
                write!(f, ")")
            }
            MemoryPredicate::Or(items) => {
                write!(f, "(")?;
                write_joined(f, items, " OR ")?;
                write!(f, ")")
            }
            MemoryPredicate::Not(inner) => write!(f, "NOT ({inner})"),
            MemoryPredicate::Constant(true) => write!(f, "TRUE"),
            MemoryPredicate::Constant(false) => write!(f, "FALSE"),
        }
    }
}

/// Builds plain query trees; stateless, so equal inputs give equal trees
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBuilder;

impl QueryBuilder for MemoryBuilder {
    type Path = MemoryPath;
    type Expr = MemoryExpr;
    type Predicate = MemoryPredicate;

    fn root(&self, entity: &str) -> MemoryPath {
        MemoryPath::Root(entity.to_string())
    }

    fn join(&self, from: &MemoryPath, relation: &str, join_type: JoinType) -> MemoryPath {
        MemoryPath::Join {
            parent: Box::new(from.clone()),
            relation: relation.to_string(),
            join_type,
        }
    }

    fn embedded(&self, from: &MemoryPath, attribute: &str) -> MemoryPath {
        MemoryPath::Embedded {
            parent: Box::new(from.clone()),
            attribute: attribute.to_string(),
        }
    }

    fn treat(&self, path: &MemoryPath, subtype: &str) -> MemoryPath {
        MemoryPath::Treat {
            parent: Box::new(path.clone()),
            subtype: subtype.to_string(),
        }
    }

    fn get(&self, from: &MemoryPath, attribute: &str) -> MemoryExpr {
        MemoryExpr::Attribute {
            path: from.clone(),
            name: attribute.to_string(),
        }
    }

    fn literal(&self, value: Value) -> MemoryExpr {
        MemoryExpr::Literal(value)
    }

    fn lower(&self, expr: MemoryExpr) -> MemoryExpr {
        MemoryExpr::Lower(Box::new(expr))
    }

    fn upper(&self, expr: MemoryExpr) -> MemoryExpr {
        MemoryExpr::Upper(Box::new(expr))
    }

    fn trim(&self, expr: MemoryExpr) -> MemoryExpr {
        MemoryExpr::Trim(Box::new(expr))
    }

    fn concat(&self, left: MemoryExpr, right: MemoryExpr) -> MemoryExpr {
        MemoryExpr::Concat(Box::new(left), Box::new(right))
    }

    fn equal(&self, left: MemoryExpr, right: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::Equal(left, right)
    }

    fn not_equal(&self, left: MemoryExpr, right: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::NotEqual(left, right)
    }

    fn compare(&self, op: Comparison, left: MemoryExpr, right: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::Compare(op, left, right)
    }

    fn between(&self, expr: MemoryExpr, lower: MemoryExpr, upper: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::Between(expr, lower, upper)
    }

    fn like(&self, expr: MemoryExpr, pattern: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::Like(expr, pattern)
    }

    fn in_list(&self, expr: MemoryExpr, values: Vec<MemoryExpr>) -> MemoryPredicate {
        MemoryPredicate::In(expr, values)
    }

    fn is_null(&self, expr: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::IsNull(expr)
    }

    fn is_empty(&self, expr: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::IsEmpty(expr)
    }

    fn is_true(&self, expr: MemoryExpr) -> MemoryPredicate {
        MemoryPredicate::IsTrue(expr)
    }

    fn and(&self, predicates: Vec<MemoryPredicate>) -> MemoryPredicate {
        MemoryPredicate::And(predicates)
    }

    fn or(&self, predicates: Vec<MemoryPredicate>) -> MemoryPredicate {
        MemoryPredicate::Or(predicates)
    }

    fn not(&self, predicate: MemoryPredicate) -> MemoryPredicate {
        MemoryPredicate::Not(Box::new(predicate))
    }

    fn constant(&self, value: bool) -> MemoryPredicate {
        MemoryPredicate::Constant(value)
    }
}
