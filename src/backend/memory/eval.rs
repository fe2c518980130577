//! Three-valued evaluation of query trees over records
//!
//! Every join of a query is a variable ranging over the records its relation
//! reaches. A root record matches when at least one assignment of those
//! variables makes the predicate true. Left joins bind `None` when the
//! relation is absent or empty.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::sync::Arc;

use regex::Regex;
use rustc_hash::FxHashMap;

use super::query::{MemoryExpr, MemoryPath, MemoryPredicate};
use super::store::{Datum, Record};
use crate::backend::{Comparison, JoinType};
use crate::core::{Result, SearchError, Value};
use crate::model::SchemaRegistry;

/// Records bound to each join of a query
pub(crate) type Binding = FxHashMap<MemoryPath, Option<Arc<Record>>>;

pub(crate) struct Evaluator<'s> {
    schema: &'s SchemaRegistry,
    patterns: RefCell<FxHashMap<String, Regex>>,
}

impl<'s> Evaluator<'s> {
    pub(crate) fn new(schema: &'s SchemaRegistry) -> Self {
        Self {
            schema,
            patterns: RefCell::new(FxHashMap::default()),
        }
    }

    /// Every assignment of `joins` reachable from `root`. `joins` must list
    /// parents before their children.
    pub(crate) fn bindings(&self, root: &Arc<Record>, joins: &[&MemoryPath]) -> Vec<Binding> {
        let mut bindings = vec![Binding::default()];
        for &join in joins {
            let MemoryPath::Join {
                parent,
                relation,
                join_type,
            } = join
            else {
                continue;
            };
            let mut next = Vec::with_capacity(bindings.len());
            for binding in bindings {
                let targets: Vec<Arc<Record>> = match self.resolve(parent, root, &binding) {
                    None => Vec::new(),
                    Some(record) => match record.get(relation) {
                        Some(Datum::One(Some(target))) => vec![Arc::clone(target)],
                        Some(Datum::Many(targets)) => targets.clone(),
                        _ => Vec::new(),
                    },
                };
                if targets.is_empty() {
                    if *join_type == JoinType::Left {
                        let mut extended = binding;
                        extended.insert(join.clone(), None);
                        next.push(extended);
                    }
                    continue;
                }
                for target in targets {
                    let mut extended = binding.clone();
                    extended.insert(join.clone(), Some(target));
                    next.push(extended);
                }
            }
            bindings = next;
        }
        bindings
    }

    fn resolve(&self, path: &MemoryPath, root: &Arc<Record>, binding: &Binding) -> Option<Arc<Record>> {
        match path {
            MemoryPath::Root(_) => Some(Arc::clone(root)),
            MemoryPath::Join { .. } => binding.get(path).cloned().flatten(),
            MemoryPath::Embedded { parent, attribute } => {
                match self.resolve(parent, root, binding)?.get(attribute) {
                    Some(Datum::Embedded(value)) => Some(Arc::clone(value)),
                    _ => None,
                }
            }
            MemoryPath::Treat { parent, subtype } => self
                .resolve(parent, root, binding)
                .filter(|record| self.schema.is_assignable(subtype, record.entity())),
        }
    }

    fn attribute(
        &self,
        path: &MemoryPath,
        name: &str,
        root: &Arc<Record>,
        binding: &Binding,
    ) -> Option<Datum> {
        self.resolve(path, root, binding)?.get(name).cloned()
    }

    /// Value of `expr`; unresolvable paths yield null
    pub(crate) fn value(&self, expr: &MemoryExpr, root: &Arc<Record>, binding: &Binding) -> Result<Value> {
        match expr {
            MemoryExpr::Attribute { path, name } => match self.attribute(path, name, root, binding) {
                None | Some(Datum::One(None)) => Ok(Value::Null),
                Some(Datum::Value(value)) => Ok(value),
                Some(_) => Err(SearchError::execution(format!(
                    "'{path}.{name}' holds records, not a value"
                ))),
            },
            MemoryExpr::Literal(value) => Ok(value.clone()),
            MemoryExpr::Lower(inner) => {
                Ok(map_text(self.value(inner, root, binding)?, &str::to_lowercase))
            }
            MemoryExpr::Upper(inner) => {
                Ok(map_text(self.value(inner, root, binding)?, &str::to_uppercase))
            }
            MemoryExpr::Trim(inner) => Ok(map_text(self.value(inner, root, binding)?, &|s: &str| {
                s.trim().to_string()
            })),
            MemoryExpr::Concat(left, right) => {
                let left = self.value(left, root, binding)?;
                let right = self.value(right, root, binding)?;
                if left.is_null() || right.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::String(format!(
                    "{}{}",
                    left.to_plain_string(),
                    right.to_plain_string()
                )))
            }
        }
    }

    /// Truth of `predicate`; `None` is unknown
    pub(crate) fn test(
        &self,
        predicate: &MemoryPredicate,
        root: &Arc<Record>,
        binding: &Binding,
    ) -> Result<Option<bool>> {
        let value = |expr: &MemoryExpr| self.value(expr, root, binding);
        Ok(match predicate {
            MemoryPredicate::Equal(l, r) => value(l)?.equals(&value(r)?),
            MemoryPredicate::NotEqual(l, r) => value(l)?.equals(&value(r)?).map(|eq| !eq),
            MemoryPredicate::Compare(op, l, r) => value(l)?
                .compare(&value(r)?)
                .map(|ordering| compares(*op, ordering)),
            MemoryPredicate::Between(e, lo, hi) => {
                let subject = value(e)?;
                let above = subject.compare(&value(lo)?).map(Ordering::is_ge);
                let below = subject.compare(&value(hi)?).map(Ordering::is_le);
                and_all([above, below])
            }
            MemoryPredicate::Like(e, pattern) => {
                let subject = value(e)?;
                let pattern = value(pattern)?;
                if subject.is_null() || pattern.is_null() {
                    None
                } else {
                    Some(self.like(&pattern.to_plain_string())?.is_match(&subject.to_plain_string()))
                }
            }
            MemoryPredicate::In(e, values) => {
                let subject = value(e)?;
                let mut outcome = Some(false);
                for candidate in values {
                    match subject.equals(&value(candidate)?) {
                        Some(true) => return Ok(Some(true)),
                        None => outcome = None,
                        Some(false) => {}
                    }
                }
                outcome
            }
            MemoryPredicate::IsNull(e) => Some(self.is_null(e, root, binding)?),
            MemoryPredicate::IsEmpty(e) => Some(self.is_empty(e, root, binding)?),
            MemoryPredicate::IsTrue(e) => value(e)?.as_bool(),
            MemoryPredicate::And(items) => and_all(
                items
                    .iter()
                    .map(|p| self.test(p, root, binding))
                    .collect::<Result<Vec<_>>>()?,
            ),
            MemoryPredicate::Or(items) => or_any(
                items
                    .iter()
                    .map(|p| self.test(p, root, binding))
                    .collect::<Result<Vec<_>>>()?,
            ),
            MemoryPredicate::Not(inner) => self.test(inner, root, binding)?.map(|b| !b),
            MemoryPredicate::Constant(b) => Some(*b),
        })
    }

    fn is_null(&self, expr: &MemoryExpr, root: &Arc<Record>, binding: &Binding) -> Result<bool> {
        match expr {
            MemoryExpr::Attribute { path, name } => Ok(match self.attribute(path, name, root, binding) {
                None | Some(Datum::One(None)) => true,
                Some(Datum::Value(value)) => value.is_null(),
                Some(_) => false,
            }),
            other => Ok(self.value(other, root, binding)?.is_null()),
        }
    }

    fn is_empty(&self, expr: &MemoryExpr, root: &Arc<Record>, binding: &Binding) -> Result<bool> {
        let datum = match expr {
            MemoryExpr::Attribute { path, name } => self.attribute(path, name, root, binding),
            other => Some(Datum::Value(self.value(other, root, binding)?)),
        };
        Ok(match datum {
            None | Some(Datum::One(None)) | Some(Datum::Value(Value::Null)) => true,
            Some(Datum::Value(Value::List(items))) => items.is_empty(),
            Some(Datum::Many(records)) => records.is_empty(),
            Some(_) => false,
        })
    }

    fn like(&self, pattern: &str) -> Result<Regex> {
        if let Some(regex) = self.patterns.borrow().get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&like_to_regex(pattern))
            .map_err(|e| SearchError::execution(format!("LIKE pattern '{pattern}': {e}")))?;
        self.patterns
            .borrow_mut()
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

fn compares(op: Comparison, ordering: Ordering) -> bool {
    match op {
        Comparison::Lt => ordering.is_lt(),
        Comparison::Lte => ordering.is_le(),
        Comparison::Gt => ordering.is_gt(),
        Comparison::Gte => ordering.is_ge(),
    }
}

fn and_all(items: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut outcome = Some(true);
    for item in items {
        match item {
            Some(false) => return Some(false),
            None => outcome = None,
            Some(true) => {}
        }
    }
    outcome
}

fn or_any(items: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut outcome = Some(false);
    for item in items {
        match item {
            Some(true) => return Some(true),
            None => outcome = None,
            Some(false) => {}
        }
    }
    outcome
}

fn map_text(value: Value, f: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(f(&s)),
        Value::List(items) => Value::List(items.into_iter().map(|v| map_text(v, f)).collect()),
        other => Value::String(f(&other.to_plain_string())),
    }
}

/// `%` matches any run, `_` any single character
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?s)^");
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}
