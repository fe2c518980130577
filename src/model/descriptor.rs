//! Field descriptors: what the catalog knows about one searchable path

use std::fmt;

use regex::Regex;
use smallvec::SmallVec;

use super::schema::FieldKind;
use super::types::{Cardinality, SearchType, Searchable, ValueType};

/// How a path segment is reached from the previous one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Traversal into another entity
    Relation {
        target: String,
        cardinality: Cardinality,
    },
    /// Same-entity access into an embedded value
    Embedded { type_name: String },
    /// Terminal field
    Attribute,
}

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: String,
    /// Type that declares the field
    pub declaring_type: String,
    pub kind: SegmentKind,
}

impl PathSegment {
    pub fn is_relation(&self) -> bool {
        matches!(self.kind, SegmentKind::Relation { .. })
    }

    /// Type reached after this segment, if it leads into a type
    pub fn target_type(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Relation { target, .. } => Some(target),
            SegmentKind::Embedded { type_name } => Some(type_name),
            SegmentKind::Attribute => None,
        }
    }
}

pub type Segments = SmallVec<[PathSegment; 4]>;

/// Render segments in canonical form: `>` before every relation, `.` between
/// everything else
pub fn canonical_path(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        if segment.is_relation() {
            out.push('>');
        } else if !out.is_empty() {
            out.push('.');
        }
        out.push_str(&segment.name);
    }
    out
}

/// Split a written path into `(written_as_relation, name)` pairs. `None` when
/// a name is empty or the path starts with `.`
pub fn split_path(path: &str) -> Option<SmallVec<[(bool, &str); 4]>> {
    let mut parts = SmallVec::new();
    let mut rest = path;
    while parts.is_empty() || !rest.is_empty() {
        let relation = if let Some(tail) = rest.strip_prefix('>') {
            rest = tail;
            true
        } else if let Some(tail) = rest.strip_prefix('.') {
            if parts.is_empty() {
                return None;
            }
            rest = tail;
            false
        } else {
            false
        };
        let end = rest.find(['.', '>']).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        parts.push((relation, &rest[..end]));
        rest = &rest[end..];
    }
    Some(parts)
}

/// A `regexPattern` directive compiled to match the whole literal
#[derive(Debug, Clone)]
pub struct FieldPattern(Regex);

impl FieldPattern {
    pub fn compile(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{pattern})$")).map(Self)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for FieldPattern {}

/// Everything known about one searchable field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Canonical path (`>children.name`)
    pub path: String,
    /// Ordered segments, terminal field last
    pub segments: Segments,
    /// Native kind of the terminal field
    pub kind: FieldKind,
    pub directives: Searchable,
    /// Compiled `directives.regex_pattern`; `None` when absent or invalid
    pub pattern: Option<FieldPattern>,
}

impl FieldDescriptor {
    pub fn new(segments: Segments, kind: FieldKind, directives: Searchable) -> Self {
        let pattern = directives
            .regex_pattern
            .as_deref()
            .and_then(|p| FieldPattern::compile(p).ok());
        Self {
            path: canonical_path(&segments),
            segments,
            kind,
            directives,
            pattern,
        }
    }

    /// Whether `path` names this field: the canonical path, or a spelling
    /// that writes single-valued relations with `.`
    pub fn accepts_spelling(&self, path: &str) -> bool {
        let Some(parts) = split_path(path) else {
            return false;
        };
        parts.len() == self.segments.len()
            && parts
                .iter()
                .zip(&self.segments)
                .all(|(&(relation, name), segment)| {
                    name == segment.name
                        && match &segment.kind {
                            SegmentKind::Relation { cardinality, .. } => {
                                relation || *cardinality == Cardinality::One
                            }
                            _ => !relation,
                        }
                })
    }

    /// Terminal segment
    pub fn terminal(&self) -> &PathSegment {
        // segments are never empty, the catalog always pushes the terminal field
        &self.segments[self.segments.len() - 1]
    }

    pub fn name(&self) -> &str {
        &self.terminal().name
    }

    /// Type declaring the terminal field
    pub fn declaring_type(&self) -> &str {
        &self.terminal().declaring_type
    }

    pub fn value_type(&self) -> Option<&ValueType> {
        self.kind.value_type()
    }

    /// Effective conversion target: the declared directive, else the native type
    pub fn target_type(&self) -> SearchType {
        match (self.directives.target_type, self.value_type()) {
            (SearchType::Untyped, Some(value_type)) => SearchType::from_value_type(value_type),
            (target, _) => target,
        }
    }

    /// Whether the terminal field holds a collection
    pub fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    /// Whether any traversal step fans out over a collection
    pub fn crosses_collection(&self) -> bool {
        self.segments.iter().any(|s| {
            matches!(
                s.kind,
                SegmentKind::Relation {
                    cardinality: Cardinality::Many,
                    ..
                }
            )
        })
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}
