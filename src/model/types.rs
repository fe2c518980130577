//! Type system definitions for searchable entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Native storage type of a scalar field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// Boolean value (true/false)
    Boolean,
    /// 64-bit integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Exact decimal with arbitrary precision
    Decimal,
    /// String value
    String,
    /// Calendar date (YYYY-MM-DD)
    Date,
    /// Instant normalized to UTC
    DateTime,
    /// Time of day (HH:MM:SS)
    Time,
    /// ISO-8601 date-based period
    Period,
    /// Declared enumeration with its members
    Enum {
        /// Enumeration type name
        name: String,
        /// Member names in declaration order
        members: Vec<String>,
    },
    /// Element collection stored on the entity itself
    List(Box<ValueType>),
}

impl ValueType {
    /// Shortcut for an enumeration type
    pub fn enumeration<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueType::Enum {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Enumeration name, when this is an enum type
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            ValueType::Enum { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the type is a list of values
    pub fn is_list(&self) -> bool {
        matches!(self, ValueType::List(_))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Boolean => write!(f, "Boolean"),
            ValueType::Integer => write!(f, "Integer"),
            ValueType::Float => write!(f, "Float"),
            ValueType::Decimal => write!(f, "Decimal"),
            ValueType::String => write!(f, "String"),
            ValueType::Date => write!(f, "Date"),
            ValueType::DateTime => write!(f, "DateTime"),
            ValueType::Time => write!(f, "Time"),
            ValueType::Period => write!(f, "Period"),
            ValueType::Enum { name, .. } => write!(f, "{name}"),
            ValueType::List(inner) => write!(f, "List<{inner}>"),
        }
    }
}

/// Conversion target classification declared on a searchable field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchType {
    /// Derive the target from the native type
    #[default]
    Untyped,
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Period,
    Enum,
}

impl SearchType {
    /// Classification matching a native storage type
    pub fn from_value_type(value_type: &ValueType) -> Self {
        match value_type {
            ValueType::Boolean => SearchType::Boolean,
            ValueType::Integer => SearchType::Integer,
            ValueType::Float => SearchType::Float,
            ValueType::Decimal => SearchType::Decimal,
            ValueType::String => SearchType::String,
            ValueType::Date => SearchType::Date,
            ValueType::DateTime => SearchType::DateTime,
            ValueType::Time => SearchType::Time,
            ValueType::Period => SearchType::Period,
            ValueType::Enum { .. } => SearchType::Enum,
            ValueType::List(inner) => SearchType::from_value_type(inner),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchType::Untyped => "Untyped",
            SearchType::String => "String",
            SearchType::Integer => "Integer",
            SearchType::Float => "Float",
            SearchType::Decimal => "Decimal",
            SearchType::Boolean => "Boolean",
            SearchType::Date => "Date",
            SearchType::DateTime => "DateTime",
            SearchType::Time => "Time",
            SearchType::Period => "Period",
            SearchType::Enum => "Enum",
        };
        f.write_str(name)
    }
}

/// Relation cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    /// Single-valued relation (many-to-one, one-to-one)
    One,
    /// Collection-valued relation (one-to-many, many-to-many)
    Many,
}

/// Search directives attached to a searchable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Searchable {
    /// Conversion target; `Untyped` derives it from the native type
    pub target_type: SearchType,
    /// strftime pattern for date parsing and string-stored dates
    pub date_pattern: Option<String>,
    pub max_size: Option<usize>,
    pub min_size: Option<usize>,
    /// Pattern the whole literal must match
    pub regex_pattern: Option<String>,
    pub max_digits: Option<usize>,
    pub min_digits: Option<usize>,
    /// `#.##`-style format for string-stored decimals
    pub decimal_format: Option<String>,
    /// Field may be used as a sort key
    pub sortable: bool,
    /// Compare trimmed values
    pub trim: bool,
}

impl Default for Searchable {
    fn default() -> Self {
        Self {
            target_type: SearchType::Untyped,
            date_pattern: None,
            max_size: None,
            min_size: None,
            regex_pattern: None,
            max_digits: None,
            min_digits: None,
            decimal_format: None,
            sortable: true,
            trim: false,
        }
    }
}

impl Searchable {
    pub fn with_target_type(mut self, target_type: SearchType) -> Self {
        self.target_type = target_type;
        self
    }

    pub fn with_date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = Some(pattern.into());
        self
    }

    pub fn with_size(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_size = min;
        self.max_size = max;
        self
    }

    pub fn with_regex_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.regex_pattern = Some(pattern.into());
        self
    }

    pub fn with_digits(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_digits = min;
        self.max_digits = max;
        self
    }

    pub fn with_decimal_format(mut self, format: impl Into<String>) -> Self {
        self.decimal_format = Some(format.into());
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_serde_shapes() {
        let parsed: ValueType = serde_json::from_value(json!("dateTime")).unwrap();
        assert_eq!(parsed, ValueType::DateTime);

        let parsed: ValueType =
            serde_json::from_value(json!({"enum": {"name": "Status", "members": ["A", "B"]}}))
                .unwrap();
        assert_eq!(parsed, ValueType::enumeration("Status", ["A", "B"]));

        let parsed: ValueType = serde_json::from_value(json!({"list": "string"})).unwrap();
        assert_eq!(parsed, ValueType::List(Box::new(ValueType::String)));
    }

    #[test]
    fn test_searchable_defaults() {
        let parsed: Searchable = serde_json::from_value(json!({"trim": true})).unwrap();
        assert!(parsed.sortable);
        assert!(parsed.trim);
        assert_eq!(parsed.target_type, SearchType::Untyped);
    }

    #[test]
    fn test_search_type_from_list() {
        let list = ValueType::List(Box::new(ValueType::Integer));
        assert_eq!(SearchType::from_value_type(&list), SearchType::Integer);
    }
}
