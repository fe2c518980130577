//! Search request envelope

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{FilterParser, OperatorLookup};
use crate::ast::FilterExpression;
use crate::core::{Result, SearchError};
use crate::evaluator::SortCriterion;

/// A parsed search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// `None` matches everything
    pub filter: Option<FilterExpression>,
    pub sort: Vec<SortCriterion>,
    pub page_size: Option<usize>,
    /// Zero-based page index
    pub page_offset: usize,
}

impl SearchRequest {
    pub fn new(filter: FilterExpression) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, criterion: SortCriterion) -> Self {
        self.sort.push(criterion);
        self
    }

    pub fn with_page(mut self, size: usize, offset: usize) -> Self {
        self.page_size = Some(size);
        self.page_offset = offset;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestOptions {
    #[serde(default)]
    sort_key: Option<SortKey>,
    #[serde(default)]
    page_size: Option<usize>,
    #[serde(default)]
    page_offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SortKey {
    One(String),
    Many(Vec<String>),
}

/// Parse `{ "filter": ..., "options": { "sortKey", "pageSize", "pageOffset" } }`
pub fn parse_request<L: OperatorLookup + ?Sized>(
    json: &JsonValue,
    parser: &FilterParser<'_, L>,
) -> Result<SearchRequest> {
    let JsonValue::Object(envelope) = json else {
        return Err(SearchError::invalid_request(
            "the request must be a JSON object",
        ));
    };

    let filter = match envelope.get("filter") {
        None | Some(JsonValue::Null) => None,
        Some(filter) => Some(parser.parse(filter)?),
    };

    let options = match envelope.get("options") {
        None | Some(JsonValue::Null) => RequestOptions::default(),
        Some(options) => RequestOptions::deserialize(options)
            .map_err(|e| SearchError::invalid_request(format!("invalid options: {e}")))?,
    };

    let keys = match options.sort_key {
        None => Vec::new(),
        Some(SortKey::One(key)) => vec![key],
        Some(SortKey::Many(keys)) => keys,
    };
    let sort = keys
        .iter()
        .map(|key| SortCriterion::parse(key))
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchRequest {
        filter,
        sort,
        page_size: options.page_size,
        page_offset: options.page_offset.unwrap_or(0),
    })
}
