//! Sort criteria and page bounds

use serde::Serialize;

use super::context::QueryContext;
use super::operand::Operand;
use crate::backend::{Order, QueryBuilder, SortDirection};
use crate::config::EngineConfig;
use crate::core::{Result, SearchError};

/// A field path with a direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    pub path: String,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn ascending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse a sort key; a leading `-` means descending
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim();
        let (path, direction) = match key.strip_prefix('-') {
            Some(rest) => (rest.trim(), SortDirection::Descending),
            None => (key, SortDirection::Ascending),
        };
        if path.is_empty() {
            return Err(SearchError::invalid_request(format!(
                "empty sort key '{key}'"
            )));
        }
        Ok(Self {
            path: path.to_string(),
            direction,
        })
    }
}

/// Resolve sort criteria into builder expressions through the join cache
pub fn resolve_orders<B: QueryBuilder>(
    criteria: &[SortCriterion],
    ctx: &mut QueryContext<'_, B>,
) -> Result<Vec<Order<B>>> {
    criteria
        .iter()
        .map(|criterion| {
            let Operand::Field { expr, descriptor } = ctx.field(&criterion.path)? else {
                return Err(SearchError::execution(format!(
                    "sort key '{}' did not resolve to a field",
                    criterion.path
                )));
            };
            if !descriptor.directives.sortable {
                return Err(SearchError::malformed(
                    "sortKey",
                    format!("field '{}' is not sortable", criterion.path),
                ));
            }
            Ok(Order {
                path: criterion.path.clone(),
                expr,
                direction: criterion.direction,
            })
        })
        .collect()
}

/// Normalized page bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub offset: usize,
}

impl PageRequest {
    /// Apply defaults and limits: a missing size takes the configured
    /// default, sizes above the maximum are capped, zero is rejected
    pub fn normalize(size: Option<usize>, offset: usize, config: &EngineConfig) -> Result<Self> {
        let size = match size {
            Some(0) => {
                return Err(SearchError::invalid_request("pageSize must be at least 1"));
            }
            Some(size) => size.min(config.max_page_size),
            None => config.default_page_size,
        };
        Ok(Self { size, offset })
    }

    /// Index of the first element of this page
    pub fn first(&self) -> usize {
        self.offset.saturating_mul(self.size)
    }

    /// Slice bounds of this page within `total` elements
    pub fn bounds(&self, total: usize) -> (usize, usize) {
        let start = self.first().min(total);
        let end = start.saturating_add(self.size).min(total);
        (start, end)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Number of elements on this page
    pub size: usize,
    pub page_size: usize,
    pub page_offset: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: usize) -> Self {
        Self {
            size: content.len(),
            content,
            page_size: request.size,
            page_offset: request.offset,
            total_elements,
            total_pages: total_elements.div_ceil(request.size.max(1)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            size: self.size,
            page_size: self.page_size,
            page_offset: self.page_offset,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("name", "name", SortDirection::Ascending)]
    #[case("-name", "name", SortDirection::Descending)]
    #[case(" ->parent.name ", ">parent.name", SortDirection::Descending)]
    fn test_parse_sort_key(
        #[case] key: &str,
        #[case] path: &str,
        #[case] direction: SortDirection,
    ) {
        let criterion = SortCriterion::parse(key).unwrap();
        assert_eq!(criterion.path, path);
        assert_eq!(criterion.direction, direction);
    }

    #[test]
    fn test_empty_sort_key() {
        assert!(matches!(
            SortCriterion::parse("-"),
            Err(SearchError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_page_normalization() {
        let config = EngineConfig::default();
        assert_eq!(
            PageRequest::normalize(None, 2, &config).unwrap(),
            PageRequest {
                size: config.default_page_size,
                offset: 2
            }
        );
        assert_eq!(
            PageRequest::normalize(Some(1_000_000), 0, &config).unwrap().size,
            config.max_page_size
        );
        assert!(PageRequest::normalize(Some(0), 0, &config).is_err());
    }

    #[test]
    fn test_page_bounds() {
        let request = PageRequest { size: 3, offset: 2 };
        assert_eq!(request.bounds(10), (6, 9));
        assert_eq!(request.bounds(7), (6, 7));
        assert_eq!(request.bounds(4), (4, 4));

        let page = Page::new(vec![7], request, 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.size, 1);
    }
}
