use serde::Serialize;

use super::error::FilterError;
use crate::config::PaginationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Absent or blank means ascending
    pub fn parse(raw: Option<&str>) -> Result<Self, FilterError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(SortDirection::Asc),
            Some(s) if s.eq_ignore_ascii_case("asc") => Ok(SortDirection::Asc),
            Some(s) if s.eq_ignore_ascii_case("desc") => Ok(SortDirection::Desc),
            Some(other) => Err(FilterError::InvalidSortOrder(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

impl FilterOrderInfo {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), sort: SortDirection::Asc }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}

/// Validated `page`/`limit` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, FilterError> {
        Self::parse_with(page, limit, &crate::config::CONFIG.pagination)
    }

    pub fn parse_with(
        page: Option<&str>,
        limit: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Self, FilterError> {
        let page = parse_positive("page", page)?.unwrap_or(1);
        let requested = parse_positive("limit", limit)?.unwrap_or(config.default_limit);

        let max_limit = config.max_limit.unwrap_or(i64::MAX);
        let limit = if requested > max_limit {
            tracing::warn!("Limit {} exceeds max {}, capping to max", requested, max_limit);
            max_limit
        } else {
            requested
        };

        if config.debug_logging {
            tracing::debug!("Pagination resolved to page={} limit={}", page, limit);
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<i64>, FilterError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(FilterError::InvalidPagination(format!("{}={}", name, raw))),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl PageMeta {
    pub fn new(total: i64, request: PageRequest) -> Self {
        let total_pages = if total <= 0 || request.limit <= 0 {
            0
        } else {
            (total + request.limit - 1) / request.limit
        };
        Self { total, total_pages, page: request.page, limit: request.limit }
    }
}

/// `{ data, meta }` body returned by every paginated endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self { data, meta: PageMeta::new(total, request) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig { default_limit: 10, max_limit: Some(50), debug_logging: false }
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let req = PageRequest::parse_with(None, None, &config()).unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);

        let blank = PageRequest::parse_with(Some(""), Some("  "), &config()).unwrap();
        assert_eq!(blank, PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn rejects_non_numeric_and_non_positive() {
        assert!(PageRequest::parse_with(Some("abc"), None, &config()).is_err());
        assert!(PageRequest::parse_with(Some("0"), None, &config()).is_err());
        assert!(PageRequest::parse_with(None, Some("-5"), &config()).is_err());
        assert!(PageRequest::parse_with(None, Some("2.5"), &config()).is_err());
    }

    #[test]
    fn caps_limit_at_configured_max() {
        let req = PageRequest::parse_with(Some("3"), Some("500"), &config()).unwrap();
        assert_eq!(req, PageRequest { page: 3, limit: 50 });
        assert_eq!(req.offset(), 100);
    }

    #[test]
    fn total_pages_rounds_up_and_is_zero_when_empty() {
        let req = PageRequest { page: 1, limit: 10 };
        assert_eq!(PageMeta::new(0, req).total_pages, 0);
        assert_eq!(PageMeta::new(10, req).total_pages, 1);
        assert_eq!(PageMeta::new(11, req).total_pages, 2);
        assert_eq!(PageMeta::new(11, PageRequest { page: 1, limit: 0 }).total_pages, 0);
    }

    #[test]
    fn meta_serializes_total_pages_in_camel_case() {
        let meta = PageMeta::new(25, PageRequest { page: 2, limit: 10 });
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({ "total": 25, "totalPages": 3, "page": 2, "limit": 10 }));
    }

    #[test]
    fn parses_sort_direction() {
        assert_eq!(SortDirection::parse(None).unwrap(), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("DESC")).unwrap(), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("asc")).unwrap(), SortDirection::Asc);
        assert!(SortDirection::parse(Some("sideways")).is_err());
    }
}
