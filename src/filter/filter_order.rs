use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Resolve a client `sortKey`/`sortOrder` pair against a whitelist.
    /// Unknown keys fall back to `default_column`; bad directions are rejected.
    pub fn resolve(
        sort_key: Option<&str>,
        sort_order: Option<&str>,
        allowed: &[&str],
        default_column: &str,
    ) -> Result<FilterOrderInfo, FilterError> {
        let sort = SortDirection::parse(sort_order)?;
        let column = sort_key
            .map(str::trim)
            .and_then(|key| allowed.iter().find(|c| **c == key))
            .copied()
            .unwrap_or(default_column);
        Ok(FilterOrderInfo { column: column.to_string(), sort })
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", quote_column(&i.column), i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

/// Quote each dotted part: `t.descricao` -> `t."descricao"`
pub fn quote_column(column: &str) -> String {
    match column.rsplit_once('.') {
        Some((qualifier, name)) => format!("{}.\"{}\"", qualifier, name.replace('"', "\"\"")),
        None => format!("\"{}\"", column.replace('"', "\"\"")),
    }
}
