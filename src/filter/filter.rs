use serde_json::Value;

use super::filter_order::{quote_column, FilterOrder};
use super::types::{FilterOrderInfo, PageRequest, SqlResult};

/// SELECT builder for list endpoints: a fixed source (table plus joins),
/// AND-ed conditions with positional parameters, ordering and paging.
pub struct Filter {
    source: String,
    select: String,
    conditions: Vec<String>,
    params: Vec<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    /// `source` is trusted SQL (table descriptors and joins), never client input
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            select: "*".to_string(),
            conditions: vec![],
            params: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn select(&mut self, columns: impl Into<String>) -> &mut Self {
        self.select = columns.into();
        self
    }

    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let placeholder = self.bind(value.into());
        self.conditions.push(format!("{} = {}", quote_column(column), placeholder));
        self
    }

    pub fn where_eq_ignore_case(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let placeholder = self.bind(value.into());
        self.conditions
            .push(format!("LOWER({}) = LOWER({})", quote_column(column), placeholder));
        self
    }

    pub fn where_ne(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let placeholder = self.bind(value.into());
        self.conditions.push(format!("{} <> {}", quote_column(column), placeholder));
        self
    }

    /// Case-insensitive substring match OR-ed across `columns`.
    /// A blank term adds nothing.
    pub fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        if columns.is_empty() {
            return self;
        }

        let placeholder = self.bind(Value::String(format!("%{}%", escape_like(term))));
        let parts: Vec<String> = columns
            .iter()
            .map(|c| format!("{} ILIKE {}", quote_column(c), placeholder))
            .collect();
        self.conditions.push(format!("({})", parts.join(" OR ")));
        self
    }

    pub fn order(&mut self, info: FilterOrderInfo) -> &mut Self {
        self.order_data.push(info);
        self
    }

    pub fn page(&mut self, request: &PageRequest) -> &mut Self {
        self.limit = Some(request.limit);
        self.offset = Some(request.offset());
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut params = self.params.clone();
        let mut limit_clause = String::new();
        if let Some(limit) = self.limit {
            params.push(Value::from(limit));
            limit_clause = format!("LIMIT ${}", params.len());
            if let Some(offset) = self.offset {
                params.push(Value::from(offset));
                limit_clause.push_str(&format!(" OFFSET ${}", params.len()));
            }
        }

        let query = [
            format!("SELECT {}", self.select),
            format!("FROM {}", self.source),
            self.where_clause(),
            FilterOrder::generate(&self.order_data),
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let query = [
            "SELECT COUNT(*) AS count".to_string(),
            format!("FROM {}", self.source),
            self.where_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params: self.params.clone() }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}

/// Escape LIKE metacharacters so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_select_has_no_where_or_limit() {
        let sql = Filter::new("tipo_pais t").to_sql();
        assert_eq!(sql.query, "SELECT * FROM tipo_pais t");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn search_reuses_one_placeholder_across_columns() {
        let mut filter = Filter::new("tipo_cbo t");
        filter.search(&["t.codigo", "t.descricao"], Some("  enf "));
        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM tipo_cbo t WHERE (t.\"codigo\" ILIKE $1 OR t.\"descricao\" ILIKE $1)"
        );
        assert_eq!(sql.params, vec![json!("%enf%")]);
    }

    #[test]
    fn blank_search_adds_nothing() {
        let mut filter = Filter::new("tipo_raca t");
        filter.search(&["t.descricao"], Some("   ")).search(&["t.descricao"], None);
        assert_eq!(filter.to_count_sql().query, "SELECT COUNT(*) AS count FROM tipo_raca t");
    }

    #[test]
    fn page_params_follow_condition_params() {
        let mut filter = Filter::new("tipo_municipio t");
        filter
            .select("t.*")
            .where_eq("t.tipo_estado_idtipo_estado", 26)
            .search(&["t.descricao"], Some("são"))
            .order(FilterOrderInfo::asc("t.descricao"))
            .page(&PageRequest { page: 3, limit: 20 });

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT t.* FROM tipo_municipio t WHERE t.\"tipo_estado_idtipo_estado\" = $1 \
             AND (t.\"descricao\" ILIKE $2) ORDER BY t.\"descricao\" ASC LIMIT $3 OFFSET $4"
        );
        assert_eq!(sql.params, vec![json!(26), json!("%são%"), json!(20), json!(40)]);

        let count = filter.to_count_sql();
        assert_eq!(
            count.query,
            "SELECT COUNT(*) AS count FROM tipo_municipio t WHERE t.\"tipo_estado_idtipo_estado\" = $1 \
             AND (t.\"descricao\" ILIKE $2)"
        );
        assert_eq!(count.params.len(), 2);
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("clinica"), "clinica");
    }
}
