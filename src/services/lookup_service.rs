use std::collections::HashMap;

use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, info};

use crate::database::manager::DatabaseError;
use crate::database::models::lookup::{FieldKind, LookupField, LookupTable, UniqueKey, MAIN_ALIAS};
use crate::database::models::ReferenceOption;
use crate::database::query_builder::{
    bind_param_query, fetch_count, fetch_exists, fetch_json_optional, fetch_json_rows, fetch_typed,
    lock_for_write,
};
use crate::filter::{Filter, FilterOrderInfo, PageRequest, Paginated};
use crate::services::error::{map_delete_error, ServiceError};
use crate::services::parse::{id_from_json, is_blank, parse_id};

/// Field values that passed validation, in descriptor order
#[derive(Debug, Clone)]
pub struct LookupRecord {
    values: Vec<(&'static LookupField, Value)>,
}

impl LookupRecord {
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.iter().find(|(f, _)| f.column == column).map(|(_, v)| v)
    }

    pub fn values(&self) -> &[(&'static LookupField, Value)] {
        &self.values
    }
}

/// Natural-key lookup requested through `check-existing`
#[derive(Debug)]
pub struct ExistenceCheck {
    pub key: &'static UniqueKey,
    pub values: Vec<(&'static LookupField, Value)>,
    pub exclude_id: Option<i64>,
}

/// Trim, require, bound and normalize every declared field of `body`
pub fn validate_record(table: &'static LookupTable, body: &Value) -> Result<LookupRecord, ServiceError> {
    let empty = Map::new();
    let object = match body {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(ServiceError::validation("O corpo da requisição deve ser um objeto JSON")),
    };

    let mut values = Vec::with_capacity(table.fields.len());
    let mut errors = Vec::new();
    for field in table.fields {
        match normalize_field(field, object.get(field.column)) {
            Ok(value) => values.push((field, value)),
            Err(message) => errors.push((field.column.to_string(), message)),
        }
    }

    match ServiceError::invalid_fields(errors) {
        Some(err) => Err(err),
        None => Ok(LookupRecord { values }),
    }
}

fn normalize_field(field: &LookupField, raw: Option<&Value>) -> Result<Value, String> {
    let raw = match raw {
        Some(value) if !is_blank(Some(value)) => value,
        _ => return Err(format!("O campo {} é obrigatório", field.label)),
    };

    match &field.kind {
        FieldKind::Reference(_) => id_from_json(raw)
            .map(Value::from)
            .ok_or_else(|| format!("O campo {} é inválido", field.label)),
        FieldKind::Text | FieldKind::Code => {
            let text = match raw {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return Err(format!("O campo {} deve ser um texto", field.label)),
            };

            if let Some(max) = field.max_len {
                if text.chars().count() > max {
                    return Err(format!("O campo {} deve ter no máximo {} caracteres", field.label, max));
                }
            }

            if matches!(field.kind, FieldKind::Code) {
                let code = text.to_uppercase();
                if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-') {
                    return Err(format!(
                        "O campo {} deve conter apenas letras, números e hífen",
                        field.label
                    ));
                }
                return Ok(Value::String(code));
            }

            Ok(Value::String(text))
        }
    }
}

fn exclude_id(params: &HashMap<String, String>) -> Result<Option<i64>, ServiceError> {
    match params.get("excludeId").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => Ok(Some(parse_id(raw).ok_or_else(|| ServiceError::validation("excludeId inválido"))?)),
    }
}

/// Pick the first unique key whose params are all present in `params`
pub fn existence_check(
    table: &'static LookupTable,
    params: &HashMap<String, String>,
) -> Result<ExistenceCheck, ServiceError> {
    let exclude_id = exclude_id(params)?;

    for key in table.unique_keys {
        let provided: Option<Vec<(&str, &String)>> = key
            .params
            .iter()
            .map(|(param, column)| {
                params.get(*param).filter(|v| !v.trim().is_empty()).map(|v| (*column, v))
            })
            .collect();
        let Some(provided) = provided else {
            continue;
        };

        let mut values = Vec::with_capacity(provided.len());
        for (column, raw) in provided {
            let Some(field) = table.field(column) else {
                continue;
            };
            let value = normalize_field(field, Some(&Value::String(raw.clone())))
                .map_err(ServiceError::validation)?;
            values.push((field, value));
        }
        return Ok(ExistenceCheck { key, values, exclude_id });
    }

    Err(ServiceError::validation(format!("Informe {}", table.unique_key_hint())))
}

/// Check the single-column key named by `param`, which must be present
pub fn single_key_check(
    table: &'static LookupTable,
    param: &str,
    params: &HashMap<String, String>,
) -> Result<ExistenceCheck, ServiceError> {
    let required = || ServiceError::validation(format!("O parâmetro \"{}\" é obrigatório", param));
    let key = table.single_key(param).ok_or_else(required)?;
    let raw = params.get(param).filter(|v| !v.trim().is_empty()).ok_or_else(required)?;
    let field = key.params.first().and_then(|(_, column)| table.field(column)).ok_or_else(required)?;

    let value = normalize_field(field, Some(&Value::String(raw.clone()))).map_err(ServiceError::validation)?;
    Ok(ExistenceCheck { key, values: vec![(field, value)], exclude_id: exclude_id(params)? })
}

/// Equality filters declared by the table, read from the query string
pub fn parse_filters(
    table: &'static LookupTable,
    params: &HashMap<String, String>,
) -> Result<Vec<(&'static str, i64)>, ServiceError> {
    let mut out = Vec::new();
    for filter in table.filters {
        let Some(raw) = params.get(filter.param).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            continue;
        };
        let id = parse_id(raw)
            .ok_or_else(|| ServiceError::validation(format!("Filtro {} inválido", filter.param)))?;
        out.push((filter.column, id));
    }
    Ok(out)
}

/// Generic CRUD over one reference table
pub struct LookupService {
    pool: PgPool,
    table: &'static LookupTable,
}

impl LookupService {
    pub fn new(pool: PgPool, table: &'static LookupTable) -> Self {
        Self { pool, table }
    }

    fn not_found(&self) -> ServiceError {
        ServiceError::not_found(format!("{} não encontrado(a)", self.table.label))
    }

    fn base_filter(&self) -> Filter {
        let mut filter = Filter::new(self.table.source());
        filter.select(self.table.select_list());
        filter
    }

    fn ordered(&self, filter: &mut Filter, order_by: &str) {
        filter
            .order(FilterOrderInfo::asc(order_by))
            .order(FilterOrderInfo::asc(self.table.qualified_id()));
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Value>, ServiceError> {
        let mut filter = self.base_filter();
        filter.search(self.table.search_columns, search);
        self.ordered(&mut filter, self.table.order_by);
        Ok(fetch_json_rows(&self.pool, &filter.to_sql()).await?)
    }

    pub async fn list_paginated(
        &self,
        page: PageRequest,
        search: Option<&str>,
        filters: &[(&'static str, i64)],
    ) -> Result<Paginated<Value>, ServiceError> {
        let mut filter = self.base_filter();
        for (column, id) in filters {
            filter.where_eq(column, *id);
        }
        filter.search(self.table.search_columns, search);
        self.ordered(&mut filter, self.table.order_by);
        filter.page(&page);

        let count_sql = filter.to_count_sql();
        let sql = filter.to_sql();
        let (total, data) = futures::try_join!(
            fetch_count(&self.pool, &count_sql),
            fetch_json_rows(&self.pool, &sql)
        )?;

        Ok(Paginated::new(data, total, page))
    }

    /// Rows belonging to one parent, for tables that declare a group route
    pub async fn list_by_group(&self, parent_id: i64) -> Result<Vec<Value>, ServiceError> {
        let Some(group) = &self.table.group else {
            return Err(self.not_found());
        };
        let mut filter = self.base_filter();
        filter.where_eq(group.column, parent_id);
        self.ordered(&mut filter, self.table.order_by);
        Ok(fetch_json_rows(&self.pool, &filter.to_sql()).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Value, ServiceError> {
        let mut filter = self.base_filter();
        filter.where_eq(&self.table.qualified_id(), id);
        fetch_json_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| self.not_found())
    }

    pub async fn exists(&self, check: &ExistenceCheck) -> Result<bool, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.key_taken(&mut conn, &check.values, check.exclude_id).await
    }

    /// `{id, descricao}` options ordered by id
    pub async fn options(&self) -> Result<Vec<ReferenceOption>, ServiceError> {
        let mut filter = Filter::new(format!("{} {}", self.table.table, MAIN_ALIAS));
        filter
            .select(format!("{}.{} AS id, {}.descricao", MAIN_ALIAS, self.table.id_column, MAIN_ALIAS))
            .order(FilterOrderInfo::asc(self.table.qualified_id()));
        Ok(fetch_typed::<_, ReferenceOption>(&self.pool, &filter.to_sql()).await?)
    }

    pub async fn create(&self, body: &Value) -> Result<Value, ServiceError> {
        let id = self.write(None, body).await?;
        self.get(id).await
    }

    pub async fn update(&self, id: i64, body: &Value) -> Result<Value, ServiceError> {
        self.write(Some(id), body).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let sql = format!("DELETE FROM {} WHERE {} = $1", self.table.table, self.table.id_column);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_delete_error(e, self.table.label))?;

        if result.rows_affected() == 0 {
            return Err(self.not_found());
        }
        info!("Deleted {} {}", self.table.resource, id);
        Ok(())
    }

    async fn write(&self, id: Option<i64>, body: &Value) -> Result<i64, ServiceError> {
        let record = validate_record(self.table, body)?;

        let mut tx = self.pool.begin().await?;
        lock_for_write(&mut tx, self.table.table).await?;

        if let Some(id) = id {
            let mut filter = Filter::new(format!("{} {}", self.table.table, MAIN_ALIAS));
            filter.select("1").where_eq(&self.table.qualified_id(), id);
            if !fetch_exists(&mut *tx, &filter.to_sql()).await? {
                return Err(self.not_found());
            }
        }

        for key in self.table.unique_keys {
            let values: Vec<(&'static LookupField, Value)> = key
                .params
                .iter()
                .filter_map(|(_, column)| {
                    let field = self.table.field(column)?;
                    Some((field, record.value(column)?.clone()))
                })
                .collect();
            if self.key_taken(&mut tx, &values, id).await? {
                debug!("{} rejected: {}", self.table.resource, key.message);
                return Err(ServiceError::conflict(key.message));
            }
        }

        for (field, value) in record.values() {
            let FieldKind::Reference(reference) = &field.kind else {
                continue;
            };
            let mut filter = Filter::new(reference.table);
            filter.select("1").where_eq(reference.id_column, value.clone());
            if !fetch_exists(&mut *tx, &filter.to_sql()).await? {
                return Err(ServiceError::Validation {
                    message: reference.missing_message.to_string(),
                    field_errors: Some(HashMap::from([(
                        field.column.to_string(),
                        reference.missing_message.to_string(),
                    )])),
                });
            }
        }

        let columns: Vec<&str> = record.values().iter().map(|(f, _)| f.column).collect();
        let stored_id = match id {
            None => {
                let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                    self.table.table,
                    columns.join(", "),
                    placeholders.join(", "),
                    self.table.id_column
                );
                let mut q = sqlx::query(&sql);
                for (_, value) in record.values() {
                    q = bind_param_query(q, value);
                }
                let row = q.fetch_one(&mut *tx).await?;
                row.try_get::<i64, _>(0)?
            }
            Some(id) => {
                let assignments: Vec<String> = columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!("{} = ${}", c, i + 1))
                    .collect();
                let sql = format!(
                    "UPDATE {} SET {} WHERE {} = ${}",
                    self.table.table,
                    assignments.join(", "),
                    self.table.id_column,
                    columns.len() + 1
                );
                let mut q = sqlx::query(&sql);
                for (_, value) in record.values() {
                    q = bind_param_query(q, value);
                }
                let result = q.bind(id).execute(&mut *tx).await?;
                if result.rows_affected() == 0 {
                    return Err(self.not_found());
                }
                id
            }
        };

        tx.commit().await?;
        info!(
            "{} {} {}",
            if id.is_some() { "Updated" } else { "Created" },
            self.table.resource,
            stored_id
        );
        Ok(stored_id)
    }

    /// Text compares case-insensitively; codes and references exactly
    async fn key_taken(
        &self,
        conn: &mut PgConnection,
        values: &[(&'static LookupField, Value)],
        exclude_id: Option<i64>,
    ) -> Result<bool, ServiceError> {
        if values.is_empty() {
            return Ok(false);
        }
        let mut filter = Filter::new(format!("{} {}", self.table.table, MAIN_ALIAS));
        filter.select("1");
        for (field, value) in values {
            let column = format!("{}.{}", MAIN_ALIAS, field.column);
            match field.kind {
                FieldKind::Text => filter.where_eq_ignore_case(&column, value.clone()),
                FieldKind::Code | FieldKind::Reference(_) => filter.where_eq(&column, value.clone()),
            };
        }
        if let Some(id) = exclude_id {
            filter.where_ne(&self.table.qualified_id(), id);
        }
        Ok(fetch_exists(conn, &filter.to_sql()).await?)
    }
}
