use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Executor, FromRow, PgConnection, Postgres, Row};

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;

/// Run a built SELECT and return each row as a JSON object (via `row_to_json`)
pub async fn fetch_json_rows<'c, E>(executor: E, sql: &SqlResult) -> Result<Vec<Value>, DatabaseError>
where
    E: Executor<'c, Database = Postgres>,
{
    let wrapped = format!("SELECT row_to_json(q) AS row FROM ({}) q", sql.query);
    let mut q = sqlx::query(&wrapped);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    let rows = q.fetch_all(executor).await?;
    rows.iter()
        .map(|row| row.try_get::<Value, _>("row").map_err(DatabaseError::from))
        .collect()
}

pub async fn fetch_json_optional<'c, E>(
    executor: E,
    sql: &SqlResult,
) -> Result<Option<Value>, DatabaseError>
where
    E: Executor<'c, Database = Postgres>,
{
    Ok(fetch_json_rows(executor, sql).await?.into_iter().next())
}

pub async fn fetch_typed<'c, E, T>(executor: E, sql: &SqlResult) -> Result<Vec<T>, DatabaseError>
where
    E: Executor<'c, Database = Postgres>,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_all(executor).await?)
}

pub async fn fetch_count<'c, E>(executor: E, sql: &SqlResult) -> Result<i64, DatabaseError>
where
    E: Executor<'c, Database = Postgres>,
{
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(executor).await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

/// `SELECT 1 ... LIMIT 1` existence check over a built statement
pub async fn fetch_exists<'c, E>(executor: E, sql: &SqlResult) -> Result<bool, DatabaseError>
where
    E: Executor<'c, Database = Postgres>,
{
    let wrapped = format!("SELECT EXISTS ({}) AS found", sql.query);
    let mut q = sqlx::query(&wrapped);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(executor).await?;
    let found: bool = row.try_get("found")?;
    Ok(found)
}

/// Serialize writers of one table until the surrounding transaction ends,
/// so a duplicate check and the write that follows it cannot interleave
/// with another writer.
pub async fn lock_for_write(conn: &mut PgConnection, key: &str) -> Result<(), DatabaseError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

pub fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
