// handlers/lookup.rs - /api/<resource> handlers shared by every reference table
//
// The table descriptor arrives as an Extension installed on the nested router,
// so one set of handlers serves all of them.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde_json::{json, Value};

use super::utils::{json_body, page_request, param, path_id};
use crate::database::models::LookupTable;
use crate::filter::Paginated;
use crate::middleware::{ApiResponse, ApiResult, DbPool};
use crate::services::lookup_service::{existence_check, parse_filters, single_key_check, LookupService};

/// GET /api/<resource>
pub async fn list(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    let rows = LookupService::new(pool, table).list(param(&params, "search")).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/<resource>/paginated
pub async fn paginated(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    let page = page_request(param(&params, "page"), param(&params, "limit"))?;
    let filters = parse_filters(table, &params)?;
    let result = LookupService::new(pool, table)
        .list_paginated(page, param(&params, "search"), &filters)
        .await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/<resource>/check-existing
pub async fn check_existing(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Value> {
    let check = existence_check(table, &params)?;
    let exists = LookupService::new(pool, table).exists(&check).await?;
    Ok(ApiResponse::success(json!({ "exists": exists })))
}

/// Query param checked by a `/check-existing-<param>` route
#[derive(Debug, Clone, Copy)]
pub struct KeyParam(pub &'static str);

/// GET /api/<resource>/check-existing-<param>
pub async fn check_existing_key(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Extension(KeyParam(key)): Extension<KeyParam>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Value> {
    let check = single_key_check(table, key, &params)?;
    let exists = LookupService::new(pool, table).exists(&check).await?;
    Ok(ApiResponse::success(json!({ "exists": exists })))
}

/// GET /api/<resource>/:id
pub async fn show(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = path_id(&id)?;
    let row = LookupService::new(pool, table).get(id).await?;
    Ok(ApiResponse::success(row))
}

/// POST /api/<resource>
pub async fn create(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(payload)?;
    let row = LookupService::new(pool, table).create(&body).await?;
    Ok(ApiResponse::created(row))
}

/// PUT /api/<resource>/:id
pub async fn update(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let id = path_id(&id)?;
    let body = json_body(payload)?;
    let row = LookupService::new(pool, table).update(id, &body).await?;
    Ok(ApiResponse::success(row))
}

/// DELETE /api/<resource>/:id
pub async fn delete(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = path_id(&id)?;
    LookupService::new(pool, table).delete(id).await?;
    Ok(ApiResponse::success(json!({ "success": true })))
}

/// GET /api/<resource>/<group>/:parentId
pub async fn by_group(
    Extension(DbPool(pool)): Extension<DbPool>,
    Extension(table): Extension<&'static LookupTable>,
    Path(parent_id): Path<String>,
) -> ApiResult<Vec<Value>> {
    let parent_id = path_id(&parent_id)?;
    let rows = LookupService::new(pool, table).list_by_group(parent_id).await?;
    Ok(ApiResponse::success(rows))
}
