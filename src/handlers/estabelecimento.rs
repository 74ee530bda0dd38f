// handlers/estabelecimento.rs - /api/estabelecimentos handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::{page_request, path_id, typed_body};
use crate::database::models::{tables, EstabelecimentoDetail, EstabelecimentoRow, LookupTable, ReferenceOption};
use crate::error::ApiError;
use crate::filter::Paginated;
use crate::middleware::{ApiResponse, ApiResult, DbPool};
use crate::services::estabelecimento_input::{DuplicateField, EstabelecimentoInput};
use crate::services::estabelecimento_service::EstabelecimentoService;
use crate::services::parse::{id_from_json, is_blank};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaginatedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "sortKey")]
    pub sort_key: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckDuplicateRequest {
    pub field: Option<String>,
    pub value: Option<Value>,
    #[serde(rename = "excludeId")]
    pub exclude_id: Option<Value>,
}

/// GET /api/estabelecimentos
pub async fn list(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<EstabelecimentoRow>> {
    let rows = EstabelecimentoService::new(pool).list(query.search.as_deref()).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/estabelecimentos/paginated
pub async fn paginated(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<PaginatedQuery>,
) -> ApiResult<Paginated<EstabelecimentoRow>> {
    let page = page_request(query.page.as_deref(), query.limit.as_deref())?;
    let result = EstabelecimentoService::new(pool)
        .list_paginated(
            page,
            query.search.as_deref(),
            query.sort_key.as_deref(),
            query.sort_order.as_deref(),
        )
        .await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/estabelecimentos/:id
pub async fn show(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> ApiResult<EstabelecimentoDetail> {
    let id = path_id(&id)?;
    let detail = EstabelecimentoService::new(pool).get(id).await?;
    Ok(ApiResponse::success(detail))
}

/// POST /api/estabelecimentos
pub async fn create(
    Extension(DbPool(pool)): Extension<DbPool>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<EstabelecimentoDetail> {
    let input: EstabelecimentoInput = typed_body(payload)?;
    let detail = EstabelecimentoService::new(pool).create(input).await?;
    Ok(ApiResponse::created(detail))
}

/// PUT /api/estabelecimentos/:id
pub async fn update(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<EstabelecimentoDetail> {
    let id = path_id(&id)?;
    let input: EstabelecimentoInput = typed_body(payload)?;
    let detail = EstabelecimentoService::new(pool).update(id, input).await?;
    Ok(ApiResponse::success(detail))
}

/// DELETE /api/estabelecimentos/:id
pub async fn delete(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = path_id(&id)?;
    EstabelecimentoService::new(pool).delete(id).await?;
    Ok(ApiResponse::success(json!({ "success": true })))
}

/// POST /api/estabelecimentos/check-duplicate
pub async fn check_duplicate(
    Extension(DbPool(pool)): Extension<DbPool>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let request: CheckDuplicateRequest = typed_body(payload)?;

    let field_name = request.field.unwrap_or_default();
    let field = DuplicateField::parse(&field_name)
        .ok_or_else(|| ApiError::bad_request("Campo inválido para verificação de duplicidade"))?;

    let value = match &request.value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if value.is_empty() {
        return Err(ApiError::bad_request("Informe o valor a verificar"));
    }

    let exclude_id = match request.exclude_id.as_ref() {
        raw if is_blank(raw) => None,
        Some(raw) => Some(id_from_json(raw).ok_or_else(|| ApiError::bad_request("excludeId inválido"))?),
        None => None,
    };

    let is_duplicate = EstabelecimentoService::new(pool)
        .is_duplicate(field, &value, exclude_id)
        .await?;
    Ok(ApiResponse::success(json!({
        "isDuplicate": is_duplicate,
        "field": field.column(),
    })))
}

async fn options(pool: sqlx::PgPool, table: &'static LookupTable) -> ApiResult<Vec<ReferenceOption>> {
    let options = EstabelecimentoService::new(pool).reference_options(table).await?;
    Ok(ApiResponse::success(options))
}

/// GET /api/estabelecimentos/tipo-estabelecimento
pub async fn tipos_estabelecimento(Extension(DbPool(pool)): Extension<DbPool>) -> ApiResult<Vec<ReferenceOption>> {
    options(pool, &tables::TIPOS_ESTABELECIMENTO).await
}

/// GET /api/estabelecimentos/natureza
pub async fn naturezas(Extension(DbPool(pool)): Extension<DbPool>) -> ApiResult<Vec<ReferenceOption>> {
    options(pool, &tables::NATUREZAS).await
}

/// GET /api/estabelecimentos/turnos
pub async fn turnos(Extension(DbPool(pool)): Extension<DbPool>) -> ApiResult<Vec<ReferenceOption>> {
    options(pool, &tables::TURNOS).await
}

/// GET /api/estabelecimentos/tipo-habilitacao
pub async fn habilitacoes(Extension(DbPool(pool)): Extension<DbPool>) -> ApiResult<Vec<ReferenceOption>> {
    options(pool, &tables::HABILITACOES).await
}

/// GET /api/estabelecimentos/tipo-qualificacao
pub async fn qualificacoes(Extension(DbPool(pool)): Extension<DbPool>) -> ApiResult<Vec<ReferenceOption>> {
    options(pool, &tables::QUALIFICACOES).await
}
