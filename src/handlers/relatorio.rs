// handlers/relatorio.rs - /api/estabelecimentos-relatorio handlers (read-only)

use axum::extract::{Extension, Query};

use super::estabelecimento::{ListQuery, PaginatedQuery};
use super::utils::page_request;
use crate::database::models::EstabelecimentoDetail;
use crate::filter::Paginated;
use crate::middleware::{ApiResponse, ApiResult, DbPool};
use crate::services::relatorio_service::RelatorioService;

/// GET /api/estabelecimentos-relatorio
pub async fn list(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<EstabelecimentoDetail>> {
    let rows = RelatorioService::new(pool).list(query.search.as_deref()).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/estabelecimentos-relatorio/paginated
pub async fn paginated(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<PaginatedQuery>,
) -> ApiResult<Paginated<EstabelecimentoDetail>> {
    let page = page_request(query.page.as_deref(), query.limit.as_deref())?;
    let result = RelatorioService::new(pool)
        .paginated(
            page,
            query.search.as_deref(),
            query.sort_key.as_deref(),
            query.sort_order.as_deref(),
        )
        .await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/estabelecimentos-relatorio/export
pub async fn export(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<EstabelecimentoDetail>> {
    let rows = RelatorioService::new(pool).export(query.search.as_deref()).await?;
    Ok(ApiResponse::success(rows))
}
