use sqlx::PgPool;
use tracing::info;

use crate::database::models::estabelecimento::{JOINED_SELECT, JOINED_SOURCE};
use crate::database::models::{EstabelecimentoDetail, EstabelecimentoRow};
use crate::database::query_builder::{fetch_count, fetch_typed};
use crate::filter::{Filter, FilterOrderInfo, PageRequest, Paginated};
use crate::services::associations::attach_associations;
use crate::services::error::ServiceError;
use crate::services::estabelecimento_service::{sort_order, DEFAULT_SORT_KEY};

pub const REPORT_SORTABLE_COLUMNS: &[(&str, &str)] = &[
    ("idestabelecimento", "e.idestabelecimento"),
    ("codigo_unidade", "e.codigo_unidade"),
    ("nome", "e.nome"),
    ("cnes", "e.cnes"),
    ("cnpj", "e.cnpj"),
    ("cidade", "e.cidade"),
    ("logradouro", "e.logradouro"),
    ("bairro", "e.bairro"),
    ("numero", "e.numero"),
    ("ativo", "e.ativo"),
    ("latitude", "e.latitude"),
    ("longitude", "e.longitude"),
    ("tipo_estabelecimento_descricao", "te.descricao"),
    ("tipo_natureza_descricao", "tn.descricao"),
    ("tipo_turno_descricao", "tt.descricao"),
];

const SEARCH_COLUMNS: &[&str] = &["e.nome", "e.cidade", "e.cnes", "e.cnpj"];

/// Read-only establishment report with both association sets attached
pub struct RelatorioService {
    pool: PgPool,
}

impl RelatorioService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn filtered(search: Option<&str>) -> Filter {
        let mut filter = Filter::new(JOINED_SOURCE);
        filter.select(JOINED_SELECT).search(SEARCH_COLUMNS, search);
        filter
    }

    async fn by_name(&self, search: Option<&str>) -> Result<Vec<EstabelecimentoDetail>, ServiceError> {
        let mut filter = Self::filtered(search);
        filter
            .order(FilterOrderInfo::asc("e.nome"))
            .order(FilterOrderInfo::asc("e.idestabelecimento"));
        let rows = fetch_typed::<_, EstabelecimentoRow>(&self.pool, &filter.to_sql()).await?;
        Ok(attach_associations(&self.pool, rows).await?)
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<EstabelecimentoDetail>, ServiceError> {
        self.by_name(search).await
    }

    pub async fn paginated(
        &self,
        page: PageRequest,
        search: Option<&str>,
        sort_key: Option<&str>,
        sort_direction: Option<&str>,
    ) -> Result<Paginated<EstabelecimentoDetail>, ServiceError> {
        let order = sort_order(REPORT_SORTABLE_COLUMNS, DEFAULT_SORT_KEY, sort_key, sort_direction)?;

        let mut filter = Self::filtered(search);
        for info in order {
            filter.order(info);
        }
        filter.page(&page);

        let count_sql = filter.to_count_sql();
        let sql = filter.to_sql();
        let (total, rows) = futures::try_join!(
            fetch_count(&self.pool, &count_sql),
            fetch_typed::<_, EstabelecimentoRow>(&self.pool, &sql)
        )?;
        let data = attach_associations(&self.pool, rows).await?;

        Ok(Paginated::new(data, total, page))
    }

    pub async fn export(&self, search: Option<&str>) -> Result<Vec<EstabelecimentoDetail>, ServiceError> {
        let rows = self.by_name(search).await?;
        info!("Exported {} estabelecimentos", rows.len());
        Ok(rows)
    }
}
