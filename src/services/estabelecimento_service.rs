use std::collections::BTreeSet;

use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, info, warn};

use crate::database::models::estabelecimento::{JOINED_SELECT, JOINED_SOURCE};
use crate::database::models::lookup::LookupTable;
use crate::database::models::{EstabelecimentoDetail, EstabelecimentoRow, ReferenceOption};
use crate::database::query_builder::{fetch_count, fetch_exists, fetch_typed, lock_for_write};
use crate::filter::{Filter, FilterOrder, FilterOrderInfo, PageRequest, Paginated};
use crate::services::associations::{attach_associations, Association, HABILITACOES, QUALIFICACOES};
use crate::services::error::{map_delete_error, ServiceError};
use crate::services::estabelecimento_input::{DuplicateField, EstabelecimentoInput, EstabelecimentoRecord};
use crate::services::lookup_service::LookupService;

/// Client sort keys and the columns they order by
pub const SORTABLE_COLUMNS: &[(&str, &str)] = &[
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
];

const SEARCH_COLUMNS: &[&str] = &["e.nome", "e.cnes", "e.cnpj"];
const ID_COLUMN: &str = "e.idestabelecimento";
const LOCK_KEY: &str = "estabelecimento";

/// `sortKey` used by the paginated listings when the client sends none
pub const DEFAULT_SORT_KEY: &str = "idestabelecimento";

/// Resolve `sortKey`/`sortOrder` against a `(key, column)` whitelist,
/// always tie-breaking on the id
pub fn sort_order(
    sortable: &[(&str, &str)],
    default_key: &str,
    sort_key: Option<&str>,
    sort_order: Option<&str>,
) -> Result<Vec<FilterOrderInfo>, ServiceError> {
    let keys: Vec<&str> = sortable.iter().map(|(key, _)| *key).collect();
    let resolved = FilterOrder::resolve(sort_key, sort_order, &keys, default_key)
        .map_err(|e| ServiceError::validation(e.to_string()))?;
    let column = sortable
        .iter()
        .find(|(key, _)| *key == resolved.column)
        .map(|(_, column)| *column)
        .unwrap_or(ID_COLUMN);

    let mut order = vec![FilterOrderInfo { column: column.to_string(), sort: resolved.sort }];
    if column != ID_COLUMN {
        order.push(FilterOrderInfo { column: ID_COLUMN.to_string(), sort: resolved.sort });
    }
    Ok(order)
}

pub struct EstabelecimentoService {
    pool: PgPool,
}

impl EstabelecimentoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found() -> ServiceError {
        ServiceError::not_found("Estabelecimento não encontrado")
    }

    fn joined() -> Filter {
        let mut filter = Filter::new(JOINED_SOURCE);
        filter.select(JOINED_SELECT);
        filter
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<EstabelecimentoRow>, ServiceError> {
        let mut filter = Self::joined();
        filter
            .search(SEARCH_COLUMNS, search)
            .order(FilterOrderInfo::asc("e.nome"))
            .order(FilterOrderInfo::asc(ID_COLUMN));
        Ok(fetch_typed::<_, EstabelecimentoRow>(&self.pool, &filter.to_sql()).await?)
    }

    pub async fn list_paginated(
        &self,
        page: PageRequest,
        search: Option<&str>,
        sort_key: Option<&str>,
        sort_direction: Option<&str>,
    ) -> Result<Paginated<EstabelecimentoRow>, ServiceError> {
        let order = sort_order(SORTABLE_COLUMNS, DEFAULT_SORT_KEY, sort_key, sort_direction)?;

        let mut filter = Self::joined();
        filter.search(SEARCH_COLUMNS, search);
        for info in order {
            filter.order(info);
        }
        filter.page(&page);

        let count_sql = filter.to_count_sql();
        let sql = filter.to_sql();
        let (total, data) = futures::try_join!(
            fetch_count(&self.pool, &count_sql),
            fetch_typed::<_, EstabelecimentoRow>(&self.pool, &sql)
        )?;

        Ok(Paginated::new(data, total, page))
    }

    pub async fn get(&self, id: i64) -> Result<EstabelecimentoDetail, ServiceError> {
        let mut filter = Self::joined();
        filter.where_eq(ID_COLUMN, id);
        let rows = fetch_typed::<_, EstabelecimentoRow>(&self.pool, &filter.to_sql()).await?;
        attach_associations(&self.pool, rows)
            .await?
            .into_iter()
            .next()
            .ok_or_else(Self::not_found)
    }

    pub async fn create(&self, input: EstabelecimentoInput) -> Result<EstabelecimentoDetail, ServiceError> {
        let id = self.write(None, input).await?;
        self.get(id).await
    }

    pub async fn update(&self, id: i64, input: EstabelecimentoInput) -> Result<EstabelecimentoDetail, ServiceError> {
        self.write(Some(id), input).await?;
        self.get(id).await
    }

    /// Junction rows go first, then the parent, in one transaction
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;
        lock_for_write(&mut tx, LOCK_KEY).await?;

        let qualificacoes = QUALIFICACOES.clear(&mut tx, id).await?;
        let habilitacoes = HABILITACOES.clear(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM estabelecimento WHERE idestabelecimento = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_delete_error(e, "Estabelecimento"))?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found());
        }

        tx.commit().await?;
        info!(
            "Deleted estabelecimento {} ({} qualificacoes, {} habilitacoes)",
            id, qualificacoes, habilitacoes
        );
        Ok(())
    }

    /// Whether another establishment already holds `value` in `field`
    pub async fn is_duplicate(
        &self,
        field: DuplicateField,
        value: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ServiceError::validation("Informe o valor a verificar"));
        }
        let mut conn = self.pool.acquire().await?;
        duplicate_taken(&mut conn, field, value, exclude_id).await
    }

    pub async fn reference_options(&self, table: &'static LookupTable) -> Result<Vec<ReferenceOption>, ServiceError> {
        LookupService::new(self.pool.clone(), table).options().await
    }

    async fn write(&self, id: Option<i64>, input: EstabelecimentoInput) -> Result<i64, ServiceError> {
        let record = input.validate()?;

        let mut tx = self.pool.begin().await?;
        lock_for_write(&mut tx, LOCK_KEY).await?;

        if let Some(id) = id {
            let mut filter = Filter::new("estabelecimento e");
            filter.select("1").where_eq(ID_COLUMN, id);
            if !fetch_exists(&mut *tx, &filter.to_sql()).await? {
                return Err(Self::not_found());
            }
        }

        for field in DuplicateField::CHECK_ORDER {
            let Some(value) = record.unique_value(field) else {
                continue;
            };
            if duplicate_taken(&mut tx, field, value, id).await? {
                warn!("Rejected estabelecimento write: duplicate {}", field.column());
                return Err(duplicate_conflict(field));
            }
        }

        check_reference(
            &mut tx,
            "tipo_estabelecimento",
            "idtipo_estabelecimento",
            record.tipo_estabelecimento,
            "Tipo de estabelecimento não encontrado",
        )
        .await?;
        check_reference(
            &mut tx,
            "tipo_natureza",
            "idtipo_natureza",
            record.tipo_natureza,
            "Tipo de natureza não encontrado",
        )
        .await?;
        if let Some(turno) = record.tipo_turno {
            check_reference(&mut tx, "tipo_turno", "idtipo_turno", turno, "Tipo de turno não encontrado").await?;
        }
        check_targets(&mut tx, &QUALIFICACOES, &record.qualificacoes).await?;
        check_targets(&mut tx, &HABILITACOES, &record.habilitacoes).await?;

        let stored_id = match id {
            None => insert_row(&mut tx, &record).await?,
            Some(id) => {
                if !update_row(&mut tx, id, &record).await? {
                    return Err(Self::not_found());
                }
                id
            }
        };

        QUALIFICACOES.reconcile(&mut tx, stored_id, &record.qualificacoes).await?;
        HABILITACOES.reconcile(&mut tx, stored_id, &record.habilitacoes).await?;

        tx.commit().await?;
        info!(
            "{} estabelecimento {}",
            if id.is_some() { "Updated" } else { "Created" },
            stored_id
        );
        Ok(stored_id)
    }
}

async fn duplicate_taken(
    conn: &mut PgConnection,
    field: DuplicateField,
    value: &str,
    exclude_id: Option<i64>,
) -> Result<bool, ServiceError> {
    let mut filter = Filter::new("estabelecimento e");
    filter
        .select("1")
        .where_eq(&format!("e.{}", field.column()), value);
    if let Some(id) = exclude_id {
        filter.where_ne(ID_COLUMN, id);
    }
    Ok(fetch_exists(conn, &filter.to_sql()).await?)
}

async fn check_reference(
    conn: &mut PgConnection,
    table: &str,
    id_column: &str,
    id: i64,
    message: &str,
) -> Result<(), ServiceError> {
    let mut filter = Filter::new(table);
    filter.select("1").where_eq(id_column, id);
    if fetch_exists(conn, &filter.to_sql()).await? {
        Ok(())
    } else {
        debug!("Missing {} {}", table, id);
        Err(ServiceError::validation(message))
    }
}

async fn check_targets(
    conn: &mut PgConnection,
    association: &Association,
    wanted: &BTreeSet<i64>,
) -> Result<(), ServiceError> {
    let missing = association.missing_targets(conn, wanted).await?;
    if missing.is_empty() {
        return Ok(());
    }
    Err(missing_targets_error(association, &missing))
}

fn duplicate_conflict(field: DuplicateField) -> ServiceError {
    ServiceError::conflict(format!("{} já cadastrado em outro estabelecimento", field.label()))
}

fn missing_targets_error(association: &Association, missing: &[i64]) -> ServiceError {
    let ids: Vec<String> = missing.iter().map(i64::to_string).collect();
    ServiceError::validation(format!("{} não encontrada: {}", association.label, ids.join(", ")))
}

const INSERT_SQL: &str = "INSERT INTO estabelecimento (\
    codigo_unidade, nome, cnes, cnpj, cidade, logradouro, bairro, numero, latitude, longitude, \
    tipo_estabelecimento_idtipo_estabelecimento, tipo_natureza_idtipo_natureza, tipo_turno_idtipo_turno, ativo\
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING idestabelecimento";

const UPDATE_SQL: &str = "UPDATE estabelecimento SET \
    codigo_unidade = $1, nome = $2, cnes = $3, cnpj = $4, cidade = $5, logradouro = $6, bairro = $7, \
    numero = $8, latitude = $9, longitude = $10, tipo_estabelecimento_idtipo_estabelecimento = $11, \
    tipo_natureza_idtipo_natureza = $12, tipo_turno_idtipo_turno = $13, ativo = $14 \
    WHERE idestabelecimento = $15";

async fn insert_row(conn: &mut PgConnection, record: &EstabelecimentoRecord) -> Result<i64, ServiceError> {
    let row = bind_record(sqlx::query(INSERT_SQL), record).fetch_one(conn).await?;
    Ok(row.try_get::<i64, _>("idestabelecimento")?)
}

async fn update_row(conn: &mut PgConnection, id: i64, record: &EstabelecimentoRecord) -> Result<bool, ServiceError> {
    let result = bind_record(sqlx::query(UPDATE_SQL), record)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn bind_record<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    record: &'q EstabelecimentoRecord,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    q.bind(record.codigo_unidade.as_deref())
        .bind(record.nome.as_str())
        .bind(record.cnes.as_deref())
        .bind(record.cnpj.as_deref())
        .bind(record.cidade.as_deref())
        .bind(record.logradouro.as_deref())
        .bind(record.bairro.as_deref())
        .bind(record.numero.as_deref())
        .bind(record.latitude.as_deref())
        .bind(record.longitude.as_deref())
        .bind(record.tipo_estabelecimento)
        .bind(record.tipo_natureza)
        .bind(record.tipo_turno)
        .bind(record.ativo.as_str())
}
