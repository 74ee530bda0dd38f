use std::collections::{BTreeSet, HashMap};

use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::models::{EstabelecimentoDetail, EstabelecimentoRow, HabilitacaoResumo};

/// Junction table between `estabelecimento` and one reference table
#[derive(Debug)]
pub struct Association {
    pub junction: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub target_table: &'static str,
    pub target_id_column: &'static str,
    pub label: &'static str,
}

pub static QUALIFICACOES: Association = Association {
    junction: "estabelecimento_has_tipo_qualificacao",
    owner_column: "estabelecimento_idestabelecimento",
    target_column: "tipo_qualificacao_idtipo_qualificacao",
    target_table: "tipo_qualificacao",
    target_id_column: "idtipo_qualificacao",
    label: "Qualificação",
};

pub static HABILITACOES: Association = Association {
    junction: "estabelecimento_has_tipo_habilitacao",
    owner_column: "estabelecimento_idestabelecimento",
    target_column: "tipo_habilitacao_idtipo_habilitacao",
    target_table: "tipo_habilitacao",
    target_id_column: "idtipo_habilitacao",
    label: "Habilitação",
};

/// Rows to insert and delete to turn `current` into `desired`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssociationDiff {
    pub added: Vec<i64>,
    pub removed: Vec<i64>,
}

impl AssociationDiff {
    pub fn between(current: &BTreeSet<i64>, desired: &BTreeSet<i64>) -> Self {
        Self {
            added: desired.difference(current).copied().collect(),
            removed: current.difference(desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl Association {
    pub async fn current(&self, conn: &mut PgConnection, owner: i64) -> Result<BTreeSet<i64>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            self.target_column, self.junction, self.owner_column
        );
        let ids: Vec<i64> = sqlx::query_scalar(&sql).bind(owner).fetch_all(conn).await?;
        Ok(ids.into_iter().collect())
    }

    /// Ids in `wanted` that have no row in the target table
    pub async fn missing_targets(
        &self,
        conn: &mut PgConnection,
        wanted: &BTreeSet<i64>,
    ) -> Result<Vec<i64>, DatabaseError> {
        if wanted.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = wanted.iter().copied().collect();
        let sql = format!(
            "SELECT {id} FROM {table} WHERE {id} = ANY($1)",
            id = self.target_id_column,
            table = self.target_table
        );
        let found: Vec<i64> = sqlx::query_scalar(&sql).bind(&ids[..]).fetch_all(conn).await?;
        let found: BTreeSet<i64> = found.into_iter().collect();
        Ok(wanted.difference(&found).copied().collect())
    }

    /// Apply the set difference between stored and desired rows
    pub async fn reconcile(
        &self,
        conn: &mut PgConnection,
        owner: i64,
        desired: &BTreeSet<i64>,
    ) -> Result<AssociationDiff, DatabaseError> {
        let current = self.current(&mut *conn, owner).await?;
        let diff = AssociationDiff::between(&current, desired);

        if !diff.removed.is_empty() {
            let sql = format!(
                "DELETE FROM {} WHERE {} = $1 AND {} = ANY($2)",
                self.junction, self.owner_column, self.target_column
            );
            sqlx::query(&sql)
                .bind(owner)
                .bind(&diff.removed[..])
                .execute(&mut *conn)
                .await?;
        }

        if !diff.added.is_empty() {
            let sql = format!(
                "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::bigint[])",
                self.junction, self.owner_column, self.target_column
            );
            sqlx::query(&sql)
                .bind(owner)
                .bind(&diff.added[..])
                .execute(&mut *conn)
                .await?;
        }

        debug!(
            "{} of estabelecimento {}: +{:?} -{:?}",
            self.junction, owner, diff.added, diff.removed
        );
        Ok(diff)
    }

    pub async fn clear(&self, conn: &mut PgConnection, owner: i64) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE {} = $1", self.junction, self.owner_column);
        let result = sqlx::query(&sql).bind(owner).execute(conn).await?;
        Ok(result.rows_affected())
    }
}

/// Load both association sets for many rows at once and build detail views
pub async fn attach_associations(
    pool: &PgPool,
    rows: Vec<EstabelecimentoRow>,
) -> Result<Vec<EstabelecimentoDetail>, DatabaseError> {
    if rows.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.idestabelecimento).collect();

    let habilitacoes_sql = "SELECT h.estabelecimento_idestabelecimento, h.tipo_habilitacao_idtipo_habilitacao, th.descricao \
        FROM estabelecimento_has_tipo_habilitacao h \
        JOIN tipo_habilitacao th ON th.idtipo_habilitacao = h.tipo_habilitacao_idtipo_habilitacao \
        WHERE h.estabelecimento_idestabelecimento = ANY($1) \
        ORDER BY th.descricao, th.idtipo_habilitacao";
    let qualificacoes_sql = "SELECT estabelecimento_idestabelecimento, tipo_qualificacao_idtipo_qualificacao \
        FROM estabelecimento_has_tipo_qualificacao \
        WHERE estabelecimento_idestabelecimento = ANY($1) \
        ORDER BY tipo_qualificacao_idtipo_qualificacao";

    let (habilitacoes, qualificacoes) = futures::try_join!(
        sqlx::query_as::<_, (i64, i64, String)>(habilitacoes_sql)
            .bind(&ids[..])
            .fetch_all(pool),
        sqlx::query_as::<_, (i64, i64)>(qualificacoes_sql)
            .bind(&ids[..])
            .fetch_all(pool)
    )?;

    let mut habilitacoes_by_owner: HashMap<i64, Vec<HabilitacaoResumo>> = HashMap::new();
    for (owner, id, descricao) in habilitacoes {
        habilitacoes_by_owner.entry(owner).or_default().push(HabilitacaoResumo {
            tipo_habilitacao_idtipo_habilitacao: id,
            descricao,
        });
    }

    let mut qualificacoes_by_owner: HashMap<i64, Vec<i64>> = HashMap::new();
    for (owner, id) in qualificacoes {
        qualificacoes_by_owner.entry(owner).or_default().push(id);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.idestabelecimento;
            EstabelecimentoDetail {
                row,
                habilitacoes: habilitacoes_by_owner.remove(&id).unwrap_or_default(),
                qualificacoes: qualificacoes_by_owner.remove(&id).unwrap_or_default(),
            }
        })
        .collect())
}
