//! Descriptors for the reference tables served by the generic lookup CRUD.
//!
//! Every descriptor is a `static`, so all identifiers that end up in SQL are
//! compile-time constants. Client input only ever reaches the database as
//! bound parameters.

/// One reference table and everything the generic service needs to serve it
#[derive(Debug)]
pub struct LookupTable {
    /// Route segment under `/api`, also used in logs
    pub resource: &'static str,
    /// Display name used in messages ("Município")
    pub label: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
    pub fields: &'static [LookupField],
    pub joins: &'static [LookupJoin],
    /// Qualified columns (`t.descricao`, `c.descricao`) matched by `search`
    pub search_columns: &'static [&'static str],
    pub order_by: &'static str,
    pub unique_keys: &'static [UniqueKey],
    pub filters: &'static [QueryFilter],
    pub group: Option<GroupRoute>,
    /// Params of single-column keys that also get a `/check-existing-<param>` route
    pub key_checks: &'static [&'static str],
}

/// Alias of the main table in generated SQL
pub const MAIN_ALIAS: &str = "t";

#[derive(Debug)]
pub struct LookupField {
    pub column: &'static str,
    pub label: &'static str,
    pub max_len: Option<usize>,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub enum FieldKind {
    Text,
    /// Uppercased, restricted to `[A-Z0-9-]`
    Code,
    Reference(Reference),
}

#[derive(Debug)]
pub struct Reference {
    pub table: &'static str,
    pub id_column: &'static str,
    pub missing_message: &'static str,
}

/// LEFT JOIN used to expose a display column of a referenced table
#[derive(Debug)]
pub struct LookupJoin {
    pub table: &'static str,
    pub alias: &'static str,
    pub local_column: &'static str,
    pub foreign_column: &'static str,
    /// `(column, output alias)` pairs
    pub columns: &'static [(&'static str, &'static str)],
}

/// Natural key: `(query param, column)` pairs checked together
#[derive(Debug)]
pub struct UniqueKey {
    pub params: &'static [(&'static str, &'static str)],
    pub message: &'static str,
}

/// Optional equality filter accepted by `/paginated`
#[derive(Debug)]
pub struct QueryFilter {
    pub param: &'static str,
    pub column: &'static str,
}

/// Extra `/<segment>/:parent_id` listing route
#[derive(Debug)]
pub struct GroupRoute {
    pub segment: &'static str,
    pub column: &'static str,
}

impl LookupTable {
    pub fn field(&self, column: &str) -> Option<&'static LookupField> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// The unique key made of `param` alone
    pub fn single_key(&self, param: &str) -> Option<&'static UniqueKey> {
        self.unique_keys
            .iter()
            .find(|key| matches!(key.params, [(p, _)] if *p == param))
    }

    pub fn qualified_id(&self) -> String {
        format!("{}.{}", MAIN_ALIAS, self.id_column)
    }

    /// `FROM` clause: main table plus its display joins
    pub fn source(&self) -> String {
        let mut source = format!("{} {}", self.table, MAIN_ALIAS);
        for join in self.joins {
            source.push_str(&format!(
                " LEFT JOIN {table} {alias} ON {alias}.{foreign} = {main}.{local}",
                table = join.table,
                alias = join.alias,
                foreign = join.foreign_column,
                main = MAIN_ALIAS,
                local = join.local_column,
            ));
        }
        source
    }

    pub fn select_list(&self) -> String {
        let mut columns = vec![format!("{}.*", MAIN_ALIAS)];
        for join in self.joins {
            for (column, alias) in join.columns {
                columns.push(format!("{}.{} AS {}", join.alias, column, alias));
            }
        }
        columns.join(", ")
    }

    /// Human list of accepted check-existing params, e.g. "codigo ou descricao e estadoId"
    pub fn unique_key_hint(&self) -> String {
        self.unique_keys
            .iter()
            .map(|key| key.params.iter().map(|(p, _)| *p).collect::<Vec<_>>().join(" e "))
            .collect::<Vec<_>>()
            .join(" ou ")
    }
}

#[cfg(test)]
mod tests {
    use crate::database::models::tables;

    #[test]
    fn municipio_source_joins_estado() {
        assert_eq!(
            tables::MUNICIPIOS.source(),
            "tipo_municipio t LEFT JOIN tipo_estado e ON e.idtipo_estado = t.tipo_estado_idtipo_estado"
        );
        assert_eq!(tables::MUNICIPIOS.select_list(), "t.*, e.descricao AS estado_descricao");
        assert_eq!(tables::MUNICIPIOS.unique_key_hint(), "codigo ou descricao e estadoId");
    }

    #[test]
    fn plain_table_has_no_joins() {
        assert_eq!(tables::PAISES.source(), "tipo_pais t");
        assert_eq!(tables::PAISES.select_list(), "t.*");
        assert_eq!(tables::PAISES.qualified_id(), "t.idtipo_pais");
    }

    #[test]
    fn single_key_skips_composite_keys() {
        assert!(tables::MUNICIPIOS.single_key("codigo").is_some());
        assert!(tables::MUNICIPIOS.single_key("descricao").is_none());
        assert!(tables::HABILITACOES.single_key("descricao").is_some());
    }
}
