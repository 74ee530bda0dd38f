use super::lookup::{
    FieldKind, GroupRoute, LookupField, LookupJoin, LookupTable, QueryFilter, Reference, UniqueKey,
};

const DESCRICAO_KEY: &[(&str, &str)] = &[("descricao", "descricao")];
const CODIGO_KEY: &[(&str, &str)] = &[("codigo", "codigo")];
const NO_JOINS: &[LookupJoin] = &[];
const NO_FILTERS: &[QueryFilter] = &[];
const NO_KEY_CHECKS: &[&str] = &[];
const DESCRICAO_SEARCH: &[&str] = &["t.descricao"];
const CODIGO_DESCRICAO_SEARCH: &[&str] = &["t.codigo", "t.descricao"];

const fn descricao(max_len: usize) -> LookupField {
    LookupField { column: "descricao", label: "Descrição", max_len: Some(max_len), kind: FieldKind::Text }
}

const fn codigo(max_len: usize) -> LookupField {
    LookupField { column: "codigo", label: "Código", max_len: Some(max_len), kind: FieldKind::Text }
}

pub static TIPOS_ESTABELECIMENTO: LookupTable = LookupTable {
    resource: "tipo-estabelecimento",
    label: "Tipo de estabelecimento",
    table: "tipo_estabelecimento",
    id_column: "idtipo_estabelecimento",
    fields: &[descricao(100)],
    joins: NO_JOINS,
    search_columns: DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[UniqueKey {
        params: DESCRICAO_KEY,
        message: "Já existe um tipo de estabelecimento com esta descrição",
    }],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static NATUREZAS: LookupTable = LookupTable {
    resource: "natureza",
    label: "Natureza",
    table: "tipo_natureza",
    id_column: "idtipo_natureza",
    fields: &[descricao(100)],
    joins: NO_JOINS,
    search_columns: DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[UniqueKey { params: DESCRICAO_KEY, message: "Já existe uma natureza com esta descrição" }],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static TURNOS: LookupTable = LookupTable {
    resource: "turnos",
    label: "Turno",
    table: "tipo_turno",
    id_column: "idtipo_turno",
    fields: &[descricao(100)],
    joins: NO_JOINS,
    search_columns: DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[UniqueKey { params: DESCRICAO_KEY, message: "Já existe um turno com esta descrição" }],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static COMPONENTES: LookupTable = LookupTable {
    resource: "componentes",
    label: "Componente",
    table: "componente",
    id_column: "idcomponente",
    fields: &[descricao(100)],
    joins: NO_JOINS,
    search_columns: DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[UniqueKey { params: DESCRICAO_KEY, message: "Já existe um componente com esta descrição" }],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static HABILITACOES: LookupTable = LookupTable {
    resource: "tipo-habilitacao",
    label: "Habilitação",
    table: "tipo_habilitacao",
    id_column: "idtipo_habilitacao",
    fields: &[
        LookupField { column: "codigo", label: "Código", max_len: Some(20), kind: FieldKind::Code },
        descricao(150),
    ],
    joins: NO_JOINS,
    search_columns: CODIGO_DESCRICAO_SEARCH,
    order_by: "t.codigo",
    unique_keys: &[
        UniqueKey { params: CODIGO_KEY, message: "Já existe uma habilitação com este código" },
        UniqueKey { params: DESCRICAO_KEY, message: "Já existe uma habilitação com esta descrição" },
    ],
    filters: NO_FILTERS,
    group: None,
    key_checks: &["codigo", "descricao"],
};

pub static QUALIFICACOES: LookupTable = LookupTable {
    resource: "tipo-qualificacao",
    label: "Qualificação",
    table: "tipo_qualificacao",
    id_column: "idtipo_qualificacao",
    fields: &[
        descricao(150),
        LookupField {
            column: "componente_idcomponente",
            label: "Componente",
            max_len: None,
            kind: FieldKind::Reference(Reference {
                table: "componente",
                id_column: "idcomponente",
                missing_message: "Componente não encontrado",
            }),
        },
    ],
    joins: &[LookupJoin {
        table: "componente",
        alias: "c",
        local_column: "componente_idcomponente",
        foreign_column: "idcomponente",
        columns: &[("descricao", "componente_descricao")],
    }],
    search_columns: &["t.descricao", "c.descricao"],
    order_by: "t.descricao",
    unique_keys: &[UniqueKey {
        params: &[("descricao", "descricao"), ("idcomponente", "componente_idcomponente")],
        message: "Já existe uma qualificação com esta descrição para o componente",
    }],
    filters: &[QueryFilter { param: "idcomponente", column: "t.componente_idcomponente" }],
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static ESTADOS: LookupTable = LookupTable {
    resource: "estados",
    label: "Estado",
    table: "tipo_estado",
    id_column: "idtipo_estado",
    fields: &[codigo(5), descricao(45)],
    joins: NO_JOINS,
    search_columns: CODIGO_DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[
        UniqueKey { params: CODIGO_KEY, message: "Já existe um estado com este código" },
        UniqueKey { params: DESCRICAO_KEY, message: "Já existe um estado com esta descrição" },
    ],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static MUNICIPIOS: LookupTable = LookupTable {
    resource: "municipios",
    label: "Município",
    table: "tipo_municipio",
    id_column: "idtipo_municipio",
    fields: &[
        codigo(10),
        descricao(60),
        LookupField {
            column: "tipo_estado_idtipo_estado",
            label: "Estado",
            max_len: None,
            kind: FieldKind::Reference(Reference {
                table: "tipo_estado",
                id_column: "idtipo_estado",
                missing_message: "Estado não encontrado",
            }),
        },
    ],
    joins: &[LookupJoin {
        table: "tipo_estado",
        alias: "e",
        local_column: "tipo_estado_idtipo_estado",
        foreign_column: "idtipo_estado",
        columns: &[("descricao", "estado_descricao")],
    }],
    search_columns: CODIGO_DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[
        UniqueKey { params: CODIGO_KEY, message: "Já existe um município com este código" },
        UniqueKey {
            params: &[("descricao", "descricao"), ("estadoId", "tipo_estado_idtipo_estado")],
            message: "Já existe um município com esta descrição neste estado",
        },
    ],
    filters: &[QueryFilter { param: "tipo_estado", column: "t.tipo_estado_idtipo_estado" }],
    group: Some(GroupRoute { segment: "by-estado", column: "t.tipo_estado_idtipo_estado" }),
    key_checks: NO_KEY_CHECKS,
};

pub static PAISES: LookupTable = LookupTable {
    resource: "paises",
    label: "País",
    table: "tipo_pais",
    id_column: "idtipo_pais",
    fields: &[descricao(50)],
    joins: NO_JOINS,
    search_columns: DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[UniqueKey { params: DESCRICAO_KEY, message: "Já existe um país com esta descrição" }],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static RACAS: LookupTable = LookupTable {
    resource: "racas",
    label: "Raça",
    table: "tipo_raca",
    id_column: "idtipo_raca",
    fields: &[descricao(15)],
    joins: NO_JOINS,
    search_columns: DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[UniqueKey { params: DESCRICAO_KEY, message: "Já existe uma raça com esta descrição" }],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static ESCOLARIDADES: LookupTable = LookupTable {
    resource: "escolaridades",
    label: "Escolaridade",
    table: "tipo_escolaridade",
    id_column: "idescolaridade",
    fields: &[descricao(60)],
    joins: NO_JOINS,
    search_columns: DESCRICAO_SEARCH,
    order_by: "t.descricao",
    unique_keys: &[UniqueKey { params: DESCRICAO_KEY, message: "Já existe uma escolaridade com esta descrição" }],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

pub static CBO: LookupTable = LookupTable {
    resource: "cbo",
    label: "CBO",
    table: "tipo_cbo",
    id_column: "idtipo_cbo",
    fields: &[codigo(15), descricao(100)],
    joins: NO_JOINS,
    search_columns: CODIGO_DESCRICAO_SEARCH,
    order_by: "t.codigo",
    unique_keys: &[
        UniqueKey { params: CODIGO_KEY, message: "Já existe um CBO com este código" },
        UniqueKey { params: DESCRICAO_KEY, message: "Já existe um CBO com esta descrição" },
    ],
    filters: NO_FILTERS,
    group: None,
    key_checks: NO_KEY_CHECKS,
};

/// Every reference table mounted under `/api/<resource>`
pub static ALL: &[&LookupTable] = &[
    &TIPOS_ESTABELECIMENTO,
    &NATUREZAS,
    &TURNOS,
    &COMPONENTES,
    &HABILITACOES,
    &QUALIFICACOES,
    &ESTADOS,
    &MUNICIPIOS,
    &PAISES,
    &RACAS,
    &ESCOLARIDADES,
    &CBO,
];
