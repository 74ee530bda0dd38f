use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `estabelecimento` joined with the descriptions of its type, nature and shift
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EstabelecimentoRow {
    pub idestabelecimento: i64,
    pub codigo_unidade: Option<String>,
    pub nome: String,
    pub cnes: Option<String>,
    pub cnpj: Option<String>,
    pub cidade: Option<String>,
    pub logradouro: Option<String>,
    pub bairro: Option<String>,
    pub numero: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub tipo_estabelecimento_idtipo_estabelecimento: i64,
    pub tipo_natureza_idtipo_natureza: i64,
    pub tipo_turno_idtipo_turno: Option<i64>,
    pub ativo: String,
    pub tipo_estabelecimento_descricao: Option<String>,
    pub tipo_natureza_descricao: Option<String>,
    pub tipo_turno_descricao: Option<String>,
}

pub const JOINED_SOURCE: &str = "estabelecimento e \
    LEFT JOIN tipo_estabelecimento te ON te.idtipo_estabelecimento = e.tipo_estabelecimento_idtipo_estabelecimento \
    LEFT JOIN tipo_natureza tn ON tn.idtipo_natureza = e.tipo_natureza_idtipo_natureza \
    LEFT JOIN tipo_turno tt ON tt.idtipo_turno = e.tipo_turno_idtipo_turno";

pub const JOINED_SELECT: &str = "e.*, \
    te.descricao AS tipo_estabelecimento_descricao, \
    tn.descricao AS tipo_natureza_descricao, \
    tt.descricao AS tipo_turno_descricao";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabilitacaoResumo {
    pub tipo_habilitacao_idtipo_habilitacao: i64,
    pub descricao: String,
}

/// Detail view: joined row plus both association sets
#[derive(Debug, Clone, Serialize)]
pub struct EstabelecimentoDetail {
    #[serde(flatten)]
    pub row: EstabelecimentoRow,
    pub habilitacoes: Vec<HabilitacaoResumo>,
    pub qualificacoes: Vec<i64>,
}

/// Dropdown entry for the reference tables
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferenceOption {
    pub id: i64,
    pub descricao: String,
}
