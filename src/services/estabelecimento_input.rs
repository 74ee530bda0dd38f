use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::services::error::ServiceError;
use crate::services::parse::{id_from_json, is_blank};

/// Request body for create/update, as loosely typed as the clients send it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstabelecimentoInput {
    #[serde(default, deserialize_with = "lenient_text")]
    pub codigo_unidade: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cnes: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cnpj: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cidade: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub logradouro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bairro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub numero: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub longitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub ativo: Option<String>,
    #[serde(default)]
    pub tipo_estabelecimento_idtipo_estabelecimento: Option<Value>,
    #[serde(default)]
    pub tipo_natureza_idtipo_natureza: Option<Value>,
    #[serde(default)]
    pub tipo_turno_idtipo_turno: Option<Value>,
    #[serde(default)]
    pub qualificacoes: Option<Vec<Value>>,
    #[serde(default)]
    pub habilitacoes: Option<Vec<Value>>,
}

/// Strings pass through, numbers are stringified (coordinates often arrive as numbers)
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected text, found {}", other))),
    }
}

/// `S` active, `N` inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ativo {
    Sim,
    Nao,
}

impl Ativo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ativo::Sim => "S",
            Ativo::Nao => "N",
        }
    }
}

/// Validated write: trimmed, required fields present, limits respected
#[derive(Debug, Clone, PartialEq)]
pub struct EstabelecimentoRecord {
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
    pub tipo_estabelecimento: i64,
    pub tipo_natureza: i64,
    pub tipo_turno: Option<i64>,
    pub ativo: Ativo,
    /// Full desired sets; an absent list is empty on create and update alike
    pub qualificacoes: BTreeSet<i64>,
    pub habilitacoes: BTreeSet<i64>,
}

/// Natural keys checked for duplicates, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Cnpj,
    Cnes,
    CodigoUnidade,
}

impl DuplicateField {
    pub const CHECK_ORDER: [DuplicateField; 3] =
        [DuplicateField::Cnpj, DuplicateField::Cnes, DuplicateField::CodigoUnidade];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "cnpj" => Some(DuplicateField::Cnpj),
            "cnes" => Some(DuplicateField::Cnes),
            "codigo_unidade" => Some(DuplicateField::CodigoUnidade),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            DuplicateField::Cnpj => "cnpj",
            DuplicateField::Cnes => "cnes",
            DuplicateField::CodigoUnidade => "codigo_unidade",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DuplicateField::Cnpj => "CNPJ",
            DuplicateField::Cnes => "CNES",
            DuplicateField::CodigoUnidade => "Código",
        }
    }
}

impl EstabelecimentoRecord {
    pub fn unique_value(&self, field: DuplicateField) -> Option<&str> {
        match field {
            DuplicateField::Cnpj => self.cnpj.as_deref(),
            DuplicateField::Cnes => self.cnes.as_deref(),
            DuplicateField::CodigoUnidade => self.codigo_unidade.as_deref(),
        }
    }
}

struct Checker {
    errors: Vec<(String, String)>,
}

impl Checker {
    fn text(&mut self, column: &str, label: &str, raw: Option<String>, max: usize) -> Option<String> {
        let value = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
        if value.chars().count() > max {
            self.errors.push((
                column.to_string(),
                format!("O campo {} deve ter no máximo {} caracteres", label, max),
            ));
        }
        Some(value)
    }

    fn fail(&mut self, column: &str, message: impl Into<String>) {
        self.errors.push((column.to_string(), message.into()));
    }

    fn ids(&mut self, column: &str, label: &str, object_key: &str, raw: Option<Vec<Value>>) -> BTreeSet<i64> {
        let mut ids = BTreeSet::new();
        let mut invalid = Vec::new();
        for value in raw.unwrap_or_default() {
            let id = match &value {
                Value::Object(map) => map
                    .get("id")
                    .or_else(|| map.get(object_key))
                    .and_then(id_from_json),
                other => id_from_json(other),
            };
            match id {
                Some(id) => {
                    ids.insert(id);
                }
                None => invalid.push(value.to_string()),
            }
        }
        if !invalid.is_empty() {
            self.fail(column, format!("{} inválida: {}", label, invalid.join(", ")));
        }
        ids
    }
}

impl EstabelecimentoInput {
    /// Steps (a) trim, (b) required fields and limits, (c) activation rule
    pub fn validate(self) -> Result<EstabelecimentoRecord, ServiceError> {
        let mut check = Checker { errors: Vec::new() };

        let nome = check.text("nome", "Nome", self.nome, 150);
        if nome.is_none() {
            check.fail("nome", "O campo Nome é obrigatório");
        }
        let codigo_unidade = check.text("codigo_unidade", "Código", self.codigo_unidade, 20);
        let cnes = check.text("cnes", "CNES", self.cnes, 20);
        let cnpj = check.text("cnpj", "CNPJ", self.cnpj, 20);
        let cidade = check.text("cidade", "Cidade", self.cidade, 100);
        let logradouro = check.text("logradouro", "Logradouro", self.logradouro, 150);
        let bairro = check.text("bairro", "Bairro", self.bairro, 100);
        let numero = check.text("numero", "Número", self.numero, 20);
        let latitude = check.text("latitude", "Latitude", self.latitude, 30);
        let longitude = check.text("longitude", "Longitude", self.longitude, 30);

        let tipo_estabelecimento = self
            .tipo_estabelecimento_idtipo_estabelecimento
            .as_ref()
            .and_then(id_from_json);
        if tipo_estabelecimento.is_none() {
            check.fail(
                "tipo_estabelecimento_idtipo_estabelecimento",
                "ID do tipo de estabelecimento inválido",
            );
        }

        let tipo_natureza = self.tipo_natureza_idtipo_natureza.as_ref().and_then(id_from_json);
        if tipo_natureza.is_none() {
            check.fail("tipo_natureza_idtipo_natureza", "ID do tipo de natureza inválido");
        }

        // A zero shift id means no shift
        let tipo_turno = match self.tipo_turno_idtipo_turno.as_ref() {
            raw if is_blank(raw) => None,
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
            Some(raw) => {
                let id = id_from_json(raw);
                if id.is_none() {
                    check.fail("tipo_turno_idtipo_turno", "ID do tipo de turno inválido");
                }
                id
            }
            None => None,
        };

        let ativo = match self.ativo.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ativo::Nao,
            Some(s) if s.eq_ignore_ascii_case("S") => Ativo::Sim,
            Some(s) if s.eq_ignore_ascii_case("N") => Ativo::Nao,
            Some(_) => {
                check.fail("ativo", "O campo Ativo deve ser 'S' ou 'N'");
                Ativo::Nao
            }
        };

        let qualificacoes = check.ids(
            "qualificacoes",
            "Qualificação",
            "tipo_qualificacao_idtipo_qualificacao",
            self.qualificacoes,
        );
        let habilitacoes = check.ids(
            "habilitacoes",
            "Habilitação",
            "tipo_habilitacao_idtipo_habilitacao",
            self.habilitacoes,
        );

        if let Some(err) = ServiceError::invalid_fields(check.errors) {
            return Err(err);
        }

        if ativo == Ativo::Sim && (latitude.is_none() || longitude.is_none()) {
            return Err(ServiceError::validation("Latitude e Longitude são obrigatórias para ativação"));
        }

        // The error branch above covers every None here
        let (Some(nome), Some(tipo_estabelecimento), Some(tipo_natureza)) =
            (nome, tipo_estabelecimento, tipo_natureza)
        else {
            return Err(ServiceError::validation("O campo Nome é obrigatório"));
        };

        Ok(EstabelecimentoRecord {
            codigo_unidade,
            nome,
            cnes,
            cnpj,
            cidade,
            logradouro,
            bairro,
            numero,
            latitude,
            longitude,
            tipo_estabelecimento,
            tipo_natureza,
            tipo_turno,
            ativo,
            qualificacoes,
            habilitacoes,
        })
    }
}
