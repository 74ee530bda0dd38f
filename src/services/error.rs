use std::collections::HashMap;

use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Business errors raised by the services. Everything except `Database`
/// is a client mistake and maps to a 4xx response.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    #[error("{0}")]
    NotFound(String),

    /// Duplicate natural key
    #[error("{0}")]
    Conflict(String),

    /// Delete blocked by rows that still reference the target
    #[error("{0}")]
    Dependency(String),

    #[error(transparent)]
    Database(DatabaseError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation { message: message.into(), field_errors: None }
    }

    /// Collapse per-field messages into one validation error; the first
    /// message (by field order of insertion) becomes the summary.
    pub fn invalid_fields(errors: Vec<(String, String)>) -> Option<Self> {
        let (_, first) = errors.first()?;
        let message = first.clone();
        Some(ServiceError::Validation {
            message,
            field_errors: Some(errors.into_iter().collect()),
        })
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        ServiceError::Dependency(message.into())
    }
}

/// Constraint violations that slip past the in-transaction checks still
/// come back as business errors.
impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::UniqueViolation(constraint) => {
                tracing::warn!("Unique constraint rejected write: {}", constraint);
                ServiceError::conflict("Registro duplicado")
            }
            DatabaseError::ForeignKeyViolation(constraint) => {
                tracing::warn!("Foreign key rejected write: {}", constraint);
                ServiceError::validation("Registro relacionado não encontrado")
            }
            DatabaseError::ValueTooLong(detail) => {
                tracing::warn!("Value too long: {}", detail);
                ServiceError::validation("Valor excede o tamanho máximo permitido")
            }
            other => ServiceError::Database(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

/// Delete path: a foreign-key violation means something still points here
pub fn map_delete_error(err: sqlx::Error, label: &str) -> ServiceError {
    match DatabaseError::from(err) {
        DatabaseError::ForeignKeyViolation(constraint) => {
            tracing::warn!("Delete of {} blocked by {}", label, constraint);
            ServiceError::dependency(format!("{} possui registros vinculados e não pode ser excluído(a)", label))
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_errors_become_business_errors() {
        assert!(matches!(
            ServiceError::from(DatabaseError::UniqueViolation("tipo_pais_descricao_key".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(DatabaseError::ForeignKeyViolation("fk".into())),
            ServiceError::Validation { .. }
        ));
        assert!(matches!(
            ServiceError::from(DatabaseError::ValueTooLong("x".into())),
            ServiceError::Validation { .. }
        ));
        assert!(matches!(
            ServiceError::from(DatabaseError::InvalidDatabaseUrl),
            ServiceError::Database(_)
        ));
    }

    #[test]
    fn invalid_fields_uses_first_message_as_summary() {
        let err = ServiceError::invalid_fields(vec![
            ("nome".into(), "O campo Nome é obrigatório".into()),
            ("cnes".into(), "O campo CNES deve ter no máximo 20 caracteres".into()),
        ])
        .unwrap();
        match err {
            ServiceError::Validation { message, field_errors } => {
                assert_eq!(message, "O campo Nome é obrigatório");
                assert_eq!(field_errors.unwrap().len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ServiceError::invalid_fields(vec![]).is_none());
    }
}
