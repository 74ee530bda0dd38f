use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Parâmetros de paginação inválidos")]
    InvalidPagination(String),

    #[error("Ordenação inválida: {0}")]
    InvalidSortOrder(String),
}
