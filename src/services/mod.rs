pub mod associations;
pub mod error;
pub mod estabelecimento_input;
pub mod estabelecimento_service;
pub mod lookup_service;
pub mod parse;
pub mod relatorio_service;

pub use error::ServiceError;
pub use estabelecimento_service::EstabelecimentoService;
pub use lookup_service::LookupService;
pub use relatorio_service::RelatorioService;
