pub mod estabelecimento;
pub mod lookup;
pub mod tables;

pub use estabelecimento::{EstabelecimentoDetail, EstabelecimentoRow, HabilitacaoResumo, ReferenceOption};
pub use lookup::LookupTable;
