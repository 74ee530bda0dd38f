// handlers/mod.rs - HTTP handlers grouped by resource
//
// lookup:          /api/<resource> for every reference table
// estabelecimento: /api/estabelecimentos
// relatorio:       /api/estabelecimentos-relatorio
// system:          / and /health

pub mod estabelecimento;
pub mod lookup;
pub mod relatorio;
pub mod system;
pub mod utils;
