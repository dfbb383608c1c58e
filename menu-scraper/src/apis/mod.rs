pub mod base;
pub mod bonappetit;
pub mod pomona;
pub mod sodexo;

pub use base::{MenuParser, build_http_client};
pub use bonappetit::BonAppetitParser;
pub use pomona::PomonaParser;
pub use sodexo::SodexoParser;
