pub mod domain;
pub mod error;
pub mod storage;

pub use domain::*;
pub use error::{MenuError, Result};
