pub mod config;
pub mod error;
pub mod types;

pub use config::EchoConfig;
pub use error::{EchoError, Result};
pub use types::*;
