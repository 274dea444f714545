pub mod config;
pub mod error;
pub mod types;

pub use config::OzbotConfig;
pub use error::{OzbotError, Result};
pub use types::*;
