pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, ValidationError};
pub use schema::*;
pub use types::*;
