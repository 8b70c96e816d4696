pub mod error;
pub mod types;

pub use error::{ConfigError, DBError, DBResult};
pub use types::{DataBaseType, Value};
