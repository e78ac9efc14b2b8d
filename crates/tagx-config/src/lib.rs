pub mod engine;
pub mod logging;
mod tagx;
mod validate;

pub use engine::{EngineConfig, ValidateMode};
pub use logging::{LogFormat, LoggingConfig};
pub use tagx::TagxConfig;
