use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Logging configuration. Every field has a default so the `[logging]`
/// section may be left out of `tagx.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level filter (e.g. `"info"`, `"debug"`).
    pub level: String,
    /// Per-module overrides, e.g. `{ tagx_core = "debug" }`.
    pub modules: HashMap<String, String>,
    /// Optional log file. Relative paths resolve against the config file's
    /// directory.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: HashMap::new(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive string: the global level followed by the module
    /// overrides in name order.
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        let mut directives = self.level.clone();
        for (module, level) in modules {
            directives.push_str(&format!(",{module}={level}"));
        }
        directives
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}
