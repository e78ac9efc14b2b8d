use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::engine::EngineConfig;
use crate::logging::LoggingConfig;
use crate::validate;

// ---------------------------------------------------------------------------
// Raw TOML structure
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TagxConfigRaw {
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// TagxConfig (resolved, validated)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TagxConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl TagxConfig {
    /// Read and parse a `tagx.toml` file.
    ///
    /// A relative `logging.file` is resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let mut config: TagxConfig = content
            .parse()
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        if let Some(file) = &config.logging.file
            && file.is_relative()
            && let Some(base) = path.parent()
        {
            config.logging.file = Some(base.join(file));
        }
        Ok(config)
    }
}

impl FromStr for TagxConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a validated [`TagxConfig`].
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: TagxConfigRaw = toml::from_str(toml_str)?;
        let config = TagxConfig {
            engine: raw.engine,
            logging: raw.logging,
        };
        validate::validate(&config)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
