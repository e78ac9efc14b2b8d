use serde::Deserialize;

/// Default annotation key compiled by an engine.
pub const DEFAULT_TAG: &str = "vd";
/// Default name of the validator's message expression.
pub const DEFAULT_MESSAGE: &str = "msg";

/// How a validator reacts to a failing rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidateMode {
    /// Stop at the first failing rule.
    #[default]
    FailFast,
    /// Evaluate every rule and report all failures.
    CollectAll,
}

/// `[engine]` section of `tagx.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annotation key whose strings the engine compiles.
    pub tag: String,
    /// Expression name holding a field's failure message.
    pub message: String,
    pub mode: ValidateMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            mode: ValidateMode::FailFast,
        }
    }
}
