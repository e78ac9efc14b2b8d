use std::fmt;

use tagx_config::engine::DEFAULT_MESSAGE;
use tagx_config::{EngineConfig, ValidateMode};

use crate::engine::Engine;
use crate::error::CoreResult;
use crate::program::ExprHandler;
use crate::record::Record;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub selector: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of validating one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    violations: Vec<Violation>,
}

impl Report {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Checks instances against their compiled rules.
///
/// Every expression except the message expression is a rule; a rule passes
/// when its value is truthy.
pub struct Validator {
    engine: Engine,
    message: String,
    mode: ValidateMode,
}

impl Validator {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            message: DEFAULT_MESSAGE.to_string(),
            mode: ValidateMode::FailFast,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            engine: Engine::from_config(config),
            message: config.message.clone(),
            mode: config.mode,
        }
    }

    pub fn with_message(mut self, name: impl Into<String>) -> Self {
        self.message = name.into();
        self
    }

    pub fn with_mode(mut self, mode: ValidateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn mode(&self) -> ValidateMode {
        self.mode
    }

    /// Validate in the configured mode.
    pub fn check<T: Record>(&self, value: &T) -> CoreResult<Report> {
        self.run(value, self.mode)
    }

    /// Stop at the first failing rule.
    pub fn validate<T: Record>(&self, value: &T) -> CoreResult<Report> {
        self.run(value, ValidateMode::FailFast)
    }

    /// Evaluate every rule and collect all failures.
    pub fn validate_all<T: Record>(&self, value: &T) -> CoreResult<Report> {
        self.run(value, ValidateMode::CollectAll)
    }

    fn run<T: Record>(&self, value: &T, mode: ValidateMode) -> CoreResult<Report> {
        let bound = self.engine.bind(value)?;
        let mut violations = Vec::new();
        bound.range(|handler| {
            if handler.name() == Some(self.message.as_str()) || handler.eval().is_truthy() {
                return true;
            }
            let violation = self.violation(handler);
            tx_debug!(
                valid,
                field = %violation.field,
                selector = %violation.selector,
                "rule failed"
            );
            violations.push(violation);
            mode == ValidateMode::CollectAll
        });
        Ok(Report { violations })
    }

    fn violation(&self, handler: &ExprHandler<'_>) -> Violation {
        let field = handler.field_path().to_string();
        let message = match handler.eval_named(&self.message).as_str() {
            Some(msg) => msg.to_string(),
            None => format!("invalid parameter: {field}"),
        };
        Violation {
            selector: handler.selector().to_string(),
            field,
            message,
        }
    }
}
