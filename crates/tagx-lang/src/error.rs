use thiserror::Error;

/// Syntax and binding failures raised while compiling an annotation.
///
/// `near` fields carry the unconsumed remainder of the (sub-)expression being
/// parsed at the point of failure, truncated for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CompileError {
    #[error("empty expression")]
    Empty,
    #[error("expected operand near {near:?}")]
    ExpectedOperand { near: String },
    #[error("expected operand after {op:?}")]
    UnexpectedEnd { op: &'static str },
    #[error("unexpected input {rest:?}")]
    TrailingInput { rest: String },
    #[error("unmatched {open:?} near {near:?}")]
    UnmatchedBracket { open: char, near: String },
    #[error("duplicate expression name {name:?}")]
    DuplicateName { name: String },
    #[error("invalid expression block {block:?}")]
    InvalidName { block: String },
    #[error("unknown function {name:?}")]
    UnknownFunction { name: String },
    #[error("{func}() requires a string literal as its first argument")]
    LiteralRequired { func: &'static str },
    #[error("invalid regexp {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },
    #[error("{func}() expects {expected} argument(s), got {got}")]
    Arity {
        func: String,
        expected: &'static str,
        got: usize,
    },
}

const NEAR_LIMIT: usize = 24;

/// Clip `rest` for inclusion in an error message.
pub(crate) fn near(rest: &str) -> String {
    match rest.char_indices().nth(NEAR_LIMIT) {
        Some((idx, _)) => format!("{}...", &rest[..idx]),
        None => rest.to_string(),
    }
}
